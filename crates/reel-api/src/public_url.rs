//! Public URLs of finished videos.

use axum::http::{header, HeaderMap};

/// Route prefix finished videos are served under.
pub const VIDEOS_PREFIX: &str = "/videos";

/// Absolute URL of `file_name` under [`VIDEOS_PREFIX`].
///
/// A configured base wins. Otherwise the scheme is `https` only when a
/// proxy reports `X-Forwarded-Proto: https`, and the host comes from
/// `X-Forwarded-Host` or `Host`.
pub fn video_url(headers: &HeaderMap, public_base: Option<&str>, fallback_port: u16, file_name: &str) -> String {
    let file = urlencode_segment(file_name);

    if let Some(base) = public_base {
        return format!("{}{}/{}", base.trim_end_matches('/'), VIDEOS_PREFIX, file);
    }

    let scheme = match header_str(headers, "x-forwarded-proto") {
        Some(proto) if proto.split(',').next().map(str::trim) == Some("https") => "https",
        _ => "http",
    };

    let host = header_str(headers, "x-forwarded-host")
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .or_else(|| header_str(headers, header::HOST.as_str()))
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", fallback_port));

    format!("{}://{}{}/{}", scheme, host, VIDEOS_PREFIX, file)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Request IDs are already filesystem-safe; only guard against stray bytes.
fn urlencode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_plain_http_uses_host() {
        let h = headers(&[("host", "example.com:8080")]);
        assert_eq!(
            video_url(&h, None, 8080, "abc.mp4"),
            "http://example.com:8080/videos/abc.mp4"
        );
    }

    #[test]
    fn test_forwarded_https() {
        let h = headers(&[
            ("host", "internal:8080"),
            ("x-forwarded-proto", "https"),
            ("x-forwarded-host", "reels.example.com"),
        ]);
        assert_eq!(
            video_url(&h, None, 8080, "abc.mp4"),
            "https://reels.example.com/videos/abc.mp4"
        );
    }

    #[test]
    fn test_configured_base_wins() {
        let h = headers(&[("host", "internal:8080")]);
        assert_eq!(
            video_url(&h, Some("https://cdn.example.com/"), 8080, "abc.mp4"),
            "https://cdn.example.com/videos/abc.mp4"
        );
    }

    #[test]
    fn test_missing_host_falls_back_to_localhost() {
        assert_eq!(
            video_url(&HeaderMap::new(), None, 9000, "abc.mp4"),
            "http://localhost:9000/videos/abc.mp4"
        );
    }
}

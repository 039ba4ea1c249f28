use std::path::Path;
use std::process::Command;

use reel_pipeline::PipelineConfig;
use reel_providers::{ChatClient, TextGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env();

    println!(
        "reel-selfcheck: starting with work_dir={} output_dir={}",
        config.work_dir.display(),
        config.output_dir.display()
    );
    ensure_dir(&config.work_dir).await?;
    ensure_dir(&config.output_dir).await?;
    ensure_tool("ffmpeg")?;
    ensure_tool("ffprobe")?;
    ensure_env_present(&["GROQ_API_KEY", "OPENAI_API_KEY"])?;

    if std::env::var("TMDB_API_KEY").is_err() && std::env::var("TMDB_API_TOKEN").is_err() {
        println!("reel-selfcheck: TMDB credentials missing, movie scenes will use placeholders");
    }

    let text = ChatClient::from_env()?;
    let models = text
        .list_models()
        .await
        .map_err(|e| anyhow::anyhow!("text service unreachable: {}", e))?;
    println!("reel-selfcheck: text service lists {} models", models.len());
    for model in &models {
        println!("  - {}", model);
    }
    if !models.iter().any(|m| m == &text.config().model) {
        println!(
            "reel-selfcheck: configured model {} is not listed",
            text.config().model
        );
    }

    println!("reel-selfcheck: ok");
    Ok(())
}

async fn ensure_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let output = Command::new(name)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("{} -version failed: {:?}", name, output.status));
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}

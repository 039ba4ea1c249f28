#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for narrated segment assembly.
//!
//! This crate provides:
//! - Type-safe multi-input FFmpeg command building
//! - Progress parsing from `-progress pipe:2` and stderr capture for diagnostics
//! - Cancellation and timeout support via tokio
//! - Segment muxing (still image or looped video + narration audio)
//! - Stream-copy concatenation from a manifest
//! - FFprobe inspection and an offline placeholder card writer

pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod muxer;
pub mod placeholder;
pub mod probe;
pub mod progress;
pub mod segment;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{build_concat_command, write_concat_manifest};
pub use error::{MediaError, MediaResult};
pub use filters::fit_and_pad;
pub use fs_utils::{move_file, remove_if_exists, replace_file};
pub use muxer::{FfmpegMuxer, Muxer};
pub use placeholder::{write_solid_card, CARD_BACKGROUND};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use segment::{build_segment_command, SegmentSpec};

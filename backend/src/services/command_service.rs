//! Builds the command a user runs on their own machine instead of having the
//! server download.

use crate::models::{CommandInstructions, CommandResponse};
use crate::services::presets::{resolve, MediaKind, Quality, VIDEO_CONTAINER};
use crate::utils::{escape_double_quoted, is_valid_extension};

pub const CLIENT_TOOL: &str = "yt-dlp";

/// Extensions that are not a bare container name are replaced by `fallback`,
/// so the value is safe in an unquoted shell position.
fn container_or<'a>(format_ext: &'a str, fallback: &'a str) -> &'a str {
    if is_valid_extension(format_ext) {
        format_ext
    } else {
        fallback
    }
}

pub fn build_download_command(url: &str, media_type: &str, quality: &str, format_ext: &str) -> String {
    let url = escape_double_quoted(url);
    let height = Quality::parse(quality)
        .unwrap_or(Quality::Medium)
        .height_selector();

    match MediaKind::parse(media_type) {
        Some(MediaKind::Audio) => {
            let bitrate = resolve("audio", quality).audio_quality;
            let codec = container_or(format_ext, "mp3");
            format!("{CLIENT_TOOL} -x --audio-format {codec} --audio-quality {bitrate} \"{url}\"")
        }
        Some(MediaKind::Video) => {
            let ext = container_or(format_ext, VIDEO_CONTAINER);
            format!("{CLIENT_TOOL} -f \"{height}[ext={ext}]\" \"{url}\"")
        }
        // Anything else is treated as combined video+audio, which is always mp4.
        _ => format!("{CLIENT_TOOL} -f \"{height}[ext={VIDEO_CONTAINER}]\" \"{url}\""),
    }
}

pub fn command_response(url: &str, media_type: &str, quality: &str, format_ext: &str) -> CommandResponse {
    CommandResponse {
        command: build_download_command(url, media_type, quality, format_ext),
        instructions: CommandInstructions {
            step1: format!("Install {CLIENT_TOOL}: pip install {CLIENT_TOOL}"),
            step2: "Install FFmpeg for audio/video conversion".to_string(),
            step3: "Run the command in your terminal".to_string(),
            note: "Download happens on your computer, not on the server".to_string(),
        },
    }
}

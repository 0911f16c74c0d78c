//! Static (media kind, quality) → engine format selector table.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    VideoAudio,
}

impl MediaKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "video_audio" => Some(Self::VideoAudio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    High,
    Medium,
    Low,
}

impl Quality {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Height-capped selector used in generated client commands.
    pub fn height_selector(&self) -> &'static str {
        match self {
            Self::High => "best[height<=1080]",
            Self::Medium => "best[height<=720]",
            Self::Low => "worst[height<=480]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPreset {
    pub selector: &'static str,
    /// Target bitrate in kbps for audio extraction.
    pub audio_quality: &'static str,
    /// Container the selector natively produces, if it pins one.
    pub native_ext: Option<&'static str>,
}

/// Container assumed for video output when the preset does not pin one.
pub const VIDEO_CONTAINER: &str = "mp4";

pub const DEFAULT_PRESET: FormatPreset = FormatPreset {
    selector: "bestaudio/best",
    audio_quality: "192",
    native_ext: None,
};

const fn audio(selector: &'static str, audio_quality: &'static str) -> FormatPreset {
    FormatPreset {
        selector,
        audio_quality,
        native_ext: None,
    }
}

const fn mp4(selector: &'static str) -> FormatPreset {
    FormatPreset {
        selector,
        audio_quality: "192",
        native_ext: Some(VIDEO_CONTAINER),
    }
}

impl FormatPreset {
    pub fn lookup(kind: MediaKind, quality: Quality) -> Self {
        use MediaKind::*;
        use Quality::*;

        match (kind, quality) {
            (Audio, High) => audio("bestaudio/best", "320"),
            (Audio, Medium) => audio("bestaudio/best", "192"),
            (Audio, Low) => audio("worstaudio/worst", "128"),
            (Video, High) => mp4("bestvideo[ext=mp4]+bestaudio/best"),
            (Video, Medium) => mp4("best[height<=720][ext=mp4]"),
            (Video, Low) => mp4("worst[height<=480][ext=mp4]"),
            (VideoAudio, High) => mp4("best[height<=1080][ext=mp4]"),
            (VideoAudio, Medium) => mp4("best[height<=720][ext=mp4]"),
            (VideoAudio, Low) => mp4("worst[height<=480][ext=mp4]"),
        }
    }
}

/// Resolve a preset from raw request strings, falling back to best audio.
pub fn resolve(kind: &str, quality: &str) -> FormatPreset {
    match (MediaKind::parse(kind), Quality::parse(quality)) {
        (Some(kind), Some(quality)) => FormatPreset::lookup(kind, quality),
        _ => DEFAULT_PRESET,
    }
}

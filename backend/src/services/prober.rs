use crate::error::AppError;
use crate::models::{AudioFormat, AvailableFormats, MediaRecord, VideoFormat};
use crate::services::engine::{MediaEngine, RawMediaInfo};
use crate::services::profiles::{first_success, ClientProfile, PROBE_PROFILES};
use crate::utils::{format_duration, format_file_size, truncate_description};
use log::info;
use std::sync::Arc;

const MAX_AUDIO_FORMATS: usize = 5;
const MAX_VIDEO_FORMATS: usize = 10;

/// Metadata-only lookups against the extraction engine.
#[derive(Clone)]
pub struct Prober {
    engine: Arc<dyn MediaEngine>,
    profiles: Vec<ClientProfile>,
}

impl Prober {
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Prober {
            engine,
            profiles: PROBE_PROFILES.to_vec(),
        }
    }

    pub async fn probe(&self, url: &str) -> Result<MediaRecord, AppError> {
        let engine = &self.engine;
        let info = first_success(&self.profiles, |profile| async move {
            engine.fetch_info(url, &profile).await
        })
        .await
        .map_err(|e| AppError::Probe(e.to_string()))?;

        let record = build_record(info, url);
        info!(
            "Probed '{}' ({}, {} audio / {} video formats)",
            record.title,
            record.duration,
            record.available_formats.audio.len(),
            record.available_formats.video.len()
        );
        Ok(record)
    }
}

pub fn build_record(info: RawMediaInfo, requested_url: &str) -> MediaRecord {
    let duration_seconds = info
        .duration
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d as u64);

    let estimated_size = info
        .formats
        .iter()
        .find_map(|f| f.filesize.filter(|size| *size > 0))
        .map(format_file_size)
        .unwrap_or_else(|| "Unknown".to_string());

    let mut formats = AvailableFormats::default();
    for fmt in &info.formats {
        if fmt.is_audio_only() {
            if formats.audio.len() < MAX_AUDIO_FORMATS {
                formats.audio.push(AudioFormat {
                    format_id: fmt.format_id.clone(),
                    ext: fmt.ext.clone(),
                    abr: fmt.abr,
                    asr: fmt.asr,
                    filesize: fmt.filesize,
                });
            }
        } else if fmt.has_video() && formats.video.len() < MAX_VIDEO_FORMATS {
            formats.video.push(VideoFormat {
                format_id: fmt.format_id.clone(),
                ext: fmt.ext.clone(),
                height: fmt.height,
                width: fmt.width,
                fps: fmt.fps,
                filesize: fmt.filesize,
            });
        }
    }

    MediaRecord {
        title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
        description: truncate_description(info.description.as_deref()),
        thumbnail: info.thumbnail.unwrap_or_default(),
        duration: format_duration(duration_seconds),
        duration_seconds,
        estimated_size,
        uploader: info.uploader.unwrap_or_else(|| "Unknown".to_string()),
        view_count: info.view_count.unwrap_or(0),
        upload_date: info.upload_date.unwrap_or_default(),
        available_formats: formats,
        webpage_url: info
            .webpage_url
            .unwrap_or_else(|| requested_url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::engine::testing::ScriptedEngine;
    use crate::services::engine::RawFormat;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn third_profile_result_wins() {
        let engine = Arc::new(ScriptedEngine::new(2));
        let prober = Prober::new(engine.clone());

        let record = prober.probe("https://example/video").await.expect("probe ok");
        assert_eq!(record.title, "Test Video");
        assert_eq!(engine.info_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_profiles_report_last_cause() {
        let engine = Arc::new(ScriptedEngine::new(3));
        let prober = Prober::new(engine.clone());

        let err = prober.probe("https://example/video").await.expect_err("all fail");
        let message = err.to_string();
        assert!(message.starts_with("Network/Proxy Error:"));
        assert!(message.contains("blocked client android_embedded"), "{message}");
        assert_eq!(engine.info_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn record_normalisation() {
        let record = build_record(ScriptedEngine::new(0).sample_info(), "https://x");
        assert_eq!(record.duration, "01:02:05");
        assert_eq!(record.duration_seconds, Some(3725));
        assert_eq!(record.description.chars().count(), 203);
        assert_eq!(record.estimated_size, "3.0MB");
        assert_eq!(record.available_formats.audio.len(), 1);
        assert_eq!(record.available_formats.video.len(), 1);
        assert_eq!(record.webpage_url, "https://example/video");
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let record = build_record(RawMediaInfo::default(), "https://x/v");
        assert_eq!(record.title, "Unknown Title");
        assert_eq!(record.duration, "Unknown");
        assert_eq!(record.estimated_size, "Unknown");
        assert_eq!(record.uploader, "Unknown");
        assert_eq!(record.description, "No description available");
        assert_eq!(record.view_count, 0);
        assert_eq!(record.webpage_url, "https://x/v");
    }

    #[test]
    fn format_lists_are_capped() {
        let audio = RawFormat {
            acodec: Some("opus".into()),
            vcodec: Some("none".into()),
            ..Default::default()
        };
        let video = RawFormat {
            acodec: Some("none".into()),
            vcodec: Some("vp9".into()),
            ..Default::default()
        };
        let mut info = RawMediaInfo::default();
        info.formats.extend(std::iter::repeat(audio).take(8));
        info.formats.extend(std::iter::repeat(video).take(14));

        let record = build_record(info, "https://x");
        assert_eq!(record.available_formats.audio.len(), 5);
        assert_eq!(record.available_formats.video.len(), 10);
    }

    #[test]
    fn size_estimate_skips_formats_without_size() {
        let mut info = RawMediaInfo::default();
        info.formats.push(RawFormat::default());
        info.formats.push(RawFormat {
            filesize: Some(0),
            ..Default::default()
        });
        info.formats.push(RawFormat {
            filesize: Some(1536),
            ..Default::default()
        });
        assert_eq!(build_record(info, "https://x").estimated_size, "1.5KB");
    }
}

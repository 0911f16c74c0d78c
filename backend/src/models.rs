use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InfoRequest {
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    pub url: Option<String>,
    pub media_type: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandInstructions {
    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command: String,
    pub instructions: CommandInstructions,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: Option<String>,
    pub media_type: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartJobResponse {
    pub job_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub abr: Option<f64>,
    pub asr: Option<u64>,
    pub filesize: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub fps: Option<f64>,
    pub filesize: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableFormats {
    pub audio: Vec<AudioFormat>,
    pub video: Vec<VideoFormat>,
}

/// Display record returned by `POST /get_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub duration: String,
    pub duration_seconds: Option<u64>,
    pub estimated_size: String,
    pub uploader: String,
    pub view_count: u64,
    pub upload_date: String,
    pub available_formats: AvailableFormats,
    pub webpage_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Downloading,
    Completed,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Downloading)
    }
}

/// Current state of a server-side download job, as polled via `GET /status/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    pub progress: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl JobStatus {
    pub fn started() -> Self {
        JobStatus {
            status: JobState::Downloading,
            progress: 0.0,
            message: "Starting download...".to_string(),
            title: None,
            file_path: None,
            file_name: None,
            file_size: None,
            media_type: None,
            quality: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            finished_at: None,
        }
    }

    /// Terminal success status, keeping this record's creation time.
    pub fn into_completed(self, file: CompletedFile, media_type: &str, quality: &str) -> Self {
        JobStatus {
            status: JobState::Completed,
            progress: 100.0,
            message: "Conversion complete!".to_string(),
            title: Some(file.title),
            file_path: Some(file.path),
            file_name: Some(file.name),
            file_size: Some(file.size),
            media_type: Some(media_type.to_string()),
            quality: Some(quality.to_string()),
            created_at: self.created_at,
            finished_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Terminal failure status, keeping this record's creation time.
    pub fn into_failed(self, message: String) -> Self {
        JobStatus {
            status: JobState::Error,
            progress: 0.0,
            message,
            title: None,
            file_path: None,
            file_name: None,
            file_size: None,
            media_type: None,
            quality: None,
            created_at: self.created_at,
            finished_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// The file a finished job produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedFile {
    pub path: String,
    pub name: String,
    pub size: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_keep_creation_time() {
        let started = JobStatus::started();
        let created_at = started.created_at.clone();

        let done = started.clone().into_completed(
            CompletedFile {
                path: "downloads/j_T.mp3".into(),
                name: "T.mp3".into(),
                size: "2.0KB".into(),
                title: "T".into(),
            },
            "audio",
            "high",
        );
        assert_eq!(done.created_at, created_at);
        assert_eq!(done.status, JobState::Completed);
        assert!(done.finished_at.is_some());

        let failed = started.into_failed("boom".into());
        assert_eq!(failed.created_at, created_at);
        assert_eq!(failed.status, JobState::Error);
        assert_eq!(failed.progress, 0.0);
    }
}

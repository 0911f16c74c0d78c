use crate::error::EngineError;
use crate::services::profiles::ClientProfile;
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

/// Marker the engine prints in front of every progress line.
const PROGRESS_MARKER: &str = "[progress]";
/// Marker in front of the final path, printed once post-processing is done.
const OUTPUT_MARKER: &str = "[output]";
const STDERR_TAIL: usize = 600;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub abr: Option<f64>,
    pub asr: Option<u64>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub fps: Option<f64>,
    pub filesize: Option<u64>,
}

impl RawFormat {
    pub fn is_audio_only(&self) -> bool {
        self.acodec.as_deref() != Some("none") && self.vcodec.as_deref() == Some("none")
    }

    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }
}

/// Metadata as reported by the engine, before normalisation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMediaInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcess {
    ExtractAudio { codec: String, quality: String },
    ConvertVideo { ext: String },
    Keep,
}

/// Everything the engine needs to produce one job's output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub selector: String,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub post_process: PostProcess,
}

impl DownloadPlan {
    pub fn output_template(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_%(title)s.%(ext)s", self.file_prefix))
    }
}

/// Receives the engine's raw percent string for every progress report.
pub type ProgressSink = dyn for<'p> Fn(&'p str) + Send + Sync;

#[rocket::async_trait]
pub trait MediaEngine: Send + Sync {
    /// Fetch metadata without downloading anything.
    async fn fetch_info(&self, url: &str, profile: &ClientProfile) -> Result<RawMediaInfo, EngineError>;

    /// Download and post-process into `plan.output_dir`, returning the path
    /// of the file this run produced.
    async fn download(
        &self,
        url: &str,
        profile: &ClientProfile,
        plan: &DownloadPlan,
        on_progress: &ProgressSink,
    ) -> Result<PathBuf, EngineError>;
}

/// Drives the `yt-dlp` executable.
pub struct YtDlpEngine {
    binary: String,
}

impl YtDlpEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        YtDlpEngine {
            binary: binary.into(),
        }
    }

    fn profile_args(profile: &ClientProfile) -> Vec<String> {
        vec![
            "--no-check-certificate".to_string(),
            "--socket-timeout".to_string(),
            profile.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            profile.retries.to_string(),
            "--user-agent".to_string(),
            profile.user_agent.to_string(),
            "--extractor-args".to_string(),
            format!("youtube:player_client={}", profile.player_client),
        ]
    }

    fn download_args(url: &str, profile: &ClientProfile, plan: &DownloadPlan) -> Vec<String> {
        let mut args = Self::profile_args(profile);
        args.extend([
            "--fragment-retries".to_string(),
            profile.retries.to_string(),
            "--no-playlist".to_string(),
            "--force-overwrites".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!("download:{PROGRESS_MARKER} %(progress._percent_str)s"),
            "--print".to_string(),
            format!("after_move:{OUTPUT_MARKER} %(filepath)s"),
            "-f".to_string(),
            plan.selector.clone(),
            "-o".to_string(),
            plan.output_template().to_string_lossy().into_owned(),
        ]);

        match &plan.post_process {
            PostProcess::ExtractAudio { codec, quality } => args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                codec.clone(),
                "--audio-quality".to_string(),
                quality.clone(),
            ]),
            PostProcess::ConvertVideo { ext } => {
                args.extend(["--recode-video".to_string(), ext.clone()])
            }
            PostProcess::Keep => {}
        }

        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> EngineError {
        EngineError::Spawn {
            binary: self.binary.clone(),
            source,
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL {
        trimmed.to_string()
    } else {
        trimmed.chars().skip(count - STDERR_TAIL).collect()
    }
}

/// Pull the payload out of a progress line, if it is one.
pub fn progress_payload(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix(PROGRESS_MARKER)
        .map(str::trim)
}

/// Pull the final file path out of an output line, if it is one.
pub fn output_path(line: &str) -> Option<&Path> {
    line.trim_start()
        .strip_prefix(OUTPUT_MARKER)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(Path::new)
}

#[rocket::async_trait]
impl MediaEngine for YtDlpEngine {
    async fn fetch_info(&self, url: &str, profile: &ClientProfile) -> Result<RawMediaInfo, EngineError> {
        let mut args = Self::profile_args(profile);
        args.extend([
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--".to_string(),
            url.to_string(),
        ]);

        debug!("Probing {url} with client '{}'", profile.player_client);
        let output = self
            .command(&args)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn download(
        &self,
        url: &str,
        profile: &ClientProfile,
        plan: &DownloadPlan,
        on_progress: &ProgressSink,
    ) -> Result<PathBuf, EngineError> {
        let args = Self::download_args(url, profile, plan);
        info!(
            "Downloading {url} with client '{}' into {}",
            profile.player_client,
            plan.output_dir.display()
        );

        let mut child = self
            .command(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Drain stderr separately so a chatty engine cannot fill the pipe.
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let mut produced = None;
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(payload) = progress_payload(&line) {
                    on_progress(payload);
                } else if let Some(path) = output_path(&line) {
                    produced = Some(path.to_path_buf());
                } else {
                    debug!("yt-dlp: {line}");
                }
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(EngineError::Failed {
                code: status.code(),
                stderr: stderr_tail(&stderr),
            });
        }

        produced.ok_or_else(|| EngineError::MissingOutput(plan.file_prefix.clone()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::profiles::DOWNLOAD_PROFILES;

    fn plan(post_process: PostProcess) -> DownloadPlan {
        DownloadPlan {
            selector: "bestaudio/best".to_string(),
            output_dir: PathBuf::from("/tmp/out"),
            file_prefix: "job1".to_string(),
            post_process,
        }
    }

    #[test]
    fn classifies_formats_by_codec() {
        let audio = RawFormat {
            acodec: Some("opus".into()),
            vcodec: Some("none".into()),
            ..Default::default()
        };
        let muxed = RawFormat {
            acodec: Some("mp4a".into()),
            vcodec: Some("avc1".into()),
            ..Default::default()
        };
        let unknown = RawFormat::default();
        assert!(audio.is_audio_only());
        assert!(!audio.has_video());
        assert!(!muxed.is_audio_only());
        assert!(muxed.has_video());
        assert!(!unknown.is_audio_only());
        assert!(unknown.has_video());
    }

    #[test]
    fn audio_download_arguments() {
        let args = YtDlpEngine::download_args(
            "https://example/video",
            &DOWNLOAD_PROFILES[0],
            &plan(PostProcess::ExtractAudio {
                codec: "mp3".into(),
                quality: "192".into(),
            }),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-x --audio-format mp3 --audio-quality 192"));
        assert!(joined.contains("youtube:player_client=ios"));
        assert!(joined.contains("--socket-timeout 60"));
        assert!(joined.contains("/tmp/out/job1_%(title)s.%(ext)s"));
        assert!(joined.contains("--print after_move:[output] %(filepath)s"));
        assert_eq!(&args[args.len() - 2..], ["--", "https://example/video"]);
    }

    #[test]
    fn video_conversion_arguments() {
        let args = YtDlpEngine::download_args(
            "https://example/video",
            &DOWNLOAD_PROFILES[2],
            &plan(PostProcess::ConvertVideo { ext: "mkv".into() }),
        );
        let joined = args.join(" ");
        assert!(joined.contains("--recode-video mkv"));
        assert!(!joined.contains("--audio-format"));

        let keep = YtDlpEngine::download_args(
            "https://example/video",
            &DOWNLOAD_PROFILES[2],
            &plan(PostProcess::Keep),
        )
        .join(" ");
        assert!(!keep.contains("--recode-video"));
    }

    #[test]
    fn progress_lines_are_recognised() {
        assert_eq!(progress_payload("[progress]  45.2%"), Some("45.2%"));
        assert_eq!(progress_payload("[download] Destination: x.webm"), None);
        assert_eq!(progress_payload("[output] /tmp/out/job1_T.mp3"), None);
    }

    #[test]
    fn output_lines_carry_the_final_path() {
        assert_eq!(
            output_path("[output] /tmp/out/job1_My Video.mp3"),
            Some(Path::new("/tmp/out/job1_My Video.mp3"))
        );
        assert_eq!(output_path("[output]   "), None);
        assert_eq!(output_path("[progress]  45.2%"), None);
        assert_eq!(output_path("[ExtractAudio] Destination: x.mp3"), None);
    }

    #[test]
    fn parses_engine_json() {
        let json = r#"{"title":"T","duration":212.0,"view_count":7,
            "formats":[{"format_id":"251","ext":"webm","acodec":"opus","vcodec":"none","abr":160.0}]}"#;
        let info: RawMediaInfo = serde_json::from_str(json).expect("valid json");
        assert_eq!(info.title.as_deref(), Some("T"));
        assert_eq!(info.duration, Some(212.0));
        assert_eq!(info.formats.len(), 1);
        assert!(info.formats[0].is_audio_only());
    }

    #[test]
    fn stderr_is_trimmed_to_tail() {
        let long = "x".repeat(STDERR_TAIL + 50);
        assert_eq!(stderr_tail(&long).len(), STDERR_TAIL);
        assert_eq!(stderr_tail("  ERROR: boom \n"), "ERROR: boom");
    }
}

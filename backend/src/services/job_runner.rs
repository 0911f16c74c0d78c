use crate::error::{AppError, EngineError};
use crate::models::CompletedFile;
use crate::services::engine::{DownloadPlan, MediaEngine, PostProcess};
use crate::services::job_store::JobStore;
use crate::services::presets::{resolve, MediaKind, VIDEO_CONTAINER};
use crate::services::profiles::{first_success, ClientProfile, DOWNLOAD_PROFILES};
use crate::utils::{format_file_size, strip_job_prefix};
use log::{error, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A validated request for one server-side download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub url: String,
    pub media_type: String,
    pub quality: String,
    pub format_ext: String,
}

/// Spawns background download jobs and records their progress in the store.
#[derive(Clone)]
pub struct JobRunner {
    engine: Arc<dyn MediaEngine>,
    store: JobStore,
    download_dir: PathBuf,
    profiles: Vec<ClientProfile>,
    slots: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        store: JobStore,
        download_dir: impl Into<PathBuf>,
        max_concurrent_jobs: usize,
    ) -> Self {
        JobRunner {
            engine,
            store,
            download_dir: download_dir.into(),
            profiles: DOWNLOAD_PROFILES.to_vec(),
            slots: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    /// Register `job_id` in the store and run the job in the background.
    /// Returns false if the id is already in use.
    pub fn start_job(&self, job_id: String, request: JobRequest) -> bool {
        if !self.store.insert_new(&job_id) {
            return false;
        }

        info!(
            "Starting job {job_id}: {} as {}/{} ({}), {} jobs tracked",
            request.url,
            request.media_type,
            request.quality,
            request.format_ext,
            self.store.len()
        );

        let runner = self.clone();
        tokio::spawn(async move {
            runner.run(job_id, request).await;
        });
        true
    }

    async fn run(self, job_id: String, request: JobRequest) {
        let permit = match self.slots.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.store.set_message(
                    &job_id,
                    "Waiting for a free download slot...".to_string(),
                    None,
                );
                match self.slots.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        self.fail(&job_id, format!("Error: {e}"));
                        return;
                    }
                }
            }
        };

        if let Err(e) = self.execute(&job_id, &request).await {
            self.fail(&job_id, e.to_string());
        }
        drop(permit);
    }

    async fn execute(&self, job_id: &str, request: &JobRequest) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let plan = self.plan(job_id, request);

        let outcome = first_success(&self.profiles, |profile| {
            self.attempt(job_id, request, &plan, profile)
        })
        .await;

        match outcome {
            Ok(file) => {
                info!("Job {job_id} completed: {} ({})", file.name, file.size);
                self.store.finish(job_id, |current| {
                    current.into_completed(file, &request.media_type, &request.quality)
                });
                Ok(())
            }
            Err(e) => Err(AppError::Download(e.to_string())),
        }
    }

    fn plan(&self, job_id: &str, request: &JobRequest) -> DownloadPlan {
        let preset = resolve(&request.media_type, &request.quality);

        let post_process = match MediaKind::parse(&request.media_type) {
            Some(MediaKind::Audio) => PostProcess::ExtractAudio {
                codec: request.format_ext.clone(),
                quality: preset.audio_quality.to_string(),
            },
            Some(MediaKind::Video | MediaKind::VideoAudio)
                if preset.native_ext.unwrap_or(VIDEO_CONTAINER) != request.format_ext =>
            {
                PostProcess::ConvertVideo {
                    ext: request.format_ext.clone(),
                }
            }
            _ => PostProcess::Keep,
        };

        DownloadPlan {
            selector: preset.selector.to_string(),
            output_dir: self.download_dir.clone(),
            file_prefix: job_id.to_string(),
            post_process,
        }
    }

    async fn attempt(
        &self,
        job_id: &str,
        request: &JobRequest,
        plan: &DownloadPlan,
        profile: ClientProfile,
    ) -> Result<CompletedFile, EngineError> {
        let info = self.engine.fetch_info(&request.url, &profile).await?;
        let title = info.title.unwrap_or_else(|| "Unknown Title".to_string());
        self.store
            .set_message(job_id, format!("Downloading: {title}"), Some(title.clone()));

        let store = self.store.clone();
        let progress_id = job_id.to_string();
        let on_progress = move |raw: &str| store.update_progress(&progress_id, raw);

        let produced = self
            .engine
            .download(&request.url, &profile, plan, &on_progress)
            .await?;

        describe_output(&produced, job_id, title).await
    }

    fn fail(&self, job_id: &str, message: String) {
        error!("Job {job_id} failed: {message}");
        self.store
            .finish(job_id, |current| current.into_failed(message));
    }
}

/// Describe the file the engine reported for `job_id`. Anything that is not
/// an existing file carrying the job's prefix counts as missing output.
async fn describe_output(path: &Path, job_id: &str, title: String) -> Result<CompletedFile, EngineError> {
    let missing = || EngineError::MissingOutput(job_id.to_string());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(missing)?;
    if strip_job_prefix(&file_name, job_id).len() == file_name.len() {
        return Err(missing());
    }

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(missing()),
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(missing()),
        Err(e) => return Err(e.into()),
    };

    Ok(CompletedFile {
        path: path.to_string_lossy().into_owned(),
        name: strip_job_prefix(&file_name, job_id).to_string(),
        size: format_file_size(metadata.len()),
        title,
    })
}

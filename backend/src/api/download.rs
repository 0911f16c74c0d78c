use crate::api::{or_default, require_extension, require_url};
use crate::error::AppError;
use crate::models::{DownloadRequest, JobState, JobStatus, StartJobResponse};
use crate::services::job_runner::JobRequest;
use crate::utils::is_valid_job_id;
use crate::AppState;
use log::info;
use rocket::fs::NamedFile;
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{get, post, Responder, State};
use std::io::ErrorKind;
use uuid::Uuid;

#[derive(Responder)]
pub struct FileDownload {
    inner: NamedFile,
    disposition: Header<'static>,
}

#[post("/download", data = "<request>")]
pub async fn start_download(
    state: &State<AppState>,
    request: Json<DownloadRequest>,
) -> Result<Json<StartJobResponse>, AppError> {
    let request = request.into_inner();
    let url = require_url(request.url.as_deref())?;
    let media_type = or_default(request.media_type, "audio");
    let quality = or_default(request.quality, "medium");
    let format_ext = require_extension(or_default(request.format, "mp3"))?;

    let job_id = match request.job_id {
        Some(id) if is_valid_job_id(&id) => id,
        Some(id) => {
            return Err(AppError::Validation(format!("Invalid job id '{id}'")));
        }
        None => Uuid::new_v4().to_string(),
    };

    let started = state.runner.start_job(
        job_id.clone(),
        JobRequest {
            url,
            media_type,
            quality,
            format_ext,
        },
    );
    if !started {
        return Err(AppError::Validation(format!(
            "Job id '{job_id}' is already in use"
        )));
    }

    Ok(Json(StartJobResponse {
        job_id,
        status: "started".to_string(),
    }))
}

#[get("/status/<job_id>")]
pub fn download_status(state: &State<AppState>, job_id: &str) -> Result<Json<JobStatus>, AppError> {
    state
        .jobs
        .get(job_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(job_id.to_string()))
}

#[get("/download_file/<job_id>")]
pub async fn download_file(state: &State<AppState>, job_id: &str) -> Result<FileDownload, AppError> {
    let status = state
        .jobs
        .get(job_id)
        .filter(|s| s.status == JobState::Completed)
        .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;

    let (Some(path), Some(name)) = (status.file_path, status.file_name) else {
        return Err(AppError::NotFound(job_id.to_string()));
    };

    info!("Serving {path} for job {job_id}");
    let file = NamedFile::open(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::NotFound(job_id.to_string()),
        _ => AppError::Io(e),
    })?;
    Ok(FileDownload {
        inner: file,
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", header_safe_name(&name)),
        ),
    })
}

/// ASCII-only file name with quotes removed, for the Content-Disposition header.
fn header_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use thiserror::Error;

use crate::models::ErrorResponse;

/// Errors surfaced to HTTP callers and written into terminal job statuses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed request input.
    #[error("{0}")]
    Validation(String),

    /// Every probe profile failed; carries the last engine failure.
    #[error("Network/Proxy Error: {0}")]
    Probe(String),

    /// Every download profile failed; carries the last engine failure.
    #[error("Network/Proxy Error: Unable to connect to the media host. This may be due to hosting provider restrictions. Error: {0}")]
    Download(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) | AppError::Probe(_) | AppError::Download(_) => {
                Status::BadRequest
            }
            AppError::NotFound(_) => Status::NotFound,
            AppError::Io(_) => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status == Status::InternalServerError {
            log::error!("Request to {} failed: {self}", request.uri());
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .respond_to(request)
    }
}

/// Failures reported by the extraction engine for a single profile attempt.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("could not parse engine output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("engine finished but reported no output file for job '{0}'")]
    MissingOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no client profiles configured")]
    NoProfiles,
}

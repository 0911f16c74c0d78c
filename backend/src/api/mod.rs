mod catchers;
pub mod command;
pub mod download;
pub mod home;
pub mod info;

pub use catchers::*;
pub use command::*;
pub use download::*;
pub use home::*;
pub use info::*;

use crate::error::AppError;
use crate::utils::{is_valid_extension, parse_media_url};

/// Reject absent or blank URLs, then anything that is not an http(s) link.
fn require_url(url: Option<&str>) -> Result<String, AppError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("URL is required".to_string()))?;

    if parse_media_url(url).is_none() {
        return Err(AppError::Validation(format!(
            "Invalid URL '{url}': only http(s) links are supported"
        )));
    }
    Ok(url.to_string())
}

/// Only short alphanumeric container names may reach the engine or a shell.
fn require_extension(format_ext: String) -> Result<String, AppError> {
    if is_valid_extension(&format_ext) {
        Ok(format_ext)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported format '{format_ext}'"
        )))
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::services::engine::testing::ScriptedEngine;
    use crate::services::job_runner::JobRunner;
    use crate::services::job_store::JobStore;
    use crate::services::prober::Prober;
    use crate::AppState;
    use rocket::local::asynchronous::Client;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    pub fn state(engine: Arc<ScriptedEngine>, downloads: &Path, server_downloads: bool) -> AppState {
        let jobs = JobStore::new();
        AppState {
            prober: Prober::new(engine.clone()),
            runner: JobRunner::new(engine, jobs.clone(), downloads, 2),
            jobs,
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            server_downloads,
        }
    }

    pub async fn client(engine: Arc<ScriptedEngine>, downloads: &Path) -> Client {
        let rocket = crate::build_rocket(rocket::Config::figment(), state(engine, downloads, true));
        Client::tracked(rocket).await.expect("valid rocket instance")
    }
}

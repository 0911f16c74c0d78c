use crate::services::engine::YtDlpEngine;
use crate::services::job_runner::JobRunner;
use crate::services::job_store::JobStore;
use crate::services::prober::Prober;
use crate::AppState;
use anyhow::Result;
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, LevelFilter};
use rocket::figment::Figment;
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

lazy_static! {
    pub static ref DOWNLOAD_FOLDER: String =
        env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "downloads".to_string());
    pub static ref YTDLP_BIN: String =
        env::var("YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string());
    pub static ref STATIC_DIR: String =
        env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    pub static ref SERVER_DOWNLOADS: bool = env::var("SERVER_DOWNLOADS")
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(true);
    pub static ref MAX_CONCURRENT_JOBS: usize = env::var("MAX_CONCURRENT_JOBS")
        .unwrap_or_else(|_| "4".to_string())
        .parse::<usize>()
        .unwrap_or(4);
    pub static ref ALLOWED_ORIGINS: String =
        env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());
    pub static ref PORT: Option<u16> = env::var("PORT").ok().and_then(|p| p.parse().ok());
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting media converter backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

/// Rocket's own configuration, with a bare `PORT` variable taking precedence.
pub fn rocket_figment() -> Figment {
    let figment = rocket::Config::figment();
    match *PORT {
        Some(port) => figment.merge(("port", port)).merge(("address", "0.0.0.0")),
        None => figment,
    }
}

pub fn create_app_state() -> Result<AppState> {
    let download_dir = PathBuf::from(&*DOWNLOAD_FOLDER);
    std::fs::create_dir_all(&download_dir)?;
    info!(
        "Downloads go to {} (server-side downloads {}, {} concurrent jobs)",
        download_dir.display(),
        if *SERVER_DOWNLOADS { "enabled" } else { "disabled" },
        *MAX_CONCURRENT_JOBS
    );

    let engine = Arc::new(YtDlpEngine::new(YTDLP_BIN.as_str()));
    let jobs = JobStore::new();

    Ok(AppState {
        prober: Prober::new(engine.clone()),
        runner: JobRunner::new(engine, jobs.clone(), download_dir, *MAX_CONCURRENT_JOBS),
        jobs,
        static_dir: PathBuf::from(&*STATIC_DIR),
        server_downloads: *SERVER_DOWNLOADS,
    })
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let origins: Vec<&str> = ALLOWED_ORIGINS
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    let allowed_origins = if origins.is_empty() || origins.contains(&"*") {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&origins)
    };

    let cors = CorsOptions::default()
        .allowed_origins(allowed_origins)
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}

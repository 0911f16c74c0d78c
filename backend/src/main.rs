#[macro_use]
extern crate rocket;

mod api;
mod config;
mod error;
mod models;
mod services;
mod utils;

use crate::services::job_runner::JobRunner;
use crate::services::job_store::JobStore;
use crate::services::prober::Prober;
use log::info;
use rocket::figment::Provider;
use rocket::{Build, Rocket};
use std::path::PathBuf;

pub struct AppState {
    pub prober: Prober,
    pub runner: JobRunner,
    pub jobs: JobStore,
    pub static_dir: PathBuf,
    pub server_downloads: bool,
}

pub fn build_rocket<T: Provider>(provider: T, state: AppState) -> Rocket<Build> {
    let server_downloads = state.server_downloads;

    let mut rocket = rocket::custom(provider)
        .mount(
            "/",
            routes![api::index, api::get_info, api::get_download_command],
        )
        .register("/", catchers![api::json_catcher]);

    if server_downloads {
        rocket = rocket.mount(
            "/",
            routes![api::start_download, api::download_status, api::download_file],
        );
    }

    rocket.manage(state)
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    config::load_environment();
    config::init_logger();

    let state = config::create_app_state()?;
    let cors = config::create_cors()?;

    let _rocket = build_rocket(config::rocket_figment(), state)
        .attach(cors)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {e}"))?;

    info!("Backend shut down.");
    Ok(())
}

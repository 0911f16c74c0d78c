use crate::api::require_url;
use crate::error::AppError;
use crate::models::{InfoRequest, MediaRecord};
use crate::AppState;
use log::{error, info};
use rocket::serde::json::Json;
use rocket::{post, State};

#[post("/get_info", data = "<request>")]
pub async fn get_info(
    state: &State<AppState>,
    request: Json<InfoRequest>,
) -> Result<Json<MediaRecord>, AppError> {
    let url = require_url(request.url.as_deref())?;
    info!("Fetching info for {url}");

    match state.prober.probe(&url).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            error!("Failed to fetch info for {url}: {e}");
            Err(e)
        }
    }
}

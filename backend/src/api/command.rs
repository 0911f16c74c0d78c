use crate::api::{or_default, require_extension, require_url};
use crate::error::AppError;
use crate::models::{CommandRequest, CommandResponse};
use crate::services::command_service::command_response;
use rocket::post;
use rocket::serde::json::Json;

#[post("/get_download_command", data = "<request>")]
pub fn get_download_command(request: Json<CommandRequest>) -> Result<Json<CommandResponse>, AppError> {
    let request = request.into_inner();
    let url = require_url(request.url.as_deref())?;
    let media_type = or_default(request.media_type, "audio");
    let quality = or_default(request.quality, "medium");
    let format_ext = require_extension(or_default(request.format, "mp3"))?;

    Ok(Json(command_response(&url, &media_type, &quality, &format_ext)))
}

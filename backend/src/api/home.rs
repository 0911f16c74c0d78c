use crate::AppState;
use rocket::fs::NamedFile;
use rocket::{get, State};

#[get("/")]
pub async fn index(state: &State<AppState>) -> Option<NamedFile> {
    let page = state.static_dir.join("index.html");
    match NamedFile::open(&page).await {
        Ok(file) => Some(file),
        Err(e) => {
            log::error!("Failed to open {}: {e}", page.display());
            None
        }
    }
}

mod bio;
mod edit;
mod page;
pub mod store;

use axum::{Router, routing::get};

use crate::AppState;

pub use bio::{SHORT_BIO_LIMIT, short_bio};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(page::own_profile))
        .route("/profile/edit", get(edit::edit_page).post(edit::edit_profile))
        .route("/profile/{id}", get(page::profile))
}

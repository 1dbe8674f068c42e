pub mod lifecycle;
pub mod notify;
mod pages;
mod send;
mod update;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use lifecycle::{Action, RequestDetail};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send_request/{uuid}", post(send::send_request))
        .route("/requests", get(pages::requests))
        .route("/requests/{id}", get(pages::request_detail))
        .route("/requests/{id}/update", post(update::update_request))
}

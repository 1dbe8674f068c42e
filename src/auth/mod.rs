mod clients;
mod identity;
mod login;
mod lockin;
mod logout;

use axum::{Router, routing::get};

use crate::AppState;

pub use clients::{ClientProvider, Clients};
pub use identity::Identity;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page))
        .route("/login/{provider}", get(login::login))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}

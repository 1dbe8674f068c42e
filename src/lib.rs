pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod mail;
pub mod matching;
pub mod profiles;
pub mod requests;
pub mod res;
pub mod search;
pub mod session;
pub mod skills;
pub mod users;

use std::sync::Arc;

use axum::{
    Router, extract::FromRef, http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{config::Config, error::StoreError, requests::notify::Notifier};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub clients: auth::Clients,
    pub notifier: Notifier,
    pub config: Arc<Config>,
}

/// Every route of the application, without session or tracing layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .merge(auth::router())
        .merge(profiles::router())
        .merge(skills::router())
        .merge(requests::router())
        .merge(search::router())
        .merge(users::router())
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// 403 with the reason shown to the user.
    Forbidden(String),
    /// 404 for the named kind of thing.
    NotFound(&'static str),
    /// 400, validation failures.
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Forbidden(reason) => res::forbidden(&reason),
            AppError::NotFound(what) => match res::sorry(what) {
                Ok(response) => response,
                Err(_) => StatusCode::NOT_FOUND.into_response(),
            },
            AppError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
            AppError::Internal(err) => {
                tracing::error!(error = %err, backtrace = %err.backtrace(), "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
            }
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Internal(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_owned()))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::NotAllowed(reason) => Self::Forbidden(reason),
            StoreError::Duplicate(_) | StoreError::Invalid(_) => Self::BadRequest(err.to_string()),
            err => Self::Internal(anyhow::Error::from(err)),
        }
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(anyhow::Error);
apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(reqwest::Error);
apperr_impl!(oauth2::url::ParseError);

impl<E, R> From<oauth2::RequestTokenError<E, R>> for AppError
where
    E: core::error::Error + Send + Sync + 'static,
    R: oauth2::ErrorResponse + Send + Sync + 'static,
{
    fn from(err: oauth2::RequestTokenError<E, R>) -> Self {
        Self::Internal(anyhow::Error::from(err))
    }
}

use axum::response::{IntoResponse, Redirect, Response};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, db::User, res, users};

pub const USER_ID: &str = "user_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";

/// The signed-in user, if the session has one and the account is still active.
pub async fn current_user(session: &Session, db_pool: &SqlitePool) -> AppResult<Option<User>> {
    let Some(user_uuid) = session.get::<String>(USER_ID).await? else {
        return Ok(None);
    };

    match users::store::find_by_uuid(db_pool, &user_uuid).await? {
        Some(user) if user.is_active => Ok(Some(user)),
        _ => {
            session.flush().await?;
            Ok(None)
        }
    }
}

pub async fn sign_in(session: &Session, user: &User) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID, &user.uuid).await?;
    Ok(())
}

/// Only same-site paths are followed after login.
pub fn safe_return_url(url: Option<String>) -> String {
    match url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') => url,
        _ => "/".to_owned(),
    }
}

pub fn login_redirect(return_url: &str) -> Response {
    Redirect::to(&format!("/login?return_url={}", res::encode_query(return_url))).into_response()
}

use axum::{
    debug_handler, extract::State,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, include_res, res, session};

#[debug_handler(state = AppState)]
pub async fn index(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let viewer = session::current_user(&session, &db_pool).await?;

    let actions = match &viewer {
        Some(_) => include_res!(str, "/pages/home_user.html"),
        None => include_res!(str, "/pages/home_guest.html"),
    };
    let content = res::render(include_res!(str, "/pages/index.html"), &[("actions", actions)]);

    Ok(res::page("Buddy", viewer.as_ref(), &content).into_response())
}

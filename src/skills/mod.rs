pub mod catalog;
mod edit;
pub mod experiences;

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, session};

const SUGGESTIONS: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/skills", get(skill_search))
        .route("/skills/add/{direction}", post(edit::add_skill))
        .route("/skills/{id}/edit", post(edit::update_skill))
        .route("/skills/{id}/delete", post(edit::delete_skill))
}

#[derive(Deserialize)]
pub(crate) struct SkillQuery {
    #[serde(default)]
    pub(crate) q: String,
}

/// Autocomplete for the add-skill forms.
#[debug_handler(state = AppState)]
pub(crate) async fn skill_search(
    Query(SkillQuery { q }): Query<SkillQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    if session::current_user(&session, &db_pool).await?.is_none() {
        return Ok(session::login_redirect("/skills"));
    }
    if q.trim().is_empty() {
        return Ok(Json(Vec::<crate::db::Skill>::new()).into_response());
    }

    let skills = catalog::search(&db_pool, &q, SUGGESTIONS).await?;
    Ok(Json(skills).into_response())
}

pub mod store;

use axum::{
    Router, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, session};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users/{uuid}/deactivate", post(deactivate))
        .route("/admin/users/{uuid}/activate", post(activate))
}

#[debug_handler(state = AppState)]
pub(crate) async fn deactivate(
    Path(uuid): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    set_active(&db_pool, &session, uuid, false).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn activate(
    Path(uuid): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    set_active(&db_pool, &session, uuid, true).await
}

async fn set_active(
    db_pool: &SqlitePool,
    session: &Session,
    uuid: Uuid,
    is_active: bool,
) -> AppResult<Response> {
    let Some(me) = session::current_user(session, db_pool).await? else {
        return Ok(session::login_redirect("/"));
    };
    if !me.is_staff {
        return Err(AppError::Forbidden("Only staff can change account status".into()));
    }

    let user = store::find_by_uuid(db_pool, &uuid.to_string())
        .await?
        .ok_or(AppError::NotFound("user"))?;
    store::set_active(db_pool, user.id, is_active).await?;
    tracing::info!(staff = me.id, user_id = user.id, is_active, "account status changed by staff");

    Ok(Redirect::to("/search").into_response())
}

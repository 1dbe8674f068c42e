use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, AppState, db::RequestType, session, users};

use super::{lifecycle, notify::Notifier};

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequestForm {
    pub(crate) message: String,
    pub(crate) request_type: RequestType,
}

#[debug_handler(state = AppState)]
pub(crate) async fn send_request(
    Path(uuid): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    session: Session,
    Form(SendRequestForm { message, request_type }): Form<SendRequestForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/search"));
    };

    let recipient = users::store::find_by_uuid(&db_pool, &uuid.to_string())
        .await?
        .ok_or(AppError::NotFound("user"))?;

    lifecycle::send(&db_pool, &notifier, &me, &recipient, request_type, &message).await?;

    Ok(Redirect::to("/requests").into_response())
}

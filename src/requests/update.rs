use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, session};

use super::{
    lifecycle::{self, Action},
    notify::Notifier,
};

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateRequestForm {
    pub(crate) status: Action,
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_request(
    Path(request_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    session: Session,
    Form(UpdateRequestForm { status }): Form<UpdateRequestForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/requests/{request_id}")));
    };

    lifecycle::transition(&db_pool, &notifier, &me, request_id, status).await?;

    Ok(Redirect::to(&format!("/requests/{request_id}")).into_response())
}

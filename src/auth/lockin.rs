use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeVerifier, TokenResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, AppState, config::Config,
    session::{self, CSRF_STATE, PKCE_VERIFIER, RETURN_URL},
    users,
};

use super::{Clients, clients::ClientProvider, identity};

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Path(provider): Path<ClientProvider>,
    Query(LockinQuery { state, code }): Query<LockinQuery>,
    State(db_pool): State<SqlitePool>,
    State(clients): State<Clients>,
    State(config): State<Arc<Config>>,
    session: Session,
) -> AppResult<Response> {
    let state = CsrfToken::new(state.ok_or(AppError::BadRequest("OAuth: without state".into()))?);
    let code =
        AuthorizationCode::new(code.ok_or(AppError::BadRequest("OAuth: without code".into()))?);

    let Some(stored_state) = session.remove::<String>(CSRF_STATE).await? else {
        return Err(AppError::BadRequest("no csrf_state".into()));
    };

    if state.secret().as_str() != stored_state.as_str() {
        return Err(AppError::Forbidden("csrf tokens don't match".into()));
    }

    let Some(pkce_verifier) = session.remove::<String>(PKCE_VERIFIER).await? else {
        return Err(AppError::BadRequest("no pkce_verifier".into()));
    };

    let client = clients.get_client(provider)?;
    let http_client = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(code)
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
        .request_async(&http_client)
        .await?;

    let access_token = token_result.access_token().secret();
    let identity = identity::fetch_identity(&http_client, provider, access_token).await?;

    let is_new = users::store::find_by_email(&db_pool, &identity.email).await?.is_none();
    let mut user = users::store::find_or_create(
        &db_pool,
        &identity.email,
        &identity.first_name,
        &identity.last_name,
    ).await?;
    if !user.is_staff && config.is_staff_email(&user.email) {
        users::store::set_staff(&db_pool, user.id, true).await?;
        user.is_staff = true;
        tracing::info!(user_id = user.id, "promoted to staff");
    }
    if !user.is_active {
        tracing::warn!(user_id = user.id, "deactivated account tried to log in");
        return Err(AppError::Forbidden("This account has been deactivated".into()));
    }

    let return_url: Option<String> = session.remove(RETURN_URL).await?;
    session::sign_in(&session, &user).await?;
    tracing::info!(user_id = user.id, %provider, "welcome");

    let return_url = match return_url {
        Some(url) => session::safe_return_url(Some(url)),
        None if is_new => "/profile/edit".to_owned(),
        None => "/".to_owned(),
    };
    Ok(Redirect::to(&return_url).into_response())
}

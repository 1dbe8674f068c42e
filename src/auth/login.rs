use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use oauth2::{CsrfToken, PkceCodeChallenge};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    AppResult, include_res, res,
    session::{self, CSRF_STATE, PKCE_VERIFIER, RETURN_URL},
};

use super::{Clients, clients::ClientProvider};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login_page(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    State(clients): State<Clients>,
) -> Html<String> {
    let return_url = session::safe_return_url(return_url);
    let providers: String = clients
        .providers()
        .into_iter()
        .map(|provider| {
            res::render(
                include_res!(str, "/pages/login_provider.html"),
                &[
                    ("id", provider.id()),
                    ("name", &provider.to_string()),
                    ("return_url", &res::escape(&res::encode_query(&return_url))),
                ],
            )
        })
        .collect();

    let content = res::render(
        include_res!(str, "/pages/login.html"),
        &[("providers", &providers)],
    );
    res::page("Log in", None, &content)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    Path(provider): Path<ClientProvider>,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    State(clients): State<Clients>,
    session: Session,
) -> AppResult<Response> {
    let client = clients.get_client(provider)?;

    let (pkce_code_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (authorize_url, csrf_state) = client.authorize_url(CsrfToken::new_random)
        .add_scopes(provider.scopes())
        .set_pkce_challenge(pkce_code_challenge)
        .url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    session.insert(PKCE_VERIFIER, pkce_verifier.secret()).await?;
    if let Some(return_url) = return_url {
        session.insert(RETURN_URL, session::safe_return_url(Some(return_url))).await?;
    }

    tracing::debug!(%provider, "redirecting to OAuth provider");
    Ok(Redirect::to(authorize_url.as_str()).into_response())
}

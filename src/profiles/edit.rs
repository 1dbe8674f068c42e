use axum::{
    Form, debug_handler, extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, include_res, res, session, users};

use super::store;

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEditForm {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) bio: String,
    /// Checkboxes are only posted when ticked.
    pub(crate) can_help: Option<String>,
    pub(crate) help_wanted: Option<String>,
}

fn checked(on: bool) -> &'static str {
    if on { " checked" } else { "" }
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/profile/edit"));
    };
    let profile = store::for_user(&db_pool, me.id).await?;

    let content = res::render(
        include_res!(str, "/pages/profiles/edit.html"),
        &[
            ("first_name", &res::escape(&me.first_name)),
            ("last_name", &res::escape(&me.last_name)),
            ("email", &res::escape(&me.email)),
            ("bio", &res::escape(profile.as_ref().map_or("", |p| p.bio.as_str()))),
            ("can_help", checked(profile.as_ref().is_some_and(|p| p.can_help))),
            ("help_wanted", checked(profile.as_ref().is_some_and(|p| p.help_wanted))),
        ],
    );
    Ok(res::page("Edit profile", Some(&me), &content).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_profile(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<ProfileEditForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/profile/edit"));
    };

    users::store::update_details(&db_pool, me.id, &form.email, &form.first_name, &form.last_name)
        .await?;
    let profile = store::update(
        &db_pool,
        me.id,
        &form.bio,
        form.can_help.is_some(),
        form.help_wanted.is_some(),
    )
    .await?;

    Ok(Redirect::to(&format!("/profile/{}", profile.id)).into_response())
}

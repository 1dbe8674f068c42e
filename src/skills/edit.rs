use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, AppState,
    db::{Direction, User},
    profiles, session,
};

use super::{catalog, experiences};

#[derive(Debug, Deserialize)]
pub(crate) struct AddSkillForm {
    pub(crate) skill: String,
    pub(crate) level: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateSkillForm {
    pub(crate) level: i64,
    pub(crate) direction: Direction,
}

async fn own_experience(db_pool: &SqlitePool, me: &User, experience_id: i64) -> AppResult<()> {
    if experiences::owner(db_pool, experience_id).await? != me.id {
        return Err(AppError::Forbidden("You can only change your own skills".into()));
    }
    Ok(())
}

async fn back_to_profile(db_pool: &SqlitePool, me: &User) -> AppResult<Response> {
    let profile = profiles::store::get_or_create(db_pool, me.id).await?;
    Ok(Redirect::to(&format!("/profile/{}", profile.id)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn add_skill(
    Path(direction): Path<Direction>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(AddSkillForm { skill, level }): Form<AddSkillForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/profile"));
    };

    let profile = profiles::store::get_or_create(&db_pool, me.id).await?;
    let skill = catalog::get_or_create(&db_pool, &skill).await?;
    experiences::add(&db_pool, profile.id, skill.id, level, direction).await?;
    tracing::debug!(user_id = me.id, skill = %skill.name, ?direction, "skill added");

    back_to_profile(&db_pool, &me).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_skill(
    Path(experience_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(UpdateSkillForm { level, direction }): Form<UpdateSkillForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/profile"));
    };

    own_experience(&db_pool, &me, experience_id).await?;
    experiences::update(&db_pool, experience_id, level, direction).await?;

    back_to_profile(&db_pool, &me).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_skill(
    Path(experience_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/profile"));
    };

    own_experience(&db_pool, &me, experience_id).await?;
    experiences::delete(&db_pool, experience_id).await?;

    back_to_profile(&db_pool, &me).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::{db, session, users};

    async fn session_for(user: &User) -> Session {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session.insert(session::USER_ID, &user.uuid).await.unwrap();
        session
    }

    #[tokio::test]
    async fn only_owners_change_experiences() {
        let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
        let owner =
            users::store::create_user(&db_pool, "ada@example.com", "Ada", "").await.unwrap();
        let other =
            users::store::create_user(&db_pool, "eve@example.com", "Eve", "").await.unwrap();
        let profile = profiles::store::get_or_create(&db_pool, owner.id).await.unwrap();
        let skill = catalog::get_or_create(&db_pool, "rust").await.unwrap();
        let experience = experiences::add(&db_pool, profile.id, skill.id, 2, Direction::CanHelp)
            .await
            .unwrap();

        let form = || UpdateSkillForm { level: 5, direction: Direction::WantHelp };
        let Err(err) = update_skill(
            Path(experience.id),
            State(db_pool.clone()),
            session_for(&other).await,
            Form(form()),
        )
        .await
        else {
            panic!("others cannot edit the experience");
        };
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);

        let Err(err) =
            delete_skill(Path(experience.id), State(db_pool.clone()), session_for(&other).await)
                .await
        else {
            panic!("others cannot delete the experience");
        };
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);

        let unchanged = experiences::get(&db_pool, experience.id).await.unwrap();
        assert_eq!(unchanged.level, 2);
        assert_eq!(unchanged.direction, Direction::CanHelp);

        let Ok(response) = update_skill(
            Path(experience.id),
            State(db_pool.clone()),
            session_for(&owner).await,
            Form(form()),
        )
        .await
        else {
            panic!("the owner can edit the experience");
        };
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let updated = experiences::get(&db_pool, experience.id).await.unwrap();
        assert_eq!(updated.level, 5);
        assert_eq!(updated.direction, Direction::WantHelp);

        let Ok(response) =
            delete_skill(Path(experience.id), State(db_pool.clone()), session_for(&owner).await)
                .await
        else {
            panic!("the owner can delete the experience");
        };
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(experiences::get(&db_pool, experience.id).await.is_err());
    }
}

use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    db::{Direction, RequestType, User},
    include_res, matching, res, session,
    skills::experiences::{self, ExperienceView, LEVELS},
    users,
};

use super::store;

#[debug_handler(state = AppState)]
pub(crate) async fn own_profile(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/profile"));
    };

    Ok(match store::for_user(&db_pool, me.id).await? {
        Some(profile) => Redirect::to(&format!("/profile/{}", profile.id)),
        None => Redirect::to("/profile/edit"),
    }.into_response())
}

fn level_options(selected: i64) -> String {
    LEVELS
        .map(|level| {
            let attr = if level == selected { " selected" } else { "" };
            format!("<option value=\"{level}\"{attr}>{level}</option>")
        })
        .collect()
}

fn direction_options(selected: Direction) -> String {
    [Direction::CanHelp, Direction::WantHelp]
        .into_iter()
        .map(|direction| {
            let attr = if direction == selected { " selected" } else { "" };
            format!("<option value=\"{}\"{attr}>{}</option>", direction.slug(), direction.label())
        })
        .collect()
}

fn experience_items(
    experiences: &[ExperienceView],
    direction: Direction,
    editable: bool,
) -> String {
    let items: String = experiences
        .iter()
        .filter(|exp| exp.direction == direction)
        .map(|exp| {
            let controls = if editable {
                res::render(
                    include_res!(str, "/pages/profiles/experience_controls.html"),
                    &[
                        ("id", &exp.id.to_string()),
                        ("levels", &level_options(exp.level)),
                        ("directions", &direction_options(exp.direction)),
                    ],
                )
            } else {
                String::new()
            };
            res::render(
                include_res!(str, "/pages/profiles/experience.html"),
                &[
                    ("skill", &res::escape(&exp.skill)),
                    ("level", &exp.level.to_string()),
                    ("controls", &controls),
                ],
            )
        })
        .collect();

    if items.is_empty() {
        "<li>None yet.</li>".to_owned()
    } else {
        items
    }
}

fn request_form(owner: &User, kind: RequestType) -> String {
    let (heading, placeholder) = match kind {
        RequestType::Request => ("Ask for mentorship", "What would you like help with?"),
        RequestType::Offer => ("Offer to mentor", "How could you help?"),
    };
    res::render(
        include_res!(str, "/pages/profiles/request_form.html"),
        &[
            ("uuid", &owner.uuid),
            ("kind", kind.noun()),
            ("heading", heading),
            ("placeholder", placeholder),
        ],
    )
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    Path(profile_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/profile/{profile_id}")));
    };

    let profile = store::get(&db_pool, profile_id).await?;
    let owner = users::store::get(&db_pool, profile.user_id).await?;
    let is_own = owner.id == me.id;
    if !owner.is_active && !is_own && !me.is_staff {
        return res::sorry("profile");
    }

    let experiences = experiences::list_for_profile(&db_pool, profile.id).await?;

    let mut actions = String::new();
    if is_own {
        actions += &res::render(
            include_res!(str, "/pages/profiles/add_skill.html"),
            &[
                ("direction", Direction::CanHelp.slug()),
                ("heading", "Add a skill you can help with"),
                ("levels", &level_options(3)),
            ],
        );
        actions += &res::render(
            include_res!(str, "/pages/profiles/add_skill.html"),
            &[
                ("direction", Direction::WantHelp.slug()),
                ("heading", "Add a skill you want help with"),
                ("levels", &level_options(1)),
            ],
        );
    } else {
        if matching::eligible(&db_pool, &me, &owner, RequestType::Request).await? {
            actions += &request_form(&owner, RequestType::Request);
        }
        if matching::eligible(&db_pool, &me, &owner, RequestType::Offer).await? {
            actions += &request_form(&owner, RequestType::Offer);
        }
        if me.is_staff {
            let (verb, label) = if owner.is_active {
                ("deactivate", "Deactivate account")
            } else {
                ("activate", "Reactivate account")
            };
            actions += &format!(
                "<form method=\"post\" action=\"/admin/users/{}/{verb}\">\
                 <button>{label}</button></form>",
                owner.uuid
            );
        }
    }

    let mut intents = Vec::new();
    if profile.can_help {
        intents.push("Open to mentoring");
    }
    if profile.help_wanted {
        intents.push("Looking for a mentor");
    }

    let content = res::render(
        include_res!(str, "/pages/profiles/profile.html"),
        &[
            ("name", &res::escape(&owner.display_name())),
            ("edit_link", if is_own { "<a href=\"/profile/edit\">Edit profile</a>" } else { "" }),
            ("intents", &res::escape(&intents.join(" · "))),
            ("bio", &res::markdown(&profile.bio)),
            ("can_help", &experience_items(&experiences, Direction::CanHelp, is_own)),
            ("want_help", &experience_items(&experiences, Direction::WantHelp, is_own)),
            ("actions", &actions),
        ],
    );

    Ok(res::page(&owner.display_name(), Some(&me), &content).into_response())
}

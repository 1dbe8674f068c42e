use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, AppState,
    db::{self, RequestStatus, User},
    include_res, profiles, res, session,
};

use super::lifecycle::{self, Action, RequestSummary};

fn summary_rows(summaries: &[RequestSummary], empty: &str) -> String {
    if summaries.is_empty() {
        return format!("<p>{}</p>", res::escape(empty));
    }
    summaries
        .iter()
        .map(|summary| {
            res::render(
                include_res!(str, "/pages/requests/request_item.html"),
                &[
                    ("id", &summary.id.to_string()),
                    ("name", &res::escape(&summary.other_name())),
                    ("kind", summary.request_type.noun()),
                    ("status", summary.status.label()),
                    ("sent", &db::format_timestamp(summary.request_sent)),
                    ("message", &res::escape(&summary.message)),
                ],
            )
        })
        .collect()
}

#[debug_handler(state = AppState)]
pub(crate) async fn requests(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/requests"));
    };

    let sent = lifecycle::list_sent(&db_pool, me.id).await?;
    let received = lifecycle::list_received(&db_pool, me.id).await?;

    let content = res::render(
        include_res!(str, "/pages/requests/requests.html"),
        &[
            ("sent", &summary_rows(&sent, "You have not sent any requests yet.")),
            ("received", &summary_rows(&received, "Nobody has sent you a request yet.")),
        ],
    );
    Ok(res::page("Requests", Some(&me), &content).into_response())
}

async fn profile_link(db_pool: &SqlitePool, user: &User) -> AppResult<String> {
    let name = res::escape(&user.display_name());
    Ok(match profiles::store::for_user(db_pool, user.id).await? {
        Some(profile) => format!("<a href=\"/profile/{}\">{name}</a>", profile.id),
        None => name,
    })
}

fn action_form(request_id: i64, action: Action, label: &str) -> String {
    res::render(
        include_res!(str, "/pages/requests/action_form.html"),
        &[
            ("id", &request_id.to_string()),
            ("action", &action.to_string()),
            ("label", label),
        ],
    )
}

#[debug_handler(state = AppState)]
pub(crate) async fn request_detail(
    Path(request_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect(&format!("/requests/{request_id}")));
    };

    let detail = lifecycle::detail(&db_pool, request_id).await?;
    if !detail.involves(me.id) {
        return Err(AppError::Forbidden("You do not have access to this request".into()));
    }

    let request = &detail.request;
    let mut actions = String::new();
    for action in [Action::Accept, Action::Reject, Action::Complete] {
        if lifecycle::may_act(request, me.id, action)
            && lifecycle::next_status(request.status, action).is_some()
        {
            let label = match action {
                Action::Accept => "Accept",
                Action::Reject => "Reject",
                Action::Complete => "Mark as complete",
            };
            actions += &action_form(request.id, action, label);
        }
    }

    let status_note = match request.status {
        RequestStatus::Accepted => "Accepted: get in touch and start learning!",
        RequestStatus::Rejected => "This request was not accepted.",
        RequestStatus::Completed => "This mentorship is complete.",
        RequestStatus::New => "Waiting for an answer.",
    };

    let content = res::render(
        include_res!(str, "/pages/requests/request.html"),
        &[
            ("summary", &res::escape(&detail.to_string())),
            ("kind", request.request_type.noun()),
            ("requestor", &profile_link(&db_pool, &detail.requestor).await?),
            ("requestee", &profile_link(&db_pool, &detail.requestee).await?),
            ("status", request.status.label()),
            ("status_note", status_note),
            ("message", &res::escape(&request.message)),
            ("actions", &actions),
        ],
    );
    Ok(res::page("Request", Some(&me), &content).into_response())
}

pub mod index;
pub mod query;

use axum::{
    Router, debug_handler,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, include_res, profiles, res, session};

use query::{Hit, Page, SearchType};

pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(rename = "type", default)]
    kind: SearchType,
    page: Option<i64>,
}

fn page_link(params: &SearchParams, page: i64, label: &str) -> String {
    format!(
        "<a href=\"/search?q={}&amp;type={}&amp;page={page}\">{label}</a>",
        res::escape(&res::encode_query(&params.q)),
        params.kind.slug(),
    )
}

fn result_items(hits: &[Hit]) -> String {
    if hits.is_empty() {
        return "<p>No matching profiles.</p>".to_owned();
    }
    hits.iter()
        .map(|hit| {
            res::render(
                include_res!(str, "/pages/search/result.html"),
                &[
                    ("id", &hit.profile_id.to_string()),
                    ("name", &res::escape(&hit.name())),
                    ("bio", &res::escape(&profiles::short_bio(&hit.bio))),
                    ("skills", &res::escape(&hit.skills)),
                ],
            )
        })
        .collect()
}

fn pager(params: &SearchParams, page: &Page<Hit>) -> String {
    let mut links = Vec::new();
    if page.has_previous() {
        links.push(page_link(params, page.number - 1, "Previous"));
    }
    links.push(format!("Page {} of {}", page.number, page.total_pages));
    if page.has_next() {
        links.push(page_link(params, page.number + 1, "Next"));
    }
    links.join(" ")
}

#[debug_handler(state = AppState)]
pub(crate) async fn search(
    Query(params): Query<SearchParams>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&session, &db_pool).await? else {
        return Ok(session::login_redirect("/search"));
    };

    let page = query::search(
        &db_pool,
        me.id,
        &params.q,
        params.kind,
        params.page.unwrap_or(1),
    )
    .await?;

    let selected = |kind: SearchType| if kind == params.kind { " selected" } else { "" };
    let content = res::render(
        include_res!(str, "/pages/search/search.html"),
        &[
            ("q", &res::escape(&params.q)),
            ("mentor_selected", selected(SearchType::Mentor)),
            ("mentee_selected", selected(SearchType::Mentee)),
            ("total", &page.total.to_string()),
            ("results", &result_items(&page.items)),
            ("pager", &pager(&params, &page)),
        ],
    );
    Ok(res::page("Search", Some(&me), &content).into_response())
}

use serde::Deserialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    db::Direction,
    error::{Result, StoreError},
};

pub const PAGE_SIZE: i64 = 5;

/// Which side of the mentorship the searcher is looking for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    Mentor,
    Mentee,
}

impl SearchType {
    pub fn direction(self) -> Direction {
        match self {
            SearchType::Mentor => Direction::CanHelp,
            SearchType::Mentee => Direction::WantHelp,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            SearchType::Mentor => "mentor",
            SearchType::Mentee => "mentee",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Hit {
    pub profile_id: i64,
    pub user_uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub bio: String,
    pub skills: String,
}

impl Hit {
    pub fn name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        match name.trim() {
            "" => self.email.clone(),
            name => name.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: i64,
    pub total_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// Turns free text into an FTS5 query in which every word must match.
/// Returns `None` when nothing searchable is left.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .map(|word| format!("\"{}\"", word.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

const HIT_COLUMNS: &str = "p.id AS profile_id, u.uuid AS user_uuid, u.first_name, u.last_name,
    u.email, p.bio,
    COALESCE((SELECT group_concat(s.display_name, ', ')
              FROM experiences e JOIN skills s ON s.id=e.skill_id
              WHERE e.profile_id=p.id), '') AS skills";

const CANDIDATES: &str = "u.is_active=1 AND u.id!=?
    AND EXISTS (SELECT 1 FROM experiences e WHERE e.profile_id=p.id AND e.direction=?)";

fn page_bounds(total: i64, page: i64) -> Result<i64> {
    let total_pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    if page < 1 || page > total_pages {
        return Err(StoreError::NotFound("page"));
    }
    Ok(total_pages)
}

/// Active profiles other than the viewer's that declare at least one
/// experience in `kind`'s direction. With a query they are ranked by
/// relevance, otherwise newest first.
pub async fn search(
    db_pool: &SqlitePool,
    viewer_id: i64,
    text: &str,
    kind: SearchType,
    page: i64,
) -> Result<Page<Hit>> {
    let direction = kind.direction();

    let Some(query) = fts_query(text) else {
        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM profiles p JOIN users u ON u.id=p.user_id WHERE {CANDIDATES}"
        ))
        .bind(viewer_id)
        .bind(direction)
        .fetch_one(db_pool)
        .await?;
        let total_pages = page_bounds(total, page)?;

        let items: Vec<Hit> = sqlx::query_as(&format!(
            "SELECT {HIT_COLUMNS} FROM profiles p JOIN users u ON u.id=p.user_id
             WHERE {CANDIDATES}
             ORDER BY p.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(viewer_id)
        .bind(direction)
        .bind(PAGE_SIZE)
        .bind((page - 1) * PAGE_SIZE)
        .fetch_all(db_pool)
        .await?;

        return Ok(Page { items, number: page, total_pages, total });
    };

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM profile_search
         JOIN profiles p ON p.id=profile_search.rowid
         JOIN users u ON u.id=p.user_id
         WHERE profile_search MATCH ? AND {CANDIDATES}"
    ))
    .bind(&query)
    .bind(viewer_id)
    .bind(direction)
    .fetch_one(db_pool)
    .await?;
    let total_pages = page_bounds(total, page)?;

    // bm25 is lower for better matches; names and skills weigh more than bio text
    let items: Vec<Hit> = sqlx::query_as(&format!(
        "SELECT {HIT_COLUMNS} FROM profile_search
         JOIN profiles p ON p.id=profile_search.rowid
         JOIN users u ON u.id=p.user_id
         WHERE profile_search MATCH ? AND {CANDIDATES}
         ORDER BY bm25(profile_search, 2.0, 1.0, 2.0), p.id DESC
         LIMIT ? OFFSET ?"
    ))
    .bind(&query)
    .bind(viewer_id)
    .bind(direction)
    .bind(PAGE_SIZE)
    .bind((page - 1) * PAGE_SIZE)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!(%query, total, page, "profile search");
    Ok(Page { items, number: page, total_pages, total })
}

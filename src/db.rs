use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::error::Result;

/// Opens the pool and brings the schema up to date.
///
/// In-memory databases live and die with their connection, so callers
/// using `sqlite::memory:` should pass `max_connections = 1`.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!().run(&db_pool).await?;
    tracing::debug!(url, "database ready");

    Ok(db_pool)
}

pub fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub fn format_timestamp(ts: i64) -> String {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.to_string())
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: i64,

    // unique: uuid
    // unique: email (case-insensitive)
}

impl User {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_owned()
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub bio: String,
    /// Open to mentoring.
    pub can_help: bool,
    /// Open to being mentored.
    pub help_wanted: bool,

    // unique: user_id
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub display_name: String,

    // unique: name
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    WantHelp = 0,
    CanHelp = 1,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::WantHelp => "wants help",
            Direction::CanHelp => "can help",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Direction::WantHelp => "want_help",
            Direction::CanHelp => "can_help",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Experience {
    pub id: i64,
    pub profile_id: i64,
    pub skill_id: i64,
    pub level: i64,
    pub direction: Direction,

    // unique: profile_id, skill_id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Request = 0,
    Offer = 1,
}

impl RequestType {
    pub fn noun(self) -> &'static str {
        match self {
            RequestType::Request => "request",
            RequestType::Offer => "offer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New = 0,
    Accepted = 1,
    Rejected = 2,
    Completed = 3,
}

impl RequestStatus {
    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BuddyRequest {
    pub id: i64,
    pub requestor_id: i64,
    pub requestee_id: i64,
    pub message: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub request_sent: i64,

    // unique: requestor_id, requestee_id, request_type where status != rejected
}

//! Who may ask whom for mentorship.
//!
//! The rules are pure functions over [`Party`] facts; the async helpers
//! gather those facts from the database.

use sqlx::SqlitePool;

use crate::{
    db::{Direction, RequestStatus, RequestType, User},
    error::Result, profiles, skills::experiences,
};

/// Everything the rules need to know about one side of a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    pub user_id: i64,
    pub is_active: bool,
    /// Has at least one WANT_HELP experience.
    pub wants_help: bool,
    /// Has at least one CAN_HELP experience.
    pub can_help: bool,
    /// Profile flag: open to mentoring.
    pub open_to_mentoring: bool,
    /// Profile flag: open to being mentored.
    pub open_to_mentored: bool,
}

/// A mentee asking a mentor.
pub fn may_request(mentee: &Party, mentor: &Party, linked: bool) -> bool {
    mentee.user_id != mentor.user_id
        && mentee.is_active
        && mentor.is_active
        && mentee.wants_help
        && mentor.can_help
        && mentor.open_to_mentoring
        && !linked
}

/// A mentor offering to help a mentee.
pub fn may_offer(mentor: &Party, mentee: &Party, linked: bool) -> bool {
    mentor.user_id != mentee.user_id
        && mentor.is_active
        && mentee.is_active
        && mentor.can_help
        && mentee.wants_help
        && mentee.open_to_mentored
        && !linked
}

pub async fn load_party(db_pool: &SqlitePool, user: &User) -> Result<Party> {
    let profile = profiles::store::for_user(db_pool, user.id).await?;
    Ok(Party {
        user_id: user.id,
        is_active: user.is_active,
        wants_help: experiences::has_direction(db_pool, user.id, Direction::WantHelp).await?,
        can_help: experiences::has_direction(db_pool, user.id, Direction::CanHelp).await?,
        open_to_mentoring: profile.as_ref().is_some_and(|p| p.can_help),
        open_to_mentored: profile.as_ref().is_some_and(|p| p.help_wanted),
    })
}

/// True when a non-rejected request or offer exists between the two users,
/// whichever way it points.
pub async fn pair_linked(db_pool: &SqlitePool, a: i64, b: i64) -> Result<bool> {
    let found: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM buddy_requests
         WHERE ((requestor_id=?1 AND requestee_id=?2) OR (requestor_id=?2 AND requestee_id=?1))
           AND status != ?3
         LIMIT 1",
    )
    .bind(a)
    .bind(b)
    .bind(RequestStatus::Rejected)
    .fetch_optional(db_pool)
    .await?;
    Ok(found.is_some())
}

/// Whether `sender` may send `recipient` a buddy request of `kind`.
///
/// For [`RequestType::Request`] the sender is the mentee; for
/// [`RequestType::Offer`] the sender is the mentor.
pub async fn eligible(
    db_pool: &SqlitePool,
    sender: &User,
    recipient: &User,
    kind: RequestType,
) -> Result<bool> {
    if sender.id == recipient.id {
        return Ok(false);
    }

    let sender_party = load_party(db_pool, sender).await?;
    let recipient_party = load_party(db_pool, recipient).await?;
    let linked = pair_linked(db_pool, sender.id, recipient.id).await?;

    Ok(match kind {
        RequestType::Request => may_request(&sender_party, &recipient_party, linked),
        RequestType::Offer => may_offer(&sender_party, &recipient_party, linked),
    })
}

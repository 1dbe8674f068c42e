use std::fmt;

use serde::Deserialize;
use sqlx::{FromRow, SqlitePool};

use crate::{
    db::{self, BuddyRequest, RequestStatus, RequestType, User},
    error::{Result, StoreError},
    matching, profiles, users,
};

use super::notify::{Contact, Notifier};

const REQUEST_COLUMNS: &str =
    "id,requestor_id,requestee_id,message,request_type,status,request_sent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accept,
    #[serde(alias = "ignore")]
    Reject,
    Complete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Complete => "complete",
        })
    }
}

/// The only legal moves: NEW→ACCEPTED, NEW→REJECTED, ACCEPTED→COMPLETED.
pub fn next_status(current: RequestStatus, action: Action) -> Option<RequestStatus> {
    use RequestStatus::*;
    match (current, action) {
        (New, Action::Accept) => Some(Accepted),
        (New, Action::Reject) => Some(Rejected),
        (Accepted, Action::Complete) => Some(Completed),
        _ => None,
    }
}

/// Whether `user_id` may perform `action` on `request`.
pub fn may_act(request: &BuddyRequest, user_id: i64, action: Action) -> bool {
    match action {
        Action::Accept | Action::Reject => request.requestee_id == user_id,
        Action::Complete => request.requestee_id == user_id || request.requestor_id == user_id,
    }
}

/// A request with both parties loaded.
#[derive(Debug, Clone)]
pub struct RequestDetail {
    pub request: BuddyRequest,
    pub requestor: User,
    pub requestee: User,
}

impl RequestDetail {
    pub fn involves(&self, user_id: i64) -> bool {
        self.request.requestor_id == user_id || self.request.requestee_id == user_id
    }
}

impl fmt::Display for RequestDetail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Buddy request from {} to {} on {}",
            self.requestor.email,
            self.requestee.email,
            db::format_timestamp(self.request.request_sent)
        )
    }
}

/// A row of the sent/received lists.
#[derive(Debug, Clone, FromRow)]
pub struct RequestSummary {
    pub id: i64,
    pub other_uuid: String,
    pub other_first_name: String,
    pub other_last_name: String,
    pub other_email: String,
    pub message: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub request_sent: i64,
}

impl RequestSummary {
    pub fn other_name(&self) -> String {
        let name = format!("{} {}", self.other_first_name, self.other_last_name);
        match name.trim() {
            "" => self.other_email.clone(),
            name => name.to_owned(),
        }
    }
}

pub async fn get(db_pool: &SqlitePool, id: i64) -> Result<BuddyRequest> {
    sqlx::query_as(&format!("SELECT {REQUEST_COLUMNS} FROM buddy_requests WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(StoreError::NotFound("request"))
}

pub async fn detail(db_pool: &SqlitePool, id: i64) -> Result<RequestDetail> {
    let request = get(db_pool, id).await?;
    Ok(RequestDetail {
        requestor: users::store::get(db_pool, request.requestor_id).await?,
        requestee: users::store::get(db_pool, request.requestee_id).await?,
        request,
    })
}

async fn contact(db_pool: &SqlitePool, notifier: &Notifier, user: &User) -> Result<Contact> {
    let profile = profiles::store::for_user(db_pool, user.id).await?;
    Ok(Contact {
        name: user.display_name(),
        email: user.email.clone(),
        profile_url: notifier.profile_url(profile.map(|p| p.id)),
    })
}

fn refusal(kind: RequestType) -> StoreError {
    StoreError::NotAllowed(match kind {
        RequestType::Request => "You cannot send this user a request.".into(),
        RequestType::Offer => "You cannot send this user an offer.".into(),
    })
}

/// Creates a NEW request or offer from `sender` to `recipient` and tells
/// the recipient about it.
pub async fn send(
    db_pool: &SqlitePool,
    notifier: &Notifier,
    sender: &User,
    recipient: &User,
    kind: RequestType,
    message: &str,
) -> Result<BuddyRequest> {
    let message = message.trim();
    if message.is_empty() {
        return Err(StoreError::Invalid("message is empty".into()));
    }
    if !matching::eligible(db_pool, sender, recipient, kind).await? {
        return Err(refusal(kind));
    }

    let request_sent = db::now();
    let id = sqlx::query(
        "INSERT INTO buddy_requests
         (requestor_id,requestee_id,message,request_type,status,request_sent)
         VALUES (?,?,?,?,?,?)",
    )
    .bind(sender.id)
    .bind(recipient.id)
    .bind(message)
    .bind(kind)
    .bind(RequestStatus::New)
    .bind(request_sent)
    .execute(db_pool)
    .await
    .map_err(|err| match StoreError::unique("request")(err) {
        // a concurrent send got there first
        StoreError::Duplicate(_) => refusal(kind),
        other => other,
    })?
    .last_insert_rowid();

    let request = BuddyRequest {
        id,
        requestor_id: sender.id,
        requestee_id: recipient.id,
        message: message.to_owned(),
        request_type: kind,
        status: RequestStatus::New,
        request_sent,
    };
    tracing::info!(
        request_id = id,
        from = sender.id,
        to = recipient.id,
        kind = kind.noun(),
        "buddy request sent"
    );

    notifier
        .request_created(
            &request,
            &contact(db_pool, notifier, sender).await?,
            &contact(db_pool, notifier, recipient).await?,
        )
        .await;

    Ok(request)
}

/// Applies `action` for `actor`, then sends the emails the new status calls for.
pub async fn transition(
    db_pool: &SqlitePool,
    notifier: &Notifier,
    actor: &User,
    id: i64,
    action: Action,
) -> Result<BuddyRequest> {
    let RequestDetail { mut request, requestor, requestee } = detail(db_pool, id).await?;

    if !may_act(&request, actor.id, action) {
        return Err(StoreError::NotAllowed(format!("You cannot {action} this request")));
    }
    let Some(next) = next_status(request.status, action) else {
        return Err(StoreError::NotAllowed(format!(
            "You cannot {action} a request that is {}",
            request.status.label()
        )));
    };

    let updated = sqlx::query("UPDATE buddy_requests SET status=? WHERE id=? AND status=?")
        .bind(next)
        .bind(id)
        .bind(request.status)
        .execute(db_pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(StoreError::NotAllowed("This request was changed by someone else".into()));
    }

    tracing::info!(
        request_id = id,
        actor = actor.id,
        from = request.status.label(),
        to = next.label(),
        "buddy request updated"
    );
    request.status = next;

    match next {
        RequestStatus::Accepted => {
            notifier
                .request_accepted(
                    &request,
                    &contact(db_pool, notifier, &requestor).await?,
                    &contact(db_pool, notifier, &requestee).await?,
                )
                .await;
        }
        RequestStatus::Completed => {
            notifier
                .request_completed(
                    &contact(db_pool, notifier, &requestor).await?,
                    &contact(db_pool, notifier, &requestee).await?,
                )
                .await;
        }
        RequestStatus::New | RequestStatus::Rejected => {}
    }

    Ok(request)
}

const SUMMARY_SELECT: &str = "SELECT r.id, u.uuid AS other_uuid, u.first_name AS other_first_name,
        u.last_name AS other_last_name, u.email AS other_email,
        r.message, r.request_type, r.status, r.request_sent
    FROM buddy_requests r";

pub async fn list_sent(db_pool: &SqlitePool, user_id: i64) -> Result<Vec<RequestSummary>> {
    Ok(sqlx::query_as(&format!(
        "{SUMMARY_SELECT} JOIN users u ON u.id=r.requestee_id
         WHERE r.requestor_id=? ORDER BY r.request_sent DESC, r.id DESC"
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?)
}

pub async fn list_received(db_pool: &SqlitePool, user_id: i64) -> Result<Vec<RequestSummary>> {
    Ok(sqlx::query_as(&format!(
        "{SUMMARY_SELECT} JOIN users u ON u.id=r.requestor_id
         WHERE r.requestee_id=? ORDER BY r.request_sent DESC, r.id DESC"
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: RequestStatus) -> BuddyRequest {
        BuddyRequest {
            id: 1,
            requestor_id: 10,
            requestee_id: 20,
            message: "hi".into(),
            request_type: RequestType::Request,
            status,
            request_sent: 0,
        }
    }

    #[test]
    fn only_forward_transitions_exist() {
        use RequestStatus::*;
        assert_eq!(next_status(New, Action::Accept), Some(Accepted));
        assert_eq!(next_status(New, Action::Reject), Some(Rejected));
        assert_eq!(next_status(Accepted, Action::Complete), Some(Completed));

        assert_eq!(next_status(New, Action::Complete), None);
        assert_eq!(next_status(Accepted, Action::Reject), None);
        assert_eq!(next_status(Rejected, Action::Accept), None);
        assert_eq!(next_status(Completed, Action::Accept), None);
        assert_eq!(next_status(Completed, Action::Complete), None);
    }

    #[test]
    fn only_requestee_answers_but_either_side_completes() {
        let req = request(RequestStatus::New);
        assert!(may_act(&req, 20, Action::Accept));
        assert!(!may_act(&req, 10, Action::Accept));
        assert!(!may_act(&req, 10, Action::Reject));
        assert!(may_act(&req, 10, Action::Complete));
        assert!(may_act(&req, 20, Action::Complete));
        assert!(!may_act(&req, 30, Action::Complete));
    }

    #[test]
    fn ignore_is_accepted_as_reject() {
        #[derive(Deserialize)]
        struct Form {
            status: Action,
        }
        let form: Form = serde_json::from_str(r#"{"status":"ignore"}"#).unwrap();
        assert_eq!(form.status, Action::Reject);
    }
}

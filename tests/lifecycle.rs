use buddy_mentorship::{
    db::{self, Direction, RequestStatus, RequestType, User},
    error::StoreError,
    mail::{Mailer, Outbox},
    matching, profiles,
    requests::{Action, lifecycle, notify::Notifier},
    skills::{catalog, experiences},
    users,
};
use sqlx::SqlitePool;

const SITE: &str = "http://buddy.test";

async fn setup() -> (SqlitePool, Notifier, Outbox) {
    let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let (mailer, outbox) = Mailer::memory();
    (db_pool, Notifier::new(mailer, SITE), outbox)
}

async fn user(db_pool: &SqlitePool, email: &str, first: &str, last: &str) -> User {
    users::store::create_user(db_pool, email, first, last).await.unwrap()
}

/// Gives `user` a profile with the given flags and one experience in `direction`.
async fn declare(
    db_pool: &SqlitePool,
    user: &User,
    can_help: bool,
    help_wanted: bool,
    skill: &str,
    direction: Direction,
) -> i64 {
    let profile = profiles::store::update(db_pool, user.id, "", can_help, help_wanted)
        .await
        .unwrap();
    let skill = catalog::get_or_create(db_pool, skill).await.unwrap();
    experiences::add(db_pool, profile.id, skill.id, 3, direction).await.unwrap();
    profile.id
}

#[tokio::test]
async fn eligibility_needs_flags_and_experiences() {
    let (db_pool, _, _) = setup().await;
    let mentor = user(&db_pool, "mia@example.com", "Mia", "Mentor").await;
    let mentee = user(&db_pool, "max@example.com", "Max", "Mentee").await;

    assert!(!matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());

    profiles::store::update(&db_pool, mentor.id, "", true, false).await.unwrap();
    profiles::store::update(&db_pool, mentee.id, "", false, true).await.unwrap();
    assert!(!matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());

    declare(&db_pool, &mentor, true, false, "rust", Direction::CanHelp).await;
    assert!(!matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());

    declare(&db_pool, &mentee, false, true, "rust", Direction::WantHelp).await;
    assert!(matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());
    assert!(matching::eligible(&db_pool, &mentor, &mentee, RequestType::Offer).await.unwrap());

    // roles do not swap
    assert!(!matching::eligible(&db_pool, &mentor, &mentee, RequestType::Request).await.unwrap());
    assert!(!matching::eligible(&db_pool, &mentee, &mentee, RequestType::Request).await.unwrap());

    users::store::set_active(&db_pool, mentor.id, false).await.unwrap();
    let mentor = users::store::get(&db_pool, mentor.id).await.unwrap();
    assert!(!matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());
}

#[tokio::test]
async fn request_lifecycle_sends_the_right_mail() {
    let (db_pool, notifier, outbox) = setup().await;
    let mentor = user(&db_pool, "mia@example.com", "Mia", "Mentor").await;
    let mentee = user(&db_pool, "max@example.com", "Max", "Mentee").await;
    let mentor_profile = declare(&db_pool, &mentor, true, false, "rust", Direction::CanHelp).await;
    let mentee_profile = declare(&db_pool, &mentee, false, true, "rust", Direction::WantHelp).await;

    let err = lifecycle::send(&db_pool, &notifier, &mentee, &mentor, RequestType::Request, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert!(outbox.sent().is_empty());

    let request = lifecycle::send(
        &db_pool,
        &notifier,
        &mentee,
        &mentor,
        RequestType::Request,
        "Could you help me with lifetimes?",
    )
    .await
    .unwrap();
    assert_eq!(request.status, RequestStatus::New);

    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "mia@example.com");
    assert!(sent[0].body.contains("lifetimes"));
    outbox.clear();

    // an open request blocks both directions
    assert!(!matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());
    assert!(!matching::eligible(&db_pool, &mentor, &mentee, RequestType::Offer).await.unwrap());
    let err = lifecycle::send(&db_pool, &notifier, &mentee, &mentor, RequestType::Request, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAllowed(_)));

    let err = lifecycle::transition(&db_pool, &notifier, &mentee, request.id, Action::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAllowed(_)));

    let err = lifecycle::transition(&db_pool, &notifier, &mentor, request.id, Action::Complete)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAllowed(_)));

    let accepted = lifecycle::transition(&db_pool, &notifier, &mentor, request.id, Action::Accept)
        .await
        .unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
    let sent = outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "max@example.com");
    outbox.clear();

    let completed = lifecycle::transition(
        &db_pool,
        &notifier,
        &mentee,
        request.id,
        Action::Complete,
    )
    .await
    .unwrap();
    assert_eq!(completed.status, RequestStatus::Completed);

    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    let to_mentor = sent.iter().find(|mail| mail.to == "mia@example.com").unwrap();
    let to_mentee = sent.iter().find(|mail| mail.to == "max@example.com").unwrap();
    assert!(to_mentor.body.contains("Max Mentee"));
    assert!(to_mentor.body.contains(&format!("{SITE}/profile/{mentee_profile}")));
    assert!(to_mentee.body.contains("Mia Mentor"));
    assert!(to_mentee.body.contains(&format!("{SITE}/profile/{mentor_profile}")));

    let err = lifecycle::transition(&db_pool, &notifier, &mentor, request.id, Action::Complete)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAllowed(_)));

    let stored = lifecycle::get(&db_pool, request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Completed);
}

#[tokio::test]
async fn rejected_offers_are_silent_and_free_the_pair() {
    let (db_pool, notifier, outbox) = setup().await;
    let mentor = user(&db_pool, "mia@example.com", "Mia", "Mentor").await;
    let mentee = user(&db_pool, "max@example.com", "Max", "Mentee").await;
    declare(&db_pool, &mentor, true, false, "go", Direction::CanHelp).await;
    declare(&db_pool, &mentee, false, true, "go", Direction::WantHelp).await;

    let offer = lifecycle::send(
        &db_pool,
        &notifier,
        &mentor,
        &mentee,
        RequestType::Offer,
        "Happy to help",
    )
    .await
    .unwrap();
    assert_eq!(outbox.sent().len(), 1);
    assert_eq!(outbox.sent()[0].to, "max@example.com");
    outbox.clear();

    let rejected = lifecycle::transition(&db_pool, &notifier, &mentee, offer.id, Action::Reject)
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert!(outbox.sent().is_empty());

    assert!(matching::eligible(&db_pool, &mentee, &mentor, RequestType::Request).await.unwrap());
    assert_eq!(lifecycle::list_sent(&db_pool, mentor.id).await.unwrap().len(), 1);
    assert_eq!(lifecycle::list_received(&db_pool, mentee.id).await.unwrap().len(), 1);
    assert!(lifecycle::list_received(&db_pool, mentor.id).await.unwrap().is_empty());
}

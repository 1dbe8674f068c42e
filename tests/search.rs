use buddy_mentorship::{
    db::{self, Direction, User},
    error::StoreError, profiles,
    search::query::{self, SearchType},
    skills::{catalog, experiences},
    users,
};
use sqlx::SqlitePool;

async fn member(
    db_pool: &SqlitePool,
    email: &str,
    name: (&str, &str),
    bio: &str,
    skill: &str,
    direction: Direction,
) -> User {
    let user = users::store::create_user(db_pool, email, name.0, name.1).await.unwrap();
    let profile = profiles::store::update(
        db_pool,
        user.id,
        bio,
        direction == Direction::CanHelp,
        direction == Direction::WantHelp,
    )
    .await
    .unwrap();
    let skill = catalog::get_or_create(db_pool, skill).await.unwrap();
    experiences::add(db_pool, profile.id, skill.id, 3, direction).await.unwrap();
    user
}

#[tokio::test]
async fn results_are_ranked_and_filtered() {
    let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let viewer = member(
        &db_pool,
        "viewer@example.com",
        ("Vi", "Ewer"),
        "I love rust",
        "rust",
        Direction::CanHelp,
    )
    .await;
    let expert = member(
        &db_pool,
        "ann@example.com",
        ("Ann", "Expert"),
        "Rust all day. I write rust for work and rust for fun.",
        "rust",
        Direction::CanHelp,
    )
    .await;
    let dabbler = member(
        &db_pool,
        "bob@example.com",
        ("Bob", "Dabbler"),
        "Mostly python and gardening, with a bit of rust on weekends when the weather is bad.",
        "python",
        Direction::CanHelp,
    )
    .await;
    member(
        &db_pool,
        "cat@example.com",
        ("Cat", "Learner"),
        "Learning rust",
        "rust",
        Direction::WantHelp,
    )
    .await;
    let gone = member(
        &db_pool,
        "dan@example.com",
        ("Dan", "Gone"),
        "rust rust rust",
        "rust",
        Direction::CanHelp,
    )
    .await;
    users::store::set_active(&db_pool, gone.id, false).await.unwrap();

    let page = query::search(&db_pool, viewer.id, "rust", SearchType::Mentor, 1).await.unwrap();
    let names: Vec<String> = page.items.iter().map(|hit| hit.name()).collect();
    assert_eq!(names, ["Ann Expert", "Bob Dabbler"]);
    assert_eq!(page.total, 2);
    assert!(!page.has_next());
    assert!(page.items.iter().all(|hit| hit.user_uuid != viewer.uuid));
    assert_eq!(page.items[0].user_uuid, expert.uuid);
    assert_eq!(page.items[1].user_uuid, dabbler.uuid);

    let mentees = query::search(&db_pool, viewer.id, "rust", SearchType::Mentee, 1).await.unwrap();
    let names: Vec<String> = mentees.items.iter().map(|hit| hit.name()).collect();
    assert_eq!(names, ["Cat Learner"]);

    // stemmed: "gardens" finds "gardening"
    let page = query::search(&db_pool, viewer.id, "gardens", SearchType::Mentor, 1).await.unwrap();
    assert_eq!(page.total, 1);

    // every term is required
    let page =
        query::search(&db_pool, viewer.id, "rust gardening", SearchType::Mentor, 1).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].user_uuid, dabbler.uuid);
}

#[tokio::test]
async fn renamed_users_are_found_by_their_new_name() {
    let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let viewer = member(
        &db_pool,
        "viewer@example.com",
        ("Vi", "Ewer"),
        "",
        "rust",
        Direction::WantHelp,
    )
    .await;
    let mentor = member(&db_pool, "ann@example.com", ("Ann", "Old"), "", "rust", Direction::CanHelp)
        .await;

    users::store::update_details(&db_pool, mentor.id, "ann@example.com", "Ann", "Newname")
        .await
        .unwrap();

    let page = query::search(&db_pool, viewer.id, "newname", SearchType::Mentor, 1).await.unwrap();
    assert_eq!(page.total, 1);
    let page = query::search(&db_pool, viewer.id, "old", SearchType::Mentor, 1).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn listing_without_a_query_pages_newest_first() {
    let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let viewer = member(
        &db_pool,
        "viewer@example.com",
        ("Vi", "Ewer"),
        "",
        "rust",
        Direction::WantHelp,
    )
    .await;
    for n in 0..6 {
        member(
            &db_pool,
            &format!("mentor{n}@example.com"),
            ("Mentor", &format!("N{n}")),
            "",
            "rust",
            Direction::CanHelp,
        )
        .await;
    }

    let first = query::search(&db_pool, viewer.id, "", SearchType::Mentor, 1).await.unwrap();
    assert_eq!(first.items.len(), query::PAGE_SIZE as usize);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items[0].name(), "Mentor N5");
    assert!(first.has_next());

    let second = query::search(&db_pool, viewer.id, "  ", SearchType::Mentor, 2).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].name(), "Mentor N0");
    assert!(second.has_previous());

    let err = query::search(&db_pool, viewer.id, "", SearchType::Mentor, 3).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn renamed_skills_are_found_by_their_new_name() {
    let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let viewer = member(
        &db_pool,
        "viewer@example.com",
        ("Vi", "Ewer"),
        "",
        "rust",
        Direction::WantHelp,
    )
    .await;
    member(&db_pool, "ops@example.com", ("Olga", "Ops"), "", "k8s", Direction::CanHelp).await;

    let skill = catalog::find(&db_pool, "k8s").await.unwrap().unwrap();
    catalog::rename_display(&db_pool, skill.id, "Kubernetes").await.unwrap();

    let page =
        query::search(&db_pool, viewer.id, "kubernetes", SearchType::Mentor, 1).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].skills, "Kubernetes");
}

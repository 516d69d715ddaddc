//! The list/filter/paginate contract every list endpoint is built on:
//! page and count queries share one predicate set, page numbers clamp, and
//! the "all" sentinel lifts a filter.

use bcx_db::{Db, Page, Param, Where, filter_value, migrations};

async fn seeded_db() -> Db {
    let db = Db::open_in_memory().unwrap();
    migrations::run(&db).await;

    for i in 0..25 {
        let role = if i % 2 == 0 { "donor" } else { "receiver" };
        let status = if i % 5 == 0 { "banned" } else { "active" };
        db.run(
            "INSERT INTO users (id, email, password_hash, name, role, status, created_at)
             VALUES (?, ?, 'x', ?, ?, ?, datetime('now', ?))",
            &[
                Param::Text(format!("00000000-0000-0000-0000-{i:012}")),
                Param::Text(format!("user{i}@example.com")),
                Param::Text(format!("User {i}")),
                Param::Text(role.into()),
                Param::Text(status.into()),
                Param::Text(format!("-{i} minutes")),
            ],
        )
        .await
        .unwrap();
    }
    db
}

async fn run_list(db: &Db, filter: &Where, page: Page) -> (Vec<bcx_db::Row>, i64) {
    let sql = format!(
        "SELECT id, email, name, role, status, created_at FROM users {} \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
        filter.clause()
    );
    let items = db
        .all(
            &sql,
            &filter.params_with([Param::Int(page.size), Param::Int(page.offset())]),
        )
        .await
        .unwrap();
    let total = db.count("users", filter).await.unwrap();
    (items, total)
}

#[tokio::test]
async fn page_window_never_exceeds_page_size() {
    let db = seeded_db().await;
    let filter = Where::new();

    let page = Page::clamp(Some(1), Some(10));
    let (items, total) = run_list(&db, &filter, page).await;
    assert_eq!(items.len(), 10);
    assert_eq!(total, 25);

    // Last page carries the remainder, total is unchanged.
    let page = Page::clamp(Some(3), Some(10));
    let (items, total) = run_list(&db, &filter, page).await;
    assert_eq!(items.len(), 5);
    assert_eq!(total, 25);

    // Past the end: empty page, same total.
    let page = Page::clamp(Some(9), Some(10));
    let (items, total) = run_list(&db, &filter, page).await;
    assert!(items.is_empty());
    assert_eq!(total, 25);
}

#[tokio::test]
async fn filters_apply_to_both_items_and_total() {
    let db = seeded_db().await;

    let mut filter = Where::new();
    filter.eq("role", "donor");
    filter.eq("status", "active");

    let page = Page::clamp(Some(1), Some(100));
    let (items, total) = run_list(&db, &filter, page).await;

    // donors are the even ids; of 13 donors, ids 0, 10 and 20 are banned
    assert_eq!(total, 10);
    assert_eq!(items.len(), 10);
    for item in &items {
        assert_eq!(item.text("role"), Some("donor"));
        assert_eq!(item.text("status"), Some("active"));
    }
}

#[tokio::test]
async fn search_matches_either_column() {
    let db = seeded_db().await;

    let mut filter = Where::new();
    filter.like_any(&["email", "name"], "user1");

    // user1, user10..user19
    let (items, total) = run_list(&db, &filter, Page::clamp(None, None)).await;
    assert_eq!(total, 11);
    assert_eq!(items.len(), 11);
}

#[tokio::test]
async fn all_sentinel_equals_no_filter() {
    let db = seeded_db().await;

    let mut explicit = Where::new();
    if let Some(status) = filter_value(Some("all")) {
        explicit.eq("status", status);
    }
    let absent = Where::new();

    let (a, a_total) = run_list(&db, &explicit, Page::clamp(None, None)).await;
    let (b, b_total) = run_list(&db, &absent, Page::clamp(None, None)).await;
    assert_eq!(a_total, b_total);
    assert_eq!(a.len(), b.len());
}

#[tokio::test]
async fn newest_first_ordering() {
    let db = seeded_db().await;
    let (items, _) = run_list(&db, &Where::new(), Page::clamp(Some(1), Some(3))).await;
    let emails: Vec<_> = items.iter().map(|r| r.text("email").unwrap().to_string()).collect();
    // row i was created i minutes ago, so user0 is newest
    assert_eq!(emails, vec!["user0@example.com", "user1@example.com", "user2@example.com"]);
}

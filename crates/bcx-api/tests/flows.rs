//! End-to-end checks for the soft-delete cascade and the OTP reset flow,
//! run against an in-memory database.

use bcx_api::auth::{hash_password, verify_password};
use bcx_api::error::ApiError;
use bcx_api::password_reset::{consume_reset, find_valid_reset};
use bcx_api::users::soft_delete_user;
use bcx_db::{Db, Param, migrations};
use chrono::{Duration, Utc};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

async fn db_with_user(email: &str) -> Db {
    let db = Db::open_in_memory().unwrap();
    migrations::run(&db).await;
    db.run(
        "INSERT INTO users (id, email, password_hash, name, role) VALUES (?, ?, ?, 'Test', 'donor')",
        &[
            Param::Text("11111111-1111-1111-1111-111111111111".into()),
            Param::Text(email.into()),
            Param::Text(hash_password("original-pass").unwrap()),
        ],
    )
    .await
    .unwrap();
    db
}

async fn insert_reset(db: &Db, email: &str, code: &str, minutes_from_now: i64) {
    let expires_at = (Utc::now() + Duration::minutes(minutes_from_now))
        .naive_utc()
        .format(TIME_FORMAT)
        .to_string();
    db.run(
        "INSERT INTO password_resets (email, code, expires_at, used) VALUES (?, ?, ?, 0)",
        &[
            Param::Text(email.into()),
            Param::Text(code.into()),
            Param::Text(expires_at),
        ],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn deleting_a_user_hides_their_items() {
    let db = db_with_user("donor@example.com").await;
    let uid = "11111111-1111-1111-1111-111111111111";

    for (item, status) in [("i1", "available"), ("i2", "reserved")] {
        db.run(
            "INSERT INTO food_items (id, owner_id, title, status) VALUES (?, ?, 'Rice', ?)",
            &[Param::Text(item.into()), Param::Text(uid.into()), Param::Text(status.into())],
        )
        .await
        .unwrap();
    }
    // An unrelated owner's item must stay untouched.
    db.run(
        "INSERT INTO users (id, email, password_hash, name) VALUES ('other', 'o@x.com', 'x', 'O')",
        &[],
    )
    .await
    .unwrap();
    db.run(
        "INSERT INTO food_items (id, owner_id, title, status) VALUES ('i3', 'other', 'Soup', 'available')",
        &[],
    )
    .await
    .unwrap();

    soft_delete_user(&db, uid).await.unwrap();

    let user = db
        .get("SELECT status FROM users WHERE id = ?", &[Param::Text(uid.into())])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.text("status"), Some("deleted"));

    let hidden = db
        .get(
            "SELECT COUNT(*) AS c FROM food_items WHERE owner_id = ? AND status = 'hidden'",
            &[Param::Text(uid.into())],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hidden.int("c"), Some(2));

    let other = db
        .get("SELECT status FROM food_items WHERE id = 'i3'", &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(other.text("status"), Some("available"));
}

#[tokio::test]
async fn otp_verifies_then_consumes_exactly_once() {
    let db = db_with_user("a@b.com").await;
    insert_reset(&db, "a@b.com", "123456", 10).await;

    // Check-only verification leaves the row unused.
    find_valid_reset(&db, "a@b.com", "123456").await.unwrap();
    find_valid_reset(&db, "a@b.com", "123456").await.unwrap();

    let new_hash = hash_password("brand-new-pass").unwrap();
    consume_reset(&db, "a@b.com", "123456", &new_hash).await.unwrap();

    let user = db
        .get("SELECT password_hash FROM users WHERE email = 'a@b.com'", &[])
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("brand-new-pass", user.text("password_hash").unwrap()));

    // Second consumption fails: the code is burned.
    let err = consume_reset(&db, "a@b.com", "123456", &new_hash)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Invalid OTP"));
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let db = db_with_user("a@b.com").await;
    insert_reset(&db, "a@b.com", "654321", -11).await;

    let err = find_valid_reset(&db, "a@b.com", "654321").await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(msg) if msg == "OTP expired"));
}

#[tokio::test]
async fn wrong_code_is_rejected() {
    let db = db_with_user("a@b.com").await;
    insert_reset(&db, "a@b.com", "123456", 10).await;

    let err = find_valid_reset(&db, "a@b.com", "999999").await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Invalid OTP"));
}

#[tokio::test]
async fn latest_code_wins_for_duplicate_emails() {
    let db = db_with_user("a@b.com").await;
    insert_reset(&db, "a@b.com", "111111", 10).await;
    insert_reset(&db, "a@b.com", "222222", 10).await;

    // Both codes resolve (lookup is by email+code) and consuming the
    // newer one does not burn the older.
    find_valid_reset(&db, "a@b.com", "111111").await.unwrap();
    let hash = hash_password("whatever-pass").unwrap();
    consume_reset(&db, "a@b.com", "222222", &hash).await.unwrap();
    find_valid_reset(&db, "a@b.com", "111111").await.unwrap();
}

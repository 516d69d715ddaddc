//! Demo data for local development: `bcx seed`. Safe to run repeatedly;
//! every row is looked up before it is inserted.

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use bcx_api::auth::hash_password;
use bcx_db::{Db, Param};

pub async fn run(db: &Db) -> Result<()> {
    let _admin = upsert_user(db, "admin@bua.com", "Admin", "admin", "admin123").await?;
    let donor = upsert_user(db, "donor@bua.com", "Chị Lan", "donor", "donor123").await?;
    let _recv = upsert_user(db, "receiver@bua.com", "Anh Minh", "receiver", "recv123").await?;

    seed_item(
        db,
        "item-demo-001",
        &donor,
        "Cơm chay thập cẩm",
        "Suất cơm chay, bảo quản mát",
        20,
        "suất",
        12,
        "P.5, Q.5, TP.HCM",
        (10.755, 106.665),
        &["chay", "an-toan"],
    )
    .await?;
    seed_item(
        db,
        "item-demo-002",
        &donor,
        "Bánh mì không lactose",
        "Phù hợp người dị ứng sữa",
        15,
        "ổ",
        24,
        "P.4, Q.10, TP.HCM",
        (10.766, 106.664),
        &["khong-lactose"],
    )
    .await?;

    info!("Seeded: admin@bua.com/admin123 | donor@bua.com/donor123 | receiver@bua.com/recv123");
    Ok(())
}

/// Existing account wins: the demo passwords never overwrite a real one.
async fn upsert_user(db: &Db, email: &str, name: &str, role: &str, password: &str) -> Result<String> {
    if let Some(row) = db
        .get("SELECT id FROM users WHERE email = ?", &[Param::Text(email.into())])
        .await?
    {
        return Ok(row.text("id").unwrap_or_default().to_string());
    }

    let id = Uuid::new_v4().to_string();
    let hash = hash_password(password)?;
    db.run(
        "INSERT INTO users (id, email, password_hash, name, role) VALUES (?, ?, ?, ?, ?)",
        &[
            Param::Text(id.clone()),
            Param::Text(email.into()),
            Param::Text(hash),
            Param::Text(name.into()),
            Param::Text(role.into()),
        ],
    )
    .await?;
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
async fn seed_item(
    db: &Db,
    id: &str,
    owner_id: &str,
    title: &str,
    description: &str,
    quantity: i64,
    unit: &str,
    hours_until_expiry: i64,
    location_addr: &str,
    (lat, lng): (f64, f64),
    tags: &[&str],
) -> Result<()> {
    if db
        .get("SELECT id FROM food_items WHERE id = ?", &[Param::Text(id.into())])
        .await?
        .is_some()
    {
        return Ok(());
    }

    let expires_at = (Utc::now() + Duration::hours(hours_until_expiry))
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    db.run(
        "INSERT INTO food_items
         (id, owner_id, title, description, quantity, unit, expires_at, location_addr, lat, lng, tags, images)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]')",
        &[
            Param::Text(id.into()),
            Param::Text(owner_id.into()),
            Param::Text(title.into()),
            Param::Text(description.into()),
            Param::Int(quantity),
            Param::Text(unit.into()),
            Param::Text(expires_at),
            Param::Text(location_addr.into()),
            Param::Float(lat),
            Param::Float(lng),
            Param::Text(serde_json::to_string(tags).unwrap_or_else(|_| "[]".into())),
        ],
    )
    .await?;
    Ok(())
}

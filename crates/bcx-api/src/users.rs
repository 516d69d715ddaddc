use axum::extract::{ConnectInfo, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;

use bcx_db::{Db, Param, Set};
use bcx_types::api::UpdateProfileRequest;
use bcx_types::models::Claims;

use crate::auth::{USER_COLUMNS, fetch_user};
use crate::error::ApiError;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .route("/history", get(history))
        .route("/export", get(export))
        .route("/delete", post(delete_account))
        .route("/sessions", get(sessions))
        .route("/logout-others", post(logout_others))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::require_auth,
        ))
        .with_state(state)
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    let row = fetch_user(&state.db, &claims.id.to_string())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(row.into_json()))
}

async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut set = Set::new();
    if let Some(name) = req.name {
        set.set("name", name);
    }
    if let Some(address) = req.address {
        set.set("address", address);
    }
    if let Some(avatar_url) = req.avatar_url {
        set.set("avatar_url", avatar_url);
    }
    if let Some(phone) = req.phone {
        set.set("phone", phone);
    }
    if let Some(lat) = req.lat {
        set.set("lat", lat);
    }
    if let Some(lng) = req.lng {
        set.set("lng", lng);
    }

    let uid = claims.id.to_string();
    if !set.is_empty() {
        let sql = format!("UPDATE users {} WHERE id = ?", set.clause());
        state
            .db
            .run(&sql, &set.params_with([Param::Text(uid.clone())]))
            .await?;
    }

    let row = fetch_user(&state.db, &uid).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(row.into_json()))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
}

async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(8).clamp(1, 50);
    let uid = Param::Text(claims.id.to_string());

    let given = state
        .db
        .all(
            "SELECT id, title AS name, created_at FROM food_items
             WHERE owner_id = ? ORDER BY created_at DESC LIMIT ?",
            &[uid.clone(), Param::Int(limit)],
        )
        .await?;

    let received = state
        .db
        .all(
            "SELECT b.id, COALESCE(fi.title, 'Bundle') AS name, b.created_at
             FROM bookings b
             LEFT JOIN food_items fi ON fi.id = b.item_id
             WHERE b.receiver_id = ?
             ORDER BY b.created_at DESC
             LIMIT ?",
            &[uid.clone(), Param::Int(limit)],
        )
        .await?;

    let payments = state
        .db
        .all(
            "SELECT id, amount, status, created_at FROM payments
             WHERE payer_id = ? ORDER BY created_at DESC LIMIT ?",
            &[uid, Param::Int(limit)],
        )
        .await?;

    Ok(Json(json!({
        "given": rows_json(given),
        "received": rows_json(received),
        "payments": rows_json(payments),
    })))
}

/// Everything we store about the caller, as a downloadable attachment.
async fn export(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.id.to_string();
    let uid_param = Param::Text(uid.clone());

    let user = state
        .db
        .get(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            &[uid_param.clone()],
        )
        .await?
        .map(|r| r.into_json())
        .unwrap_or(Value::Null);

    let items = state
        .db
        .all("SELECT * FROM food_items WHERE owner_id = ?", &[uid_param.clone()])
        .await?;
    let bookings = state
        .db
        .all("SELECT * FROM bookings WHERE receiver_id = ?", &[uid_param.clone()])
        .await?;
    let payments = state
        .db
        .all("SELECT * FROM payments WHERE payer_id = ?", &[uid_param.clone()])
        .await?;
    let notifications = state
        .db
        .all("SELECT * FROM notifications WHERE user_id = ?", &[uid_param.clone()])
        .await?;
    let reports = state
        .db
        .all("SELECT * FROM reports WHERE reporter_id = ?", &[uid_param])
        .await?;

    let payload = json!({
        "exported_at": Utc::now().to_rfc3339(),
        "user": user,
        "items": rows_json(items),
        "bookings": rows_json(bookings),
        "payments": rows_json(payments),
        "notifications": rows_json(notifications),
        "reports": rows_json(reports),
    });

    let disposition = format!("attachment; filename=\"bua-com-xanh-{uid}.json\"");
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(payload)))
}

async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    soft_delete_user(&state.db, &claims.id.to_string()).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Soft delete: the user row is kept with `status='deleted'` and, in the
/// same logical operation, every item they own goes `status='hidden'`.
pub async fn soft_delete_user(db: &Db, user_id: &str) -> anyhow::Result<()> {
    db.run(
        "UPDATE users SET status = 'deleted' WHERE id = ?",
        &[Param::Text(user_id.to_string())],
    )
    .await?;
    db.run(
        "UPDATE food_items SET status = 'hidden' WHERE owner_id = ?",
        &[Param::Text(user_id.to_string())],
    )
    .await?;
    Ok(())
}

/// Single-session deployment: the UI still renders a session list, so we
/// return the current device only.
async fn sessions(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: axum::http::HeaderMap,
) -> Json<Value> {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| addr.ip().to_string());

    Json(json!([{
        "id": "current",
        "device": "This device",
        "ip": ip,
        "last_seen": Utc::now().to_rfc3339(),
        "current": true,
    }]))
}

async fn logout_others() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub(crate) fn rows_json(rows: Vec<bcx_db::Row>) -> Value {
    Value::Array(rows.into_iter().map(|r| r.into_json()).collect())
}

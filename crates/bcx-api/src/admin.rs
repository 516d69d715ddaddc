//! Admin area: moderation, CRUD and settings, all behind the admin gate.
//! Every mutation appends an audit row; audit failures never fail the
//! request that caused them.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router, middleware};
use chrono::Duration;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;
use uuid::Uuid;

use bcx_db::{Db, DbKind, Page, Param, Row, Set, Where, filter_value, text_value};
use bcx_types::api::{
    AdminFoodPatch, AdminPaymentPatch, AdminUserPatch, AnnouncementCreate, AnnouncementPatch,
    BulkFailure, BulkResponse, BulkUserRequest, CreateCampaignRequest, ImpersonateRequest,
    ListResponse, UpdateCampaignRequest,
};
use bcx_types::models::Claims;

use crate::error::ApiError;
use crate::middleware::{require_admin, require_auth};
use crate::users::soft_delete_user;
use crate::{AppState, audit, auth};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/users/{id}", axum::routing::patch(patch_user).delete(delete_user))
        .route("/users/{id}/lock", post(lock_user))
        .route("/users/{id}/unlock", post(unlock_user))
        .route("/users/bulk", post(bulk_users))
        .route("/foods", get(list_foods))
        .route("/foods/{id}", axum::routing::patch(patch_food).delete(hide_food))
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route(
            "/campaigns/{id}",
            axum::routing::patch(patch_campaign).delete(archive_campaign),
        )
        .route("/payments", get(list_payments))
        .route("/payments/{id}", axum::routing::patch(patch_payment))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/announcements", get(list_announcements).post(create_announcement))
        .route(
            "/announcements/{id}",
            axum::routing::patch(patch_announcement).delete(delete_announcement),
        )
        .route("/impersonate", post(impersonate))
        // require_auth (added last) runs first, then the admin gate.
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AdminListParams {
    q: Option<String>,
    role: Option<String>,
    status: Option<String>,
    owner: Option<String>,
    payer: Option<String>,
    page: Option<i64>,
    #[serde(rename = "pageSize")]
    page_size: Option<i64>,
}

// -- Dashboard --

async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users_total = state
        .db
        .get("SELECT COUNT(*) AS c FROM users", &[])
        .await?
        .and_then(|r| r.int("c"))
        .unwrap_or(0);
    let users_by_role = state
        .db
        .all("SELECT role, COUNT(*) AS c FROM users GROUP BY role", &[])
        .await?;

    // The remaining aggregates are best-effort: a missing table on a fresh
    // deployment must not blank the whole dashboard.
    let items_by_status = try_all(
        &state.db,
        "SELECT status, COUNT(*) AS c FROM food_items GROUP BY status",
    )
    .await;
    let campaigns_total = try_all(&state.db, "SELECT COUNT(*) AS c FROM campaigns")
        .await
        .first()
        .and_then(|r| r.int("c"))
        .unwrap_or(0);
    let payments_agg = try_all(
        &state.db,
        "SELECT status, COUNT(*) AS c, CAST(COALESCE(SUM(amount), 0) AS SIGNED) AS sum_amount
         FROM payments GROUP BY status",
    )
    .await;

    Ok(Json(json!({
        "users": { "total": users_total, "byRole": rows_json(users_by_role) },
        "foods": { "byStatus": rows_json(items_by_status) },
        "campaigns": { "total": campaigns_total },
        "payments": rows_json(payments_agg),
    })))
}

// -- Users --

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = Where::new();
    if let Some(q) = text_value(params.q.as_deref()) {
        filter.like_any(&["email", "name"], q);
    }
    if let Some(role) = filter_value(params.role.as_deref()) {
        filter.eq("role", role);
    }
    if let Some(status) = filter_value(params.status.as_deref()) {
        filter.eq("status", status);
    }

    let page = Page::clamp(params.page, params.page_size);
    let sql = format!(
        "SELECT id, email, name, avatar_url, role, address, phone, status, created_at \
         FROM users {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        filter.clause()
    );
    let rows = state
        .db
        .all(
            &sql,
            &filter.params_with([Param::Int(page.size), Param::Int(page.offset())]),
        )
        .await?;
    let total = state.db.count("users", &filter).await?;

    Ok(Json(ListResponse {
        items: rows.into_iter().map(|r| r.into_json()).collect(),
        total,
        page: page.page,
        page_size: page.size,
    }))
}

async fn patch_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<AdminUserPatch>,
) -> Result<Json<Value>, ApiError> {
    let mut set = Set::new();
    if let Some(name) = &req.name {
        set.set("name", name.clone());
    }
    if let Some(role) = &req.role {
        set.set("role", role.clone());
    }
    if let Some(status) = &req.status {
        set.set("status", status.clone());
    }
    if set.is_empty() {
        return Ok(Json(json!({ "ok": true })));
    }

    let sql = format!("UPDATE users {} WHERE id = ?", set.clause());
    state
        .db
        .run(&sql, &set.params_with([Param::Text(id.clone())]))
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.update_user",
        Some(&id),
        &json!({ "name": req.name, "role": req.role, "status": req.status }),
    )
    .await;

    let row = auth::fetch_user(&state.db, &id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(row.into_json()))
}

async fn lock_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    set_user_status(&state.db, &id, "locked").await?;
    audit::log(&state.db, claims.id, "admin.lock_user", Some(&id), &json!({})).await;
    Ok(Json(json!({ "ok": true })))
}

async fn unlock_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    set_user_status(&state.db, &id, "active").await?;
    audit::log(&state.db, claims.id, "admin.unlock_user", Some(&id), &json!({})).await;
    Ok(Json(json!({ "ok": true })))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    soft_delete_user(&state.db, &id).await?;
    audit::log(&state.db, claims.id, "admin.delete_user", Some(&id), &json!({})).await;
    Ok(Json(json!({ "ok": true })))
}

/// One action over many ids. Partial failures are surfaced per-id instead of
/// being discarded.
async fn bulk_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BulkUserRequest>,
) -> Result<Json<BulkResponse>, ApiError> {
    if !matches!(req.action.as_str(), "lock" | "unlock" | "delete") {
        return Err(ApiError::BadRequest("Unknown bulk action".into()));
    }

    let mut done = 0usize;
    let mut failed = Vec::new();
    for id in &req.ids {
        let result = match req.action.as_str() {
            "lock" => set_user_status(&state.db, id, "locked").await,
            "unlock" => set_user_status(&state.db, id, "active").await,
            _ => soft_delete_user(&state.db, id).await.map_err(Into::into),
        };
        match result {
            Ok(()) => done += 1,
            Err(e) => failed.push(BulkFailure {
                id: id.clone(),
                error: e.to_string(),
            }),
        }
    }

    audit::log(
        &state.db,
        claims.id,
        "admin.bulk_users",
        None,
        &json!({
            "action": req.action,
            "done": done,
            "failed": failed.iter().map(|f| f.id.clone()).collect::<Vec<_>>(),
        }),
    )
    .await;

    Ok(Json(BulkResponse {
        ok: failed.is_empty(),
        done,
        failed,
    }))
}

async fn set_user_status(db: &Db, id: &str, status: &str) -> Result<(), ApiError> {
    db.run(
        "UPDATE users SET status = ? WHERE id = ?",
        &[Param::Text(status.to_string()), Param::Text(id.to_string())],
    )
    .await?;
    Ok(())
}

// -- Foods moderation --

async fn list_foods(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = Where::new();
    if let Some(status) = filter_value(params.status.as_deref()) {
        filter.eq("status", status);
    }
    if let Some(owner) = filter_value(params.owner.as_deref()) {
        filter.eq("owner_id", owner);
    }
    if let Some(q) = text_value(params.q.as_deref()) {
        filter.like_any(&["title", "description"], q);
    }

    let page = Page::clamp(params.page, params.page_size);
    let sql = format!(
        "SELECT id, title, owner_id, status, quantity, expires_at, created_at \
         FROM food_items {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        filter.clause()
    );
    let rows = state
        .db
        .all(
            &sql,
            &filter.params_with([Param::Int(page.size), Param::Int(page.offset())]),
        )
        .await?;
    let total = state.db.count("food_items", &filter).await?;

    Ok(Json(ListResponse {
        items: rows.into_iter().map(|r| r.into_json()).collect(),
        total,
        page: page.page,
        page_size: page.size,
    }))
}

async fn patch_food(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<AdminFoodPatch>,
) -> Result<Json<Value>, ApiError> {
    let mut set = Set::new();
    if let Some(status) = &req.status {
        set.set("status", status.clone());
    }
    if let Some(title) = &req.title {
        set.set("title", title.clone());
    }
    if let Some(description) = &req.description {
        set.set("description", description.clone());
    }
    if let Some(quantity) = req.quantity {
        set.set("quantity", quantity);
    }
    if let Some(expires_at) = &req.expires_at {
        set.set("expires_at", expires_at.clone());
    }
    if set.is_empty() {
        return Ok(Json(json!({ "ok": true })));
    }

    let sql = format!("UPDATE food_items {} WHERE id = ?", set.clause());
    state
        .db
        .run(&sql, &set.params_with([Param::Text(id.clone())]))
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.update_food",
        Some(&id),
        &json!({ "status": req.status, "title": req.title }),
    )
    .await;

    let row = state
        .db
        .get(
            "SELECT id, title, status, owner_id, quantity, expires_at FROM food_items WHERE id = ?",
            &[Param::Text(id)],
        )
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(row.into_json()))
}

async fn hide_food(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run(
            "UPDATE food_items SET status = 'hidden' WHERE id = ?",
            &[Param::Text(id.clone())],
        )
        .await?;
    audit::log(&state.db, claims.id, "admin.hide_food", Some(&id), &json!({})).await;
    Ok(Json(json!({ "ok": true })))
}

// -- Campaigns --

async fn list_campaigns(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = Where::new();
    if let Some(q) = text_value(params.q.as_deref()) {
        filter.like_any(&["title", "description"], q);
    }
    if let Some(status) = filter_value(params.status.as_deref()) {
        filter.eq("status", status);
    }

    let page = Page::clamp(params.page, params.page_size);
    let sql = format!(
        "SELECT id, title, description, location, goal, raised, supporters, cover, status, created_at \
         FROM campaigns {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        filter.clause()
    );
    let rows = state
        .db
        .all(
            &sql,
            &filter.params_with([Param::Int(page.size), Param::Int(page.offset())]),
        )
        .await?;
    let total = state.db.count("campaigns", &filter).await?;

    Ok(Json(ListResponse {
        items: rows.into_iter().map(|r| r.into_json()).collect(),
        total,
        page: page.page,
        page_size: page.size,
    }))
}

async fn create_campaign(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<Json<Value>, ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Missing title".into()));
    }

    let id = Uuid::new_v4().to_string();
    state
        .db
        .run(
            "INSERT INTO campaigns
             (id, title, description, location, goal, raised, supporters, tags, cover, status)
             VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?, ?)",
            &[
                Param::Text(id.clone()),
                Param::Text(title.clone()),
                req.description.into(),
                Param::Text(req.location.unwrap_or_default()),
                Param::Int(req.goal.unwrap_or(0)),
                Param::Text(serde_json::to_string(&req.tags).unwrap_or_else(|_| "[]".into())),
                Param::Text(req.cover.unwrap_or_default()),
                Param::Text(req.status.unwrap_or_else(|| "draft".into())),
            ],
        )
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.create_campaign",
        Some(&id),
        &json!({ "title": title }),
    )
    .await;

    Ok(Json(json!({ "ok": true, "id": id })))
}

async fn patch_campaign(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut set = Set::new();
    if let Some(title) = &req.title {
        set.set("title", title.clone());
    }
    if let Some(description) = &req.description {
        set.set("description", description.clone());
    }
    if let Some(location) = &req.location {
        set.set("location", location.clone());
    }
    if let Some(goal) = req.goal {
        set.set("goal", goal);
    }
    if let Some(raised) = req.raised {
        set.set("raised", raised);
    }
    if let Some(supporters) = req.supporters {
        set.set("supporters", supporters);
    }
    if let Some(tags) = &req.tags {
        set.set("tags", serde_json::to_string(tags).unwrap_or_else(|_| "[]".into()));
    }
    if let Some(cover) = &req.cover {
        set.set("cover", cover.clone());
    }
    if let Some(status) = &req.status {
        set.set("status", status.clone());
    }
    if set.is_empty() {
        return Ok(Json(json!({ "ok": true })));
    }

    set.set_expr("updated_at", state.db.now_expr());
    let sql = format!("UPDATE campaigns {} WHERE id = ?", set.clause());
    state
        .db
        .run(&sql, &set.params_with([Param::Text(id.clone())]))
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.update_campaign",
        Some(&id),
        &json!({ "title": req.title, "status": req.status }),
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}

async fn archive_campaign(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run(
            "UPDATE campaigns SET status = 'archived' WHERE id = ?",
            &[Param::Text(id.clone())],
        )
        .await?;
    audit::log(&state.db, claims.id, "admin.archive_campaign", Some(&id), &json!({})).await;
    Ok(Json(json!({ "ok": true })))
}

// -- Payments --

async fn list_payments(
    State(state): State<AppState>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = Where::new();
    if let Some(status) = filter_value(params.status.as_deref()) {
        filter.eq("status", status);
    }
    if let Some(payer) = filter_value(params.payer.as_deref()) {
        filter.eq("payer_id", payer);
    }

    let page = Page::clamp(params.page, params.page_size);
    let sql = format!(
        "SELECT id, payer_id, amount, status, created_at \
         FROM payments {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        filter.clause()
    );
    let rows = state
        .db
        .all(
            &sql,
            &filter.params_with([Param::Int(page.size), Param::Int(page.offset())]),
        )
        .await?;
    let total = state.db.count("payments", &filter).await?;

    Ok(Json(ListResponse {
        items: rows.into_iter().map(|r| r.into_json()).collect(),
        total,
        page: page.page,
        page_size: page.size,
    }))
}

async fn patch_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<AdminPaymentPatch>,
) -> Result<Json<Value>, ApiError> {
    let status = req
        .status
        .ok_or_else(|| ApiError::BadRequest("Missing status".into()))?;

    let sql = format!(
        "UPDATE payments SET status = ?, updated_at = {} WHERE id = ?",
        state.db.now_expr()
    );
    state
        .db
        .run(&sql, &[Param::Text(status.clone()), Param::Text(id.clone())])
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.update_payment",
        Some(&id),
        &json!({ "status": status }),
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}

// -- Site settings --

async fn get_settings(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = try_all(&state.db, "SELECT k, v FROM site_settings").await;
    let mut data = Map::new();
    for row in rows {
        if let Some(k) = row.text("k") {
            data.insert(
                k.to_string(),
                row.get("v").cloned().unwrap_or(Value::Null),
            );
        }
    }
    Ok(Json(Value::Object(data)))
}

async fn put_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let keys: Vec<String> = body.keys().cloned().collect();
    for (k, v) in body {
        let text = match v {
            Value::String(s) => s,
            other => other.to_string(),
        };
        upsert_setting(&state.db, &k, &text).await?;
    }

    audit::log(
        &state.db,
        claims.id,
        "admin.update_settings",
        None,
        &json!({ "keys": keys }),
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}

async fn upsert_setting(db: &Db, key: &str, value: &str) -> Result<(), ApiError> {
    match db.kind() {
        DbKind::MySql => {
            db.run(
                "INSERT INTO site_settings (k, v, updated_at) VALUES (?, ?, NOW())
                 ON DUPLICATE KEY UPDATE v = VALUES(v), updated_at = NOW()",
                &[Param::Text(key.to_string()), Param::Text(value.to_string())],
            )
            .await?;
        }
        DbKind::Sqlite => {
            let exists = db
                .get(
                    "SELECT k FROM site_settings WHERE k = ?",
                    &[Param::Text(key.to_string())],
                )
                .await?
                .is_some();
            let sql = if exists {
                "UPDATE site_settings SET v = ?, updated_at = datetime('now') WHERE k = ?"
            } else {
                "INSERT INTO site_settings (v, updated_at, k) VALUES (?, datetime('now'), ?)"
            };
            db.run(
                sql,
                &[Param::Text(value.to_string()), Param::Text(key.to_string())],
            )
            .await?;
        }
    }
    Ok(())
}

// -- Announcements --

async fn list_announcements(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = state
        .db
        .all(
            "SELECT id, title, content, level, active, created_at, updated_at \
             FROM announcements ORDER BY id DESC",
            &[],
        )
        .await?;
    Ok(Json(rows_json(rows)))
}

async fn create_announcement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AnnouncementCreate>,
) -> Result<Json<Value>, ApiError> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing title or content".into()));
    }

    let result = state
        .db
        .run(
            "INSERT INTO announcements (title, content, level, active) VALUES (?, ?, ?, ?)",
            &[
                Param::Text(req.title.clone()),
                Param::Text(req.content),
                Param::Text(req.level.unwrap_or_else(|| "info".into())),
                Param::Int(req.active.unwrap_or(true) as i64),
            ],
        )
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.create_announcement",
        result.last_insert_id.map(|id| id.to_string()).as_deref(),
        &json!({ "title": req.title }),
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}

async fn patch_announcement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<AnnouncementPatch>,
) -> Result<Json<Value>, ApiError> {
    let mut set = Set::new();
    if let Some(title) = &req.title {
        set.set("title", title.clone());
    }
    if let Some(content) = &req.content {
        set.set("content", content.clone());
    }
    if let Some(level) = &req.level {
        set.set("level", level.clone());
    }
    if let Some(active) = req.active {
        set.set("active", active as i64);
    }
    if set.is_empty() {
        return Ok(Json(json!({ "ok": true })));
    }

    set.set_expr("updated_at", state.db.now_expr());
    let sql = format!("UPDATE announcements {} WHERE id = ?", set.clause());
    state
        .db
        .run(&sql, &set.params_with([Param::Int(id)]))
        .await?;

    audit::log(
        &state.db,
        claims.id,
        "admin.update_announcement",
        Some(&id.to_string()),
        &json!({ "title": req.title, "active": req.active }),
    )
    .await;

    Ok(Json(json!({ "ok": true })))
}

/// The one true hard DELETE in the system.
async fn delete_announcement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .run("DELETE FROM announcements WHERE id = ?", &[Param::Int(id)])
        .await?;
    audit::log(
        &state.db,
        claims.id,
        "admin.delete_announcement",
        Some(&id.to_string()),
        &json!({}),
    )
    .await;
    Ok(Json(json!({ "ok": true })))
}

// -- Impersonation --

async fn impersonate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ImpersonateRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.user_id.is_empty() {
        return Err(ApiError::BadRequest("Missing user_id".into()));
    }

    let user = state
        .db
        .get(
            "SELECT id, email, name, role FROM users WHERE id = ?",
            &[Param::Text(req.user_id.clone())],
        )
        .await?
        .ok_or(ApiError::NotFound)?;

    let user_id: Uuid = user
        .text("id")
        .and_then(|id| id.parse().ok())
        .ok_or(ApiError::Internal)?;
    let email = user.text("email").unwrap_or_default().to_string();
    let role = user.text("role").unwrap_or("user").to_string();

    let token = auth::sign_claims(
        &state.jwt_secret,
        user_id,
        &email,
        &role,
        Duration::minutes(10),
        Some(claims.id),
    )?;

    audit::log(
        &state.db,
        claims.id,
        "admin.impersonate",
        Some(&req.user_id),
        &json!({ "as": email }),
    )
    .await;

    Ok(Json(json!({ "token": token, "user": user.into_json() })))
}

// -- Helpers --

async fn try_all(db: &Db, sql: &str) -> Vec<Row> {
    match db.all(sql, &[]).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("best-effort admin query failed: {e:#}");
            Vec::new()
        }
    }
}

fn rows_json(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(|r| r.into_json()).collect())
}

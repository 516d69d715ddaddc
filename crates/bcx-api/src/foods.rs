use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use bcx_db::{Page, Param, Row, Set, Where, filter_value, text_value};
use bcx_types::api::{CreateFoodRequest, ListResponse, UpdateFoodRequest};
use bcx_types::models::{Claims, Role};

use crate::error::ApiError;
use crate::middleware::{ensure_role, require_auth};
use crate::AppState;

const FOOD_COLUMNS: &str = "id, owner_id, title, description, quantity, unit, expires_at, \
                            location_addr, lat, lng, tags, images, status, visibility, created_at";

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(list))
        .route("/{id}", get(detail));

    let protected = Router::new()
        .route("/", post(create))
        .route("/{id}", axum::routing::patch(update).delete(remove))
        .route("/{id}/book", post(book))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).with_state(state)
}

#[derive(Debug, Deserialize)]
struct FoodListParams {
    q: Option<String>,
    status: Option<String>,
    owner: Option<String>,
    page: Option<i64>,
    #[serde(rename = "pageSize")]
    page_size: Option<i64>,
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<FoodListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = Where::new();
    filter.eq("visibility", "public");
    if let Some(q) = text_value(params.q.as_deref()) {
        filter.like_any(&["title", "description"], q);
    }
    match filter_value(params.status.as_deref()) {
        Some(status) => {
            filter.eq("status", status);
        }
        // Hidden is the moderation/soft-delete sentinel; those rows never
        // surface in the public list.
        None => {
            filter.push("status != 'hidden'", []);
        }
    }
    if let Some(owner) = filter_value(params.owner.as_deref()) {
        filter.eq("owner_id", owner);
    }

    let page = Page::clamp(params.page, params.page_size);
    let sql = format!(
        "SELECT {FOOD_COLUMNS} FROM food_items {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
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
        items: rows.into_iter().map(with_parsed_media).collect(),
        total,
        page: page.page,
        page_size: page.size,
    }))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let row = fetch_item(&state, &id).await?;
    if row.text("status") == Some("hidden") {
        return Err(ApiError::NotFound);
    }
    Ok(Json(with_parsed_media(row)))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateFoodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_role(&claims, &[Role::Donor])?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Missing title".into()));
    }

    let id = Uuid::new_v4().to_string();
    state
        .db
        .run(
            "INSERT INTO food_items
             (id, owner_id, title, description, quantity, unit, expires_at, location_addr, lat, lng, tags, images)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            &[
                Param::Text(id.clone()),
                Param::Text(claims.id.to_string()),
                Param::Text(title.to_string()),
                req.description.into(),
                Param::Int(req.quantity.unwrap_or(0)),
                req.unit.into(),
                req.expires_at.into(),
                req.location_addr.into(),
                req.lat.into(),
                req.lng.into(),
                Param::Text(serde_json::to_string(&req.tags).unwrap_or_else(|_| "[]".into())),
                Param::Text(serde_json::to_string(&req.images).unwrap_or_else(|_| "[]".into())),
            ],
        )
        .await?;

    let row = fetch_item(&state, &id).await?;
    Ok((StatusCode::CREATED, Json(with_parsed_media(row))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFoodRequest>,
) -> Result<Json<Value>, ApiError> {
    ensure_owner_or_admin(&state, &claims, &id).await?;

    let mut set = Set::new();
    if let Some(title) = req.title {
        set.set("title", title);
    }
    if let Some(description) = req.description {
        set.set("description", description);
    }
    if let Some(quantity) = req.quantity {
        set.set("quantity", quantity);
    }
    if let Some(unit) = req.unit {
        set.set("unit", unit);
    }
    if let Some(expires_at) = req.expires_at {
        set.set("expires_at", expires_at);
    }
    if let Some(location_addr) = req.location_addr {
        set.set("location_addr", location_addr);
    }
    if let Some(lat) = req.lat {
        set.set("lat", lat);
    }
    if let Some(lng) = req.lng {
        set.set("lng", lng);
    }
    if let Some(tags) = req.tags {
        set.set("tags", serde_json::to_string(&tags).unwrap_or_else(|_| "[]".into()));
    }
    if let Some(images) = req.images {
        set.set("images", serde_json::to_string(&images).unwrap_or_else(|_| "[]".into()));
    }
    if let Some(status) = req.status {
        set.set("status", status);
    }
    if let Some(visibility) = req.visibility {
        set.set("visibility", visibility);
    }

    if !set.is_empty() {
        set.set_expr("updated_at", state.db.now_expr());
        let sql = format!("UPDATE food_items {} WHERE id = ?", set.clause());
        state
            .db
            .run(&sql, &set.params_with([Param::Text(id.clone())]))
            .await?;
    }

    let row = fetch_item(&state, &id).await?;
    Ok(Json(with_parsed_media(row)))
}

/// Soft cancel; the row survives for history views.
async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure_owner_or_admin(&state, &claims, &id).await?;

    state
        .db
        .run(
            "UPDATE food_items SET status = 'cancelled' WHERE id = ?",
            &[Param::Text(id)],
        )
        .await?;

    Ok(Json(json!({ "ok": true })))
}

async fn book(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_item(&state, &id).await?;
    if row.text("status") != Some("available") || row.text("visibility") != Some("public") {
        return Err(ApiError::Conflict("Item is not available".into()));
    }

    let booking_id = Uuid::new_v4().to_string();
    state
        .db
        .run(
            "INSERT INTO bookings (id, item_id, receiver_id) VALUES (?, ?, ?)",
            &[
                Param::Text(booking_id.clone()),
                Param::Text(id.clone()),
                Param::Text(claims.id.to_string()),
            ],
        )
        .await?;

    // Status guard repeated in the WHERE: a concurrent booking loses here
    // rather than double-reserving.
    state
        .db
        .run(
            "UPDATE food_items SET status = 'reserved' WHERE id = ? AND status = 'available'",
            &[Param::Text(id)],
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "booking_id": booking_id })),
    ))
}

async fn fetch_item(state: &AppState, id: &str) -> Result<Row, ApiError> {
    state
        .db
        .get(
            &format!("SELECT {FOOD_COLUMNS} FROM food_items WHERE id = ?"),
            &[Param::Text(id.to_string())],
        )
        .await?
        .ok_or(ApiError::NotFound)
}

async fn ensure_owner_or_admin(
    state: &AppState,
    claims: &Claims,
    item_id: &str,
) -> Result<(), ApiError> {
    let row = fetch_item(state, item_id).await?;
    let is_owner = row.text("owner_id") == Some(claims.id.to_string().as_str());
    if is_owner || claims.has_role(&[Role::Admin]) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

fn with_parsed_media(mut row: Row) -> Value {
    row.parse_json_array("tags");
    row.parse_json_array("images");
    row.into_json()
}

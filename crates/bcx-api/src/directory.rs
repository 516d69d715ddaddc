//! Public directory lists: donors, recipients, shippers. One handler, three
//! mounts; the only difference is the role each mount pins.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use bcx_db::{Page, Param, Where, text_value};
use bcx_types::api::ListResponse;
use bcx_types::models::Role;

use crate::error::ApiError;
use crate::AppState;

pub fn router(state: AppState, role: Role) -> Router {
    Router::new()
        .route(
            "/",
            get(move |state: State<AppState>, params: Query<DirectoryParams>| {
                list_by_role(state, params, role)
            }),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct DirectoryParams {
    q: Option<String>,
    page: Option<i64>,
    #[serde(rename = "pageSize")]
    page_size: Option<i64>,
}

async fn list_by_role(
    State(state): State<AppState>,
    Query(params): Query<DirectoryParams>,
    role: Role,
) -> Result<Json<ListResponse>, ApiError> {
    let mut filter = Where::new();
    filter.eq("role", role.as_str());
    filter.eq("status", "active");
    if let Some(q) = text_value(params.q.as_deref()) {
        filter.like_any(&["name", "email"], q);
    }

    let page = Page::clamp(params.page, params.page_size);
    let sql = format!(
        "SELECT id, name, email, avatar_url, address, status FROM users {} \
         ORDER BY created_at DESC LIMIT ? OFFSET ?",
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

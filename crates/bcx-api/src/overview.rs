use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use bcx_db::{Db, Param};

use crate::error::ApiError;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(counts)).with_state(state)
}

async fn counts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = count(&state.db, "SELECT COUNT(*) AS c FROM users", &[]).await?;
    let donors = count_role(&state.db, "donor").await?;
    let recipients = count_role(&state.db, "receiver").await?;
    let shippers = count_role(&state.db, "shipper").await?;
    let campaigns = count(&state.db, "SELECT COUNT(*) AS c FROM campaigns", &[]).await?;

    Ok(Json(json!({
        "users": users,
        "donors": donors,
        "recipients": recipients,
        "shippers": shippers,
        "campaigns": campaigns,
    })))
}

async fn count_role(db: &Db, role: &str) -> Result<i64, ApiError> {
    count(
        db,
        "SELECT COUNT(*) AS c FROM users WHERE role = ?",
        &[Param::Text(role.to_string())],
    )
    .await
}

async fn count(db: &Db, sql: &str, params: &[Param]) -> Result<i64, ApiError> {
    let row = db.get(sql, params).await?;
    Ok(row.and_then(|r| r.int("c")).unwrap_or(0))
}

use bcx_db::{Db, Param};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Append an audit row for an administrative action. Best-effort: a failed
/// write is logged and never fails the request that triggered it.
pub async fn log(db: &Db, actor_id: Uuid, action: &str, target_id: Option<&str>, detail: &Value) {
    let detail_text = match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let result = db
        .run(
            "INSERT INTO audit_logs (actor_id, action, target_id, detail) VALUES (?, ?, ?, ?)",
            &[
                Param::Text(actor_id.to_string()),
                Param::Text(action.to_string()),
                target_id.map(|t| t.to_string()).into(),
                Param::Text(detail_text),
            ],
        )
        .await;

    if let Err(e) = result {
        warn!("audit log write failed for {action}: {e:#}");
    }
}

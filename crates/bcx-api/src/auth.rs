use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::post};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use bcx_db::{Db, Param, Row};
use bcx_types::api::{AuthResponse, LoginRequest, RegisterRequest};
use bcx_types::models::{Claims, Role};

use crate::error::ApiError;
use crate::{AppState, password_reset};

const TOKEN_TTL_DAYS: i64 = 7;

/// Columns safe to hand back to clients.
pub const USER_COLUMNS: &str =
    "id, email, name, avatar_url, role, address, phone, status, lat, lng, created_at";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(password_reset::forgot_password))
        .route("/verify-otp", post(password_reset::verify_otp))
        .route("/reset-password", post(password_reset::reset_password))
        .with_state(state)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_ascii_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Missing name".into()));
    }

    // Self-service signup can pick any role except admin.
    let role = match req.role.as_deref() {
        None | Some("") => Role::User,
        Some(raw) => match Role::parse(raw) {
            Some(Role::Admin) | None => {
                return Err(ApiError::BadRequest("Invalid role".into()));
            }
            Some(role) => role,
        },
    };

    if state
        .db
        .get("SELECT id FROM users WHERE email = ?", &[Param::Text(email.clone())])
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let user_id = Uuid::new_v4();
    let password_hash = hash_password(&req.password)?;

    state
        .db
        .run(
            "INSERT INTO users (id, email, password_hash, name, role) VALUES (?, ?, ?, ?, ?)",
            &[
                Param::Text(user_id.to_string()),
                Param::Text(email.clone()),
                Param::Text(password_hash),
                Param::Text(name.to_string()),
                Param::Text(role.as_str().to_string()),
            ],
        )
        .await?;

    let user = fetch_user(&state.db, &user_id.to_string())
        .await?
        .ok_or(ApiError::Internal)?;
    let token = create_token(&state.jwt_secret, user_id, &email, role.as_str())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into_json(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.trim().to_ascii_lowercase();

    let row = state
        .db
        .get(
            "SELECT id, email, role, status, password_hash FROM users WHERE email = ?",
            &[Param::Text(email.clone())],
        )
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let hash = row.text("password_hash").unwrap_or_default();
    if !verify_password(&req.password, hash) {
        return Err(ApiError::Unauthorized);
    }

    // Banned, locked and soft-deleted accounts keep their rows but may not
    // sign in.
    if row.text("status") != Some("active") {
        return Err(ApiError::Forbidden);
    }

    let user_id: Uuid = row
        .text("id")
        .and_then(|id| id.parse().ok())
        .ok_or(ApiError::Internal)?;
    let role = row.text("role").unwrap_or("user").to_string();

    let token = create_token(&state.jwt_secret, user_id, &email, &role)?;
    let user = fetch_user(&state.db, &user_id.to_string())
        .await?
        .ok_or(ApiError::Internal)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into_json(),
    }))
}

pub async fn fetch_user(db: &Db, id: &str) -> anyhow::Result<Option<Row>> {
    db.get(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
        &[Param::Text(id.to_string())],
    )
    .await
}

pub fn create_token(secret: &str, id: Uuid, email: &str, role: &str) -> Result<String, ApiError> {
    sign_claims(secret, id, email, role, Duration::days(TOKEN_TTL_DAYS), None)
}

/// Sign a token with an explicit lifetime; `imp_by` marks impersonation
/// tokens with the acting admin's id.
pub fn sign_claims(
    secret: &str,
    id: Uuid,
    email: &str,
    role: &str,
    ttl: Duration,
    imp_by: Option<Uuid>,
) -> Result<String, ApiError> {
    let claims = Claims {
        id,
        email: email.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + ttl).timestamp() as usize,
        imp_by,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| ApiError::Internal)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| ApiError::Internal)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong pony", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trips_claims() {
        let id = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let token = sign_claims("s3cret", id, "a@b.com", "donor", Duration::minutes(10), Some(admin))
            .unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"s3cret"),
            &Validation::default(),
        )
        .unwrap()
        .claims;

        assert_eq!(decoded.id, id);
        assert_eq!(decoded.email, "a@b.com");
        assert_eq!(decoded.role, "donor");
        assert_eq!(decoded.imp_by, Some(admin));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = sign_claims(
            "s3cret",
            Uuid::new_v4(),
            "a@b.com",
            "user",
            Duration::seconds(-120),
            None,
        )
        .unwrap();

        assert!(
            decode::<Claims>(
                &token,
                &DecodingKey::from_secret(b"s3cret"),
                &Validation::default(),
            )
            .is_err()
        );
    }
}

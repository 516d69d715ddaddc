use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, Validation, decode};

use bcx_types::models::{Claims, Role};

use crate::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer token, attaching [`Claims`] to the
/// request. Login and register live on the public router and never pass
/// through here.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Router-level gate for `/api/admin/*`. Runs after `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(ApiError::Unauthorized)?;
    ensure_role(claims, &[Role::Admin])?;
    Ok(next.run(req).await)
}

/// Role gate for individual handlers. The admin super-role always passes.
pub fn ensure_role(claims: &Claims, allowed: &[Role]) -> Result<(), ApiError> {
    if claims.has_role(allowed) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(role: &str) -> Claims {
        Claims {
            id: Uuid::new_v4(),
            email: "t@example.com".into(),
            role: role.into(),
            exp: 0,
            imp_by: None,
        }
    }

    #[test]
    fn admin_bypasses_role_gates() {
        assert!(ensure_role(&claims("admin"), &[Role::Donor]).is_ok());
    }

    #[test]
    fn wrong_role_is_forbidden() {
        assert!(matches!(
            ensure_role(&claims("receiver"), &[Role::Donor]),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            ensure_role(&claims("ghost"), &[Role::Donor]),
            Err(ApiError::Forbidden)
        ));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login; `user` is the profile row with the
/// password hash stripped.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Value,
}

// -- Password reset --

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

// -- Lists --

/// Envelope shared by every paginated list endpoint.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<Value>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

// -- Foods --

#[derive(Debug, Deserialize)]
pub struct CreateFoodRequest {
    pub title: String,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub expires_at: Option<String>,
    pub location_addr: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFoodRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub expires_at: Option<String>,
    pub location_addr: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub status: Option<String>,
    pub visibility: Option<String>,
}

// -- Campaigns --

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub goal: Option<i64>,
    pub raised: Option<i64>,
    pub supporters: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub goal: Option<i64>,
    pub raised: Option<i64>,
    pub supporters: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub cover: Option<String>,
    pub status: Option<String>,
}

// -- Admin --

#[derive(Debug, Deserialize)]
pub struct AdminUserPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminFoodPatch {
    pub status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminPaymentPatch {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementCreate {
    pub title: String,
    pub content: String,
    pub level: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub level: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkUserRequest {
    pub action: String,
    pub ids: Vec<String>,
}

/// Bulk actions surface partial failures instead of discarding them.
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub ok: bool,
    pub done: usize,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    pub mimetype: String,
}

pub mod admin;
pub mod audit;
pub mod auth;
pub mod campaigns;
pub mod directory;
pub mod error;
pub mod foods;
pub mod mailer;
pub mod middleware;
pub mod overview;
pub mod password_reset;
pub mod upload;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use bcx_db::Db;

use crate::mailer::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Db,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub mailer: Mailer,
}

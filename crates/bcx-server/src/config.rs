//! Startup configuration, collected from the environment exactly once and
//! passed down explicitly; no module reads env vars at call time.

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use bcx_api::mailer::SmtpConfig;
use bcx_db::DbConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub db: DbConfig,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = env::var("BCX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env::var("BCX_PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()?;

        let cors_origins = env::var("CORS_ORIGIN")
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        let jwt_secret =
            env::var("BCX_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());

        let upload_dir: PathBuf = env::var("BCX_UPLOAD_DIR")
            .unwrap_or_else(|_| "./uploads".into())
            .into();

        // One-time driver selection; never revisited after startup.
        let db = if env::var("DB_DRIVER").as_deref() == Ok("mysql") {
            let url = env::var("DATABASE_URL").unwrap_or_else(|_| {
                let host = env::var("MYSQL_HOST").unwrap_or_else(|_| "127.0.0.1".into());
                let port = env::var("MYSQL_PORT").unwrap_or_else(|_| "3306".into());
                let user = env::var("MYSQL_USER").unwrap_or_else(|_| "root".into());
                let password = env::var("MYSQL_PASSWORD").unwrap_or_default();
                let database =
                    env::var("MYSQL_DATABASE").unwrap_or_else(|_| "bua_com_xanh".into());
                format!("mysql://{user}:{password}@{host}:{port}/{database}")
            });
            let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10);
            DbConfig::MySql {
                url,
                max_connections,
            }
        } else {
            DbConfig::Sqlite {
                path: env::var("BCX_DB_PATH")
                    .unwrap_or_else(|_| "bua-com-xanh.db".into())
                    .into(),
            }
        };

        let smtp = env::var("SMTP_HOST").ok().map(|smtp_host| {
            let user = env::var("SMTP_USER").unwrap_or_default();
            SmtpConfig {
                host: smtp_host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(465),
                pass: env::var("SMTP_PASS").unwrap_or_default(),
                from: env::var("EMAIL_FROM").unwrap_or_else(|_| user.clone()),
                user,
            }
        });

        Ok(Config {
            host,
            port,
            cors_origins,
            jwt_secret,
            upload_dir,
            db,
            smtp,
        })
    }
}

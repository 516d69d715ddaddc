//! Best-effort schema bootstrap, run once at startup.
//!
//! Not transactional; assumes a single writer during startup. A failed
//! statement is logged as a warning and never aborts the process.

use tracing::{info, warn};

use crate::{Db, DbKind};

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name          TEXT NOT NULL,
        phone         TEXT,
        avatar_url    TEXT,
        role          TEXT NOT NULL DEFAULT 'user',
        address       TEXT,
        lat           REAL,
        lng           REAL,
        status        TEXT NOT NULL DEFAULT 'active',
        created_at    TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at    TEXT
    )",
    "CREATE TABLE IF NOT EXISTS password_resets (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        email       TEXT NOT NULL,
        code        TEXT NOT NULL,
        expires_at  TEXT NOT NULL,
        used        INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_password_resets_email ON password_resets(email)",
    "CREATE TABLE IF NOT EXISTS campaigns (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        location    TEXT,
        goal        INTEGER NOT NULL DEFAULT 0,
        raised      INTEGER NOT NULL DEFAULT 0,
        supporters  INTEGER NOT NULL DEFAULT 0,
        tags        TEXT,
        cover       TEXT,
        status      TEXT NOT NULL DEFAULT 'active',
        created_at  TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at  TEXT
    )",
    "CREATE TABLE IF NOT EXISTS food_items (
        id            TEXT PRIMARY KEY,
        owner_id      TEXT NOT NULL REFERENCES users(id),
        title         TEXT NOT NULL,
        description   TEXT,
        quantity      INTEGER NOT NULL DEFAULT 0,
        unit          TEXT,
        expires_at    TEXT,
        location_addr TEXT,
        lat           REAL,
        lng           REAL,
        tags          TEXT,
        images        TEXT,
        status        TEXT NOT NULL DEFAULT 'available',
        visibility    TEXT NOT NULL DEFAULT 'public',
        created_at    TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at    TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_food_items_owner ON food_items(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_food_items_status ON food_items(status)",
    "CREATE TABLE IF NOT EXISTS bookings (
        id          TEXT PRIMARY KEY,
        item_id     TEXT NOT NULL REFERENCES food_items(id),
        receiver_id TEXT NOT NULL REFERENCES users(id),
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS payments (
        id         TEXT PRIMARY KEY,
        payer_id   TEXT NOT NULL,
        amount     INTEGER NOT NULL DEFAULT 0,
        status     TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id    TEXT NOT NULL,
        title      TEXT,
        body       TEXT,
        read       INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS reports (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        reporter_id    TEXT,
        target_user_id TEXT,
        target_item_id TEXT,
        reason         TEXT,
        status         TEXT NOT NULL DEFAULT 'open',
        notes          TEXT,
        created_at     TEXT NOT NULL DEFAULT (datetime('now')),
        resolved_at    TEXT
    )",
    "CREATE TABLE IF NOT EXISTS audit_logs (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        actor_id   TEXT,
        action     TEXT,
        target_id  TEXT,
        detail     TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS site_settings (
        k          TEXT PRIMARY KEY,
        v          TEXT,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE IF NOT EXISTS announcements (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        title      TEXT NOT NULL,
        content    TEXT NOT NULL,
        level      TEXT NOT NULL DEFAULT 'info',
        active     INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT
    )",
];

const MYSQL_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            CHAR(36) PRIMARY KEY,
        email         VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        name          VARCHAR(255) NOT NULL,
        phone         VARCHAR(30),
        avatar_url    VARCHAR(500),
        role          ENUM('user','donor','receiver','shipper','admin') NOT NULL DEFAULT 'user',
        address       VARCHAR(255),
        lat           DOUBLE NULL,
        lng           DOUBLE NULL,
        status        ENUM('active','banned','locked','deleted') NOT NULL DEFAULT 'active',
        created_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at    TIMESTAMP NULL ON UPDATE CURRENT_TIMESTAMP
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS password_resets (
        id         INT AUTO_INCREMENT PRIMARY KEY,
        email      VARCHAR(255) NOT NULL,
        code       VARCHAR(10) NOT NULL,
        expires_at DATETIME NOT NULL,
        used       TINYINT(1) NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX idx_email (email)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS campaigns (
        id          CHAR(36) PRIMARY KEY,
        title       VARCHAR(255) NOT NULL,
        description TEXT,
        location    VARCHAR(255),
        goal        INT NOT NULL DEFAULT 0,
        raised      INT NOT NULL DEFAULT 0,
        supporters  INT NOT NULL DEFAULT 0,
        tags        TEXT,
        cover       VARCHAR(500),
        status      ENUM('active','closed','draft','archived') NOT NULL DEFAULT 'active',
        created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at  TIMESTAMP NULL ON UPDATE CURRENT_TIMESTAMP
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS food_items (
        id            CHAR(36) PRIMARY KEY,
        owner_id      CHAR(36) NOT NULL,
        title         VARCHAR(255) NOT NULL,
        description   TEXT,
        quantity      INT NOT NULL DEFAULT 0,
        unit          VARCHAR(20),
        expires_at    DATETIME NULL,
        location_addr VARCHAR(255),
        lat           DOUBLE NULL,
        lng           DOUBLE NULL,
        tags          TEXT,
        images        TEXT,
        status        ENUM('available','reserved','done','cancelled','hidden') NOT NULL DEFAULT 'available',
        visibility    ENUM('public','private') NOT NULL DEFAULT 'public',
        created_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at    TIMESTAMP NULL ON UPDATE CURRENT_TIMESTAMP,
        INDEX idx_owner (owner_id),
        INDEX idx_status (status)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS bookings (
        id          CHAR(36) PRIMARY KEY,
        item_id     CHAR(36) NOT NULL,
        receiver_id CHAR(36) NOT NULL,
        created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX idx_receiver (receiver_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS payments (
        id         CHAR(36) PRIMARY KEY,
        payer_id   CHAR(36) NOT NULL,
        amount     INT NOT NULL DEFAULT 0,
        status     VARCHAR(24) NOT NULL DEFAULT 'pending',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NULL,
        INDEX idx_payer (payer_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS notifications (
        id         INT AUTO_INCREMENT PRIMARY KEY,
        user_id    CHAR(36) NOT NULL,
        title      VARCHAR(255),
        body       TEXT,
        `read`     TINYINT(1) NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX idx_user (user_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS reports (
        id             INT AUTO_INCREMENT PRIMARY KEY,
        reporter_id    VARCHAR(64),
        target_user_id VARCHAR(64),
        target_item_id VARCHAR(64),
        reason         TEXT,
        status         VARCHAR(24) NOT NULL DEFAULT 'open',
        notes          TEXT,
        created_at     DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        resolved_at    DATETIME NULL,
        INDEX idx_status (status)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS audit_logs (
        id         INT AUTO_INCREMENT PRIMARY KEY,
        actor_id   VARCHAR(64),
        action     VARCHAR(64),
        target_id  VARCHAR(64),
        detail     TEXT,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX idx_action (action),
        INDEX idx_actor (actor_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS site_settings (
        k          VARCHAR(128) PRIMARY KEY,
        v          TEXT,
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
    "CREATE TABLE IF NOT EXISTS announcements (
        id         INT AUTO_INCREMENT PRIMARY KEY,
        title      VARCHAR(255) NOT NULL,
        content    TEXT NOT NULL,
        level      VARCHAR(16) NOT NULL DEFAULT 'info',
        active     TINYINT(1) NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NULL
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
];

pub async fn run(db: &Db) {
    let statements = match db.kind() {
        DbKind::Sqlite => SQLITE_SCHEMA,
        DbKind::MySql => MYSQL_SCHEMA,
    };

    for sql in statements {
        if let Err(e) = db.run(sql, &[]).await {
            warn!("schema bootstrap statement failed: {e:#}");
        }
    }

    ensure_address_column(db).await;
    info!("Schema bootstrap complete");
}

/// Legacy column guard: databases created before `users.address` existed get
/// the column added. Existence is checked through the engine's catalog so the
/// ALTER only runs when needed; a lost race to "column already exists" is
/// swallowed.
async fn ensure_address_column(db: &Db) {
    let has_column = match db.kind() {
        DbKind::Sqlite => db
            .all("PRAGMA table_info(users)", &[])
            .await
            .map(|cols| cols.iter().any(|c| c.text("name") == Some("address"))),
        DbKind::MySql => db
            .get(
                "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS
                 WHERE TABLE_SCHEMA = DATABASE()
                   AND TABLE_NAME = 'users'
                   AND COLUMN_NAME = 'address'",
                &[],
            )
            .await
            .map(|row| row.is_some()),
    };

    match has_column {
        Ok(true) => {}
        Ok(false) => {
            let alter = match db.kind() {
                DbKind::Sqlite => "ALTER TABLE users ADD COLUMN address TEXT",
                DbKind::MySql => "ALTER TABLE users ADD COLUMN address VARCHAR(255) NULL AFTER role",
            };
            match db.run(alter, &[]).await {
                Ok(_) => info!("users.address column added"),
                Err(e) if is_duplicate_column(&e) => {}
                Err(e) => warn!("ensure_address_column warning: {e:#}"),
            }
        }
        Err(e) => warn!("ensure_address_column introspection failed: {e:#}"),
    }
}

fn is_duplicate_column(e: &anyhow::Error) -> bool {
    let msg = e.to_string().to_ascii_lowercase();
    msg.contains("duplicate column")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let db = Db::open_in_memory().unwrap();
        run(&db).await;
        run(&db).await;

        let row = db
            .get("SELECT COUNT(*) AS total FROM users", &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.int("total"), Some(0));
    }

    #[tokio::test]
    async fn address_column_survives_bootstrap() {
        let db = Db::open_in_memory().unwrap();
        run(&db).await;
        let cols = db.all("PRAGMA table_info(users)", &[]).await.unwrap();
        assert!(cols.iter().any(|c| c.text("name") == Some("address")));
    }
}

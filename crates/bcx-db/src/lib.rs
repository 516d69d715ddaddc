//! Dual-driver database layer.
//!
//! One capability set (`get` for the first row or none, `all`, `run`) over two
//! SQL engines: synchronous rusqlite and an async sqlx MySQL pool. The
//! driver is chosen once at startup from [`DbConfig`] and never revisited;
//! call sites see a single async surface with positional `?` placeholders.
//! SQL errors propagate to the caller; no retry, no backoff beyond the
//! pool's defaults.

pub mod migrations;
pub mod mysql;
pub mod query;
pub mod sqlite;
pub mod value;

pub use query::{Page, Set, Where, filter_value, text_value};
pub use value::{Param, Row, RunResult};

use std::path::PathBuf;

use anyhow::Result;

/// Startup-time driver selection.
#[derive(Debug, Clone)]
pub enum DbConfig {
    Sqlite { path: PathBuf },
    MySql { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    MySql,
}

#[derive(Clone)]
pub enum Db {
    Sqlite(sqlite::SqliteDb),
    MySql(mysql::MySqlDb),
}

impl Db {
    pub async fn connect(config: &DbConfig) -> Result<Db> {
        match config {
            DbConfig::Sqlite { path } => Ok(Db::Sqlite(sqlite::SqliteDb::open(path)?)),
            DbConfig::MySql { url, max_connections } => Ok(Db::MySql(
                mysql::MySqlDb::connect(url, *max_connections).await?,
            )),
        }
    }

    /// In-memory SQLite instance for tests.
    pub fn open_in_memory() -> Result<Db> {
        Ok(Db::Sqlite(sqlite::SqliteDb::open_in_memory()?))
    }

    pub fn kind(&self) -> DbKind {
        match self {
            Db::Sqlite(_) => DbKind::Sqlite,
            Db::MySql(_) => DbKind::MySql,
        }
    }

    /// Current-timestamp expression in the active dialect.
    pub fn now_expr(&self) -> &'static str {
        match self.kind() {
            DbKind::Sqlite => "datetime('now')",
            DbKind::MySql => "NOW()",
        }
    }

    /// First row or `None`.
    pub async fn get(&self, sql: &str, params: &[Param]) -> Result<Option<Row>> {
        match self {
            Db::Sqlite(db) => db.get(sql, params).await,
            Db::MySql(db) => db.get(sql, params).await,
        }
    }

    /// All rows.
    pub async fn all(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>> {
        match self {
            Db::Sqlite(db) => db.all(sql, params).await,
            Db::MySql(db) => db.all(sql, params).await,
        }
    }

    /// Execute, returning write metadata.
    pub async fn run(&self, sql: &str, params: &[Param]) -> Result<RunResult> {
        match self {
            Db::Sqlite(db) => db.run(sql, params).await,
            Db::MySql(db) => db.run(sql, params).await,
        }
    }

    /// COUNT sharing the exact predicate set of a list query.
    pub async fn count(&self, table: &str, filter: &Where) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) AS total FROM {table} {}", filter.clause());
        let row = self.get(&sql, &filter.params()).await?;
        Ok(row.and_then(|r| r.int("total")).unwrap_or(0))
    }
}

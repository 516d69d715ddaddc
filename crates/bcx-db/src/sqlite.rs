use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value};
use tracing::info;

use crate::value::{Param, Row, RunResult};

/// Synchronous driver. The connection lives behind a mutex and every call
/// hops to the blocking pool, so the async surface matches the MySQL side.
#[derive(Clone)]
pub struct SqliteDb {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        info!("SQLite database opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    pub async fn get(&self, sql: &str, params: &[Param]) -> Result<Option<Row>> {
        let this = self.clone();
        let sql = sql.to_string();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || {
            Ok(this.all_sync(&sql, &params)?.into_iter().next())
        })
        .await?
    }

    pub async fn all(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>> {
        let this = self.clone();
        let sql = sql.to_string();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || this.all_sync(&sql, &params)).await?
    }

    pub async fn run(&self, sql: &str, params: &[Param]) -> Result<RunResult> {
        let this = self.clone();
        let sql = sql.to_string();
        let params = params.to_vec();
        tokio::task::spawn_blocking(move || this.run_sync(&sql, &params)).await?
    }

    fn all_sync(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Vec<String> =
                stmt.column_names().iter().map(|c| c.to_string()).collect();

            let mut rows = stmt.query(rusqlite::params_from_iter(params.iter().map(bind_value)))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut map = Map::new();
                for (i, name) in columns.iter().enumerate() {
                    map.insert(name.clone(), column_to_json(row.get_ref(i)?));
                }
                out.push(Row(map));
            }
            Ok(out)
        })
    }

    fn run_sync(&self, sql: &str, params: &[Param]) -> Result<RunResult> {
        self.with_conn(|conn| {
            let affected =
                conn.execute(sql, rusqlite::params_from_iter(params.iter().map(bind_value)))?;
            Ok(RunResult {
                rows_affected: affected as u64,
                last_insert_id: Some(conn.last_insert_rowid()),
            })
        })
    }
}

fn bind_value(param: &Param) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match param {
        Param::Null => Sql::Null,
        Param::Int(i) => Sql::Integer(*i),
        Param::Float(f) => Sql::Real(*f),
        Param::Text(s) => Sql::Text(s.clone()),
        Param::Bool(b) => Sql::Integer(*b as i64),
    }
}

fn column_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(B64.encode(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_basic_types() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.run("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL, flag INTEGER)", &[])
            .await
            .unwrap();

        let res = db
            .run(
                "INSERT INTO t (name, score, flag) VALUES (?, ?, ?)",
                &[Param::Text("an".into()), Param::Float(0.5), Param::Bool(true)],
            )
            .await
            .unwrap();
        assert_eq!(res.rows_affected, 1);
        assert_eq!(res.last_insert_id, Some(1));

        let row = db
            .get("SELECT name, score, flag FROM t WHERE id = ?", &[Param::Int(1)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.text("name"), Some("an"));
        assert_eq!(row.float("score"), Some(0.5));
        assert_eq!(row.int("flag"), Some(1));
    }

    #[tokio::test]
    async fn get_returns_none_for_no_rows() {
        let db = SqliteDb::open_in_memory().unwrap();
        db.run("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[]).await.unwrap();
        assert!(db.get("SELECT * FROM t", &[]).await.unwrap().is_none());
    }
}

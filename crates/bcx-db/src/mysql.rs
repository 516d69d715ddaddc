use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row as _, TypeInfo, ValueRef as _};
use tracing::info;

use crate::value::{Param, Row, RunResult};

/// Asynchronous driver over a sqlx connection pool.
#[derive(Clone)]
pub struct MySqlDb {
    pool: MySqlPool,
}

impl MySqlDb {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!("MySQL pool connected ({} connections max)", max_connections);
        Ok(Self { pool })
    }

    pub async fn get(&self, sql: &str, params: &[Param]) -> Result<Option<Row>> {
        let row = bind_all(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_map(&r)).transpose()
    }

    pub async fn all(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>> {
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_map).collect()
    }

    pub async fn run(&self, sql: &str, params: &[Param]) -> Result<RunResult> {
        let result = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await?;
        Ok(RunResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id() as i64),
        })
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [Param],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            Param::Null => query.bind(None::<String>),
            Param::Int(i) => query.bind(*i),
            Param::Float(f) => query.bind(*f),
            Param::Text(s) => query.bind(s.as_str()),
            Param::Bool(b) => query.bind(*b),
        };
    }
    query
}

/// Decode every column of a row into JSON by its declared MySQL type.
/// Temporal values are rendered in the same `YYYY-MM-DD HH:MM:SS` shape the
/// SQLite driver stores, so callers never see a dialect difference.
fn row_to_map(row: &MySqlRow) -> Result<Row> {
    let mut map = Map::new();
    for column in row.columns() {
        let i = column.ordinal();
        let value = if row.try_get_raw(i)?.is_null() {
            Value::Null
        } else {
            match column.type_info().name() {
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                    Value::Number(row.try_get::<i64, _>(i)?.into())
                }
                "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED"
                | "INT UNSIGNED" | "BIGINT UNSIGNED" => {
                    Value::Number(row.try_get::<u64, _>(i)?.into())
                }
                "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(i)?),
                "FLOAT" => float_json(row.try_get::<f32, _>(i)? as f64),
                "DOUBLE" => float_json(row.try_get::<f64, _>(i)?),
                "DATETIME" => Value::String(
                    row.try_get::<NaiveDateTime, _>(i)?
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                ),
                "TIMESTAMP" => Value::String(
                    row.try_get::<DateTime<Utc>, _>(i)?
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                ),
                "DATE" => Value::String(
                    row.try_get::<NaiveDate, _>(i)?.format("%Y-%m-%d").to_string(),
                ),
                // VARCHAR/CHAR/TEXT/ENUM, plus DECIMAL (transmitted as text)
                _ => fallback_json(row, i),
            }
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(Row(map))
}

/// Last-resort decode chain for types with no dedicated arm.
fn fallback_json(row: &MySqlRow, i: usize) -> Value {
    if let Ok(s) = row.try_get::<String, _>(i) {
        return Value::String(s);
    }
    if let Ok(n) = row.try_get::<i64, _>(i) {
        return Value::Number(n.into());
    }
    if let Ok(f) = row.try_get::<f64, _>(i) {
        return float_json(f);
    }
    Value::Null
}

fn float_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

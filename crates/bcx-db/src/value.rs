use serde_json::{Map, Value};

/// Positional bind value accepted by both drivers.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(v as i64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Param::Null,
        }
    }
}

/// One result row as a column → JSON value map. Rows flow straight into
/// JSON responses, so the dynamic representation is the natural one here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Map<String, Value>);

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.0.get(column).and_then(Value::as_i64)
    }

    pub fn float(&self, column: &str) -> Option<f64> {
        self.0.get(column).and_then(Value::as_f64)
    }

    pub fn insert(&mut self, column: &str, value: Value) {
        self.0.insert(column.to_string(), value);
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    /// Replace a serialized-text column with its parsed JSON value. Rows
    /// written before a schema change, or with malformed data, fall back to
    /// an empty array.
    pub fn parse_json_array(&mut self, column: &str) {
        let parsed = self
            .text(column)
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .filter(Value::is_array)
            .unwrap_or_else(|| Value::Array(Vec::new()));
        self.0.insert(column.to_string(), parsed);
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }
}

/// Driver-agnostic write metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Row(map)
    }

    #[test]
    fn json_column_parses_arrays() {
        let mut r = row(&[("tags", json!("[\"rice\",\"veggies\"]"))]);
        r.parse_json_array("tags");
        assert_eq!(r.get("tags"), Some(&json!(["rice", "veggies"])));
    }

    #[test]
    fn malformed_json_column_falls_back_to_empty() {
        for raw in [json!("{oops"), json!("\"scalar\""), Value::Null] {
            let mut r = row(&[("tags", raw)]);
            r.parse_json_array("tags");
            assert_eq!(r.get("tags"), Some(&json!([])));
        }
    }

    #[test]
    fn option_params_bind_null() {
        assert_eq!(Param::from(None::<i64>), Param::Null);
        assert_eq!(Param::from(Some("x")), Param::Text("x".into()));
    }
}

//! Predicate and pagination builders shared by every list endpoint.
//!
//! List handlers collect boolean predicates and a parallel parameter list,
//! then reuse the exact same set for both the page query and the COUNT
//! query, so `total` stays consistent with `items` (best-effort; the two
//! queries are not wrapped in a transaction).

use crate::value::Param;

/// AND-joined WHERE predicate list with positional parameters.
#[derive(Debug, Default)]
pub struct Where {
    clauses: Vec<String>,
    params: Vec<Param>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match predicate.
    pub fn eq(&mut self, column: &str, value: impl Into<Param>) -> &mut Self {
        self.clauses.push(format!("{column} = ?"));
        self.params.push(value.into());
        self
    }

    /// Substring search over one or more text columns, OR-grouped. LIKE is
    /// case-insensitive for ASCII on both engines' default collations.
    pub fn like_any(&mut self, columns: &[&str], needle: &str) -> &mut Self {
        if columns.is_empty() {
            return self;
        }
        let group = columns
            .iter()
            .map(|c| format!("{c} LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({group})"));
        let pattern = format!("%{needle}%");
        self.params
            .extend(std::iter::repeat_n(Param::Text(pattern), columns.len()));
        self
    }

    /// Raw predicate with its parameters, for the odd shape `eq` can't express.
    pub fn push(&mut self, clause: &str, params: impl IntoIterator<Item = Param>) -> &mut Self {
        self.clauses.push(clause.to_string());
        self.params.extend(params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `""` when no predicates were added, otherwise `"WHERE a AND b"`.
    pub fn clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<Param> {
        self.params.clone()
    }

    /// Predicate params followed by extras (LIMIT/OFFSET, usually).
    pub fn params_with(&self, extra: impl IntoIterator<Item = Param>) -> Vec<Param> {
        let mut out = self.params.clone();
        out.extend(extra);
        out
    }
}

/// Dynamic SET clause for partial updates: only fields present in the
/// request body ever reach the row.
#[derive(Debug, Default)]
pub struct Set {
    assignments: Vec<String>,
    params: Vec<Param>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl Into<Param>) -> &mut Self {
        self.assignments.push(format!("{column} = ?"));
        self.params.push(value.into());
        self
    }

    /// Assignment with a SQL expression on the right-hand side (`NOW()` etc).
    pub fn set_expr(&mut self, column: &str, expr: &str) -> &mut Self {
        self.assignments.push(format!("{column} = {expr}"));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn clause(&self) -> String {
        format!("SET {}", self.assignments.join(", "))
    }

    pub fn params_with(&self, extra: impl IntoIterator<Item = Param>) -> Vec<Param> {
        let mut out = self.params.clone();
        out.extend(extra);
        out
    }
}

/// 1-based page window. `page` is floored to 1; `size` is clamped to
/// [1, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub size: i64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 20;
    pub const MAX_SIZE: i64 = 100;

    pub fn clamp(page: Option<i64>, size: Option<i64>) -> Page {
        Self::clamp_with_default(page, size, Self::DEFAULT_SIZE)
    }

    pub fn clamp_with_default(page: Option<i64>, size: Option<i64>, default_size: i64) -> Page {
        Page {
            page: page.unwrap_or(1).max(1),
            size: size.unwrap_or(default_size).clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }
}

/// Trimmed non-empty text, or `None`.
pub fn text_value(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Dropdown filter value: empty and the literal `"all"` both mean
/// "no filter".
pub fn filter_value(v: Option<&str>) -> Option<&str> {
    text_value(v).filter(|s| !s.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_where_omits_clause() {
        let w = Where::new();
        assert_eq!(w.clause(), "");
        assert!(w.params().is_empty());
    }

    #[test]
    fn predicates_join_with_and() {
        let mut w = Where::new();
        w.like_any(&["email", "name"], "an");
        w.eq("role", "donor");
        assert_eq!(w.clause(), "WHERE (email LIKE ? OR name LIKE ?) AND role = ?");
        assert_eq!(
            w.params(),
            vec![
                Param::Text("%an%".into()),
                Param::Text("%an%".into()),
                Param::Text("donor".into()),
            ]
        );
    }

    #[test]
    fn page_clamps_to_bounds() {
        assert_eq!(Page::clamp(None, None), Page { page: 1, size: 20 });
        assert_eq!(Page::clamp(Some(0), Some(0)), Page { page: 1, size: 1 });
        assert_eq!(Page::clamp(Some(-3), Some(1000)), Page { page: 1, size: 100 });
        assert_eq!(Page::clamp(Some(2), Some(10)).offset(), 10);
    }

    #[test]
    fn all_sentinel_lifts_filter() {
        assert_eq!(filter_value(Some("all")), None);
        assert_eq!(filter_value(Some("All")), None);
        assert_eq!(filter_value(Some("  ")), None);
        assert_eq!(filter_value(Some("active")), Some("active"));
        // free-text search keeps "all" as a real needle
        assert_eq!(text_value(Some("all")), Some("all"));
    }

    #[test]
    fn set_builds_partial_updates() {
        let mut s = Set::new();
        assert!(s.is_empty());
        s.set("name", "An").set_expr("updated_at", "NOW()");
        assert_eq!(s.clause(), "SET name = ?, updated_at = NOW()");
        assert_eq!(
            s.params_with([Param::Text("u1".into())]),
            vec![Param::Text("An".into()), Param::Text("u1".into())]
        );
    }
}

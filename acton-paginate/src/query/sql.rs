//! PostgreSQL rendering
//!
//! Renders a [`Query`] as SQL text with `$n` placeholders and an ordered list
//! of bound values. Identifiers are double-quoted; every value is bound,
//! except `LIMIT`/`OFFSET` which are written as integer literals.
//!
//! Rendering goes through [`SqlSink`], so a driver's own statement builder can
//! receive the same text and bindings directly.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::query::{sql, OrderDirection, Predicate, Query};
//!
//! let query = Query::new("users")
//!     .filter(Predicate::is_null("deleted_at"))
//!     .filter(Predicate::contains("name", "bob"))
//!     .order_by("name", OrderDirection::Descending)
//!     .with_limit(10)
//!     .with_offset(10);
//!
//! let statement = sql::select(&query);
//! assert_eq!(
//!     statement.sql,
//!     r#"SELECT * FROM "users" WHERE "deleted_at" IS NULL AND "name" ILIKE $1 ORDER BY "name" DESC LIMIT 10 OFFSET 10"#
//! );
//!
//! let count = sql::count(&query);
//! assert_eq!(
//!     count.sql,
//!     r#"SELECT COUNT(*) FROM "users" WHERE "deleted_at" IS NULL AND "name" ILIKE $1"#
//! );
//! ```

use std::fmt::Write;

use super::{FilterValue, Order, Predicate, Query};

/// Receiver of rendered SQL text and bound values
pub trait SqlSink {
    /// Append raw SQL text
    fn push_sql(&mut self, sql: &str);

    /// Append a placeholder bound to the value
    fn push_param(&mut self, value: FilterValue);
}

/// A rendered statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlStatement {
    /// SQL text with `$1`, `$2`, ... placeholders
    pub sql: String,
    /// Bound values, in placeholder order
    pub params: Vec<FilterValue>,
}

impl SqlSink for SqlStatement {
    fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn push_param(&mut self, value: FilterValue) {
        self.params.push(value);
        // Writing to a String cannot fail
        let _ = write!(self.sql, "${}", self.params.len());
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape `LIKE` metacharacters so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render `SELECT *` with filter, ordering and window
pub fn select(query: &Query) -> SqlStatement {
    let mut statement = SqlStatement::default();
    statement.push_sql("SELECT * FROM ");
    statement.push_sql(&quote_ident(query.source()));
    write_where(&mut statement, query.predicates());
    write_order(&mut statement, query.order());
    write_window(&mut statement, query.limit(), query.offset());
    statement
}

/// Render `SELECT COUNT(*)` with the filter only
pub fn count(query: &Query) -> SqlStatement {
    let mut statement = SqlStatement::default();
    statement.push_sql("SELECT COUNT(*) FROM ");
    statement.push_sql(&quote_ident(query.source()));
    write_where(&mut statement, query.predicates());
    statement
}

/// Append ` WHERE a AND b ...`; nothing when there are no predicates
pub fn write_where<S: SqlSink>(sink: &mut S, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        sink.push_sql(if i == 0 { " WHERE " } else { " AND " });
        write_predicate(sink, predicate);
    }
}

/// Append ` ORDER BY ...`; nothing when there are no terms
pub fn write_order<S: SqlSink>(sink: &mut S, order: &[Order]) {
    for (i, term) in order.iter().enumerate() {
        sink.push_sql(if i == 0 { " ORDER BY " } else { ", " });
        sink.push_sql(&quote_ident(&term.field));
        sink.push_sql(" ");
        sink.push_sql(term.direction.as_sql());
    }
}

/// Append ` LIMIT n` and ` OFFSET m` when set
pub fn write_window<S: SqlSink>(sink: &mut S, limit: Option<u64>, offset: Option<u64>) {
    if let Some(limit) = limit {
        sink.push_sql(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = offset {
        sink.push_sql(&format!(" OFFSET {offset}"));
    }
}

/// Append one predicate
pub fn write_predicate<S: SqlSink>(sink: &mut S, predicate: &Predicate) {
    match predicate {
        Predicate::IsNull { field } => {
            sink.push_sql(&quote_ident(field));
            sink.push_sql(" IS NULL");
        }
        Predicate::Eq { field, value } if value.is_null() => {
            sink.push_sql(&quote_ident(field));
            sink.push_sql(" IS NULL");
        }
        Predicate::Eq { field, value } => comparison(sink, field, "=", value),
        Predicate::Gte { field, value } => comparison(sink, field, ">=", value),
        Predicate::Lte { field, value } => comparison(sink, field, "<=", value),
        Predicate::In { values, .. } if values.is_empty() => sink.push_sql("FALSE"),
        Predicate::In { field, values } => {
            sink.push_sql(&quote_ident(field));
            sink.push_sql(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    sink.push_sql(", ");
                }
                sink.push_param(value.clone());
            }
            sink.push_sql(")");
        }
        Predicate::Contains { field, term } => {
            sink.push_sql(&quote_ident(field));
            sink.push_sql(" ILIKE ");
            sink.push_param(FilterValue::String(format!("%{}%", escape_like(term))));
        }
        Predicate::Any(inner) if inner.is_empty() => sink.push_sql("FALSE"),
        Predicate::Any(inner) => {
            sink.push_sql("(");
            for (i, predicate) in inner.iter().enumerate() {
                if i > 0 {
                    sink.push_sql(" OR ");
                }
                write_predicate(sink, predicate);
            }
            sink.push_sql(")");
        }
    }
}

fn comparison<S: SqlSink>(sink: &mut S, field: &str, operator: &str, value: &FilterValue) {
    sink.push_sql(&quote_ident(field));
    sink.push_sql(" ");
    sink.push_sql(operator);
    sink.push_sql(" ");
    sink.push_param(value.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::OrderDirection;

    #[test]
    fn test_unfiltered_select() {
        let statement = select(&Query::new("users"));
        assert_eq!(statement.sql, r#"SELECT * FROM "users""#);
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_placeholders_number_in_order() {
        let query = Query::new("users")
            .filter(Predicate::any([
                Predicate::contains("name", "bob"),
                Predicate::contains("email", "bob"),
            ]))
            .filter(Predicate::gte("age", 18_i64))
            .filter(Predicate::in_list(
                "status",
                vec!["active".into(), "pending".into()],
            ));
        let statement = select(&query);
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE ("name" ILIKE $1 OR "email" ILIKE $2) AND "age" >= $3 AND "status" IN ($4, $5)"#
        );
        assert_eq!(
            statement.params,
            vec![
                FilterValue::String("%bob%".to_string()),
                FilterValue::String("%bob%".to_string()),
                FilterValue::Integer(18),
                FilterValue::String("active".to_string()),
                FilterValue::String("pending".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_membership_and_disjunction_match_nothing() {
        let query = Query::new("users")
            .filter(Predicate::in_list("status", vec![]))
            .filter(Predicate::any([]));
        assert_eq!(
            select(&query).sql,
            r#"SELECT * FROM "users" WHERE FALSE AND FALSE"#
        );
    }

    #[test]
    fn test_eq_null_renders_is_null() {
        let query = Query::new("users").filter(Predicate::eq("manager_id", FilterValue::Null));
        let statement = select(&query);
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE "manager_id" IS NULL"#
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_count_drops_order_and_window() {
        let query = Query::new("users")
            .filter(Predicate::lte("age", 65_i64))
            .order_by("name", OrderDirection::Ascending)
            .order_by("id", OrderDirection::Descending)
            .with_limit(5)
            .with_offset(15);
        assert_eq!(
            select(&query).sql,
            r#"SELECT * FROM "users" WHERE "age" <= $1 ORDER BY "name" ASC, "id" DESC LIMIT 5 OFFSET 15"#
        );
        assert_eq!(
            count(&query).sql,
            r#"SELECT COUNT(*) FROM "users" WHERE "age" <= $1"#
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
        let statement = select(&Query::new("t").filter(Predicate::contains("c", "a%")));
        assert_eq!(statement.params, vec![FilterValue::String(r"%a\%%".to_string())]);
    }
}

//! Builder for partial `UPDATE` statements.
//!
//! Handlers that accept optional fields (`PUT /profile`, `PUT /todos/{id}`) collect the
//! fields that were actually supplied and turn them into a single parameterized statement.
//! Every value, including the row filters, is bound; only column and table names are
//! spliced into the SQL text, and those are `'static` literals chosen by the caller.

use sqlx::{QueryBuilder, Sqlite};
use std::fmt;

/// A value bound to one `column = ?` assignment or filter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Bool(bool),
    Integer(i64),
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

/// Returned by [`UpdateBuilder::build`] when no field was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyUpdate;

impl fmt::Display for EmptyUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("No fields to update")
    }
}

impl std::error::Error for EmptyUpdate {}

impl From<EmptyUpdate> for crate::error::AppError {
    fn from(error: EmptyUpdate) -> Self {
        crate::error::AppError::BadRequest(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<(&'static str, SqlValue)>,
    filters: Vec<(&'static str, SqlValue)>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Adds `column = value` when `value` is present; `None` leaves the column untouched.
    pub fn set<V: Into<SqlValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.assignments.push((column, value.into()));
        }
        self
    }

    /// Adds a `column = value` condition to the `WHERE` clause.
    pub fn filter<V: Into<SqlValue>>(mut self, column: &'static str, value: V) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    /// Emits the statement, or `EmptyUpdate` if nothing was set.
    ///
    /// A builder without filters is refused the same way: an unscoped `UPDATE` would touch
    /// every row of the table.
    pub fn build(self) -> Result<QueryBuilder<'static, Sqlite>, EmptyUpdate> {
        if self.assignments.is_empty() || self.filters.is_empty() {
            return Err(EmptyUpdate);
        }

        let mut query = QueryBuilder::new(format!("UPDATE {} SET ", self.table));

        for (i, (column, value)) in self.assignments.into_iter().enumerate() {
            if i > 0 {
                query.push(", ");
            }
            query.push(column).push(" = ");
            push_value(&mut query, value);
        }

        query.push(" WHERE ");
        for (i, (column, value)) in self.filters.into_iter().enumerate() {
            if i > 0 {
                query.push(" AND ");
            }
            query.push(column).push(" = ");
            push_value(&mut query, value);
        }

        Ok(query)
    }
}

fn push_value(query: &mut QueryBuilder<'static, Sqlite>, value: SqlValue) {
    match value {
        SqlValue::Text(text) => query.push_bind(text),
        SqlValue::Bool(flag) => query.push_bind(flag),
        SqlValue::Integer(number) => query.push_bind(number),
    };
}

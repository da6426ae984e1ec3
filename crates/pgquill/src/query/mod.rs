//! The statement builders.
//!
//! Two builder types cover the supported statements:
//!
//! - [`SelectQuery`] — `SELECT` with joins, filter trees, ordering and
//!   pagination.
//! - [`InsertQuery`] — `INSERT INTO` with multi-row `VALUES`,
//!   `ON CONFLICT` and `RETURNING`.
//!
//! Both are plain immutable values: every chained call moves the builder
//! and returns an extended copy, and the structs are `Clone`, so any
//! prefix of a chain stays independently compilable. `compile()` walks the
//! clauses in fixed order and threads a single placeholder counter through
//! every sub-compiler, producing a [`Statement`].

pub mod insert;
pub mod select;

pub use insert::{ConflictAction, InsertQuery, Row};
pub use select::{JoinKind, SelectQuery};

use crate::value::Value;

/// A compiled statement: SQL text with `$1…$n` placeholders plus the
/// matching parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

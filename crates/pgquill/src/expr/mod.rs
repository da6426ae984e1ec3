//! The filter expression tree.
//!
//! Expressions are an immutable tagged union: comparisons, logical
//! combinators, JSON accessor chains and raw fragments all become [`Expr`]
//! values, so they compose freely inside `and`/`or`/`not` and compile
//! against the same placeholder counter.

pub mod json;
pub mod raw;
pub(crate) mod render;

use std::str::FromStr;

use crate::{
    error::{Error, Result},
    value::Value,
};

pub use json::{jsonb, JsonChain, JsonCond};

/// A comparison operator, stored as its SQL token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op(&'static str);

impl Op {
    pub const EQ: Op = Op("=");
    pub const NE: Op = Op("!=");
    pub const NE_ALT: Op = Op("<>");
    pub const LT: Op = Op("<");
    pub const LTE: Op = Op("<=");
    pub const GT: Op = Op(">");
    pub const GTE: Op = Op(">=");
    pub const LIKE: Op = Op("LIKE");
    pub const NOT_LIKE: Op = Op("NOT LIKE");
    pub const ILIKE: Op = Op("ILIKE");
    pub const IS: Op = Op("IS");
    pub const IS_NOT: Op = Op("IS NOT");
    pub const IN: Op = Op("IN");
    pub const NOT_IN: Op = Op("NOT IN");
    pub const SIMILAR_TO: Op = Op("SIMILAR TO");
    pub const REGEX: Op = Op("~");
    pub const NOT_REGEX: Op = Op("!~");
    pub const REGEX_CI: Op = Op("~*");
    pub const NOT_REGEX_CI: Op = Op("!~*");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl FromStr for Op {
    type Err = Error;

    /// Word operators parse case-insensitively; symbol operators must match
    /// exactly.
    fn from_str(s: &str) -> Result<Self> {
        let op = match s.trim().to_ascii_uppercase().as_str() {
            "=" => Op::EQ,
            "!=" => Op::NE,
            "<>" => Op::NE_ALT,
            "<" => Op::LT,
            "<=" => Op::LTE,
            ">" => Op::GT,
            ">=" => Op::GTE,
            "LIKE" => Op::LIKE,
            "NOT LIKE" => Op::NOT_LIKE,
            "ILIKE" => Op::ILIKE,
            "IS" => Op::IS,
            "IS NOT" => Op::IS_NOT,
            "IN" => Op::IN,
            "NOT IN" => Op::NOT_IN,
            "SIMILAR TO" => Op::SIMILAR_TO,
            "~" => Op::REGEX,
            "!~" => Op::NOT_REGEX,
            "~*" => Op::REGEX_CI,
            "!~*" => Op::NOT_REGEX_CI,
            _ => return Err(Error::UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// Logical combinator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicKind {
    And,
    Or,
    Not,
}

/// One node of a filter tree. Never mutated after construction; the
/// combinators take their children by value and the builders clone the
/// enum shell when a prefix is reused.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `column <op> $n`, or `column IS [NOT] NULL` when the value is the
    /// null marker.
    Cmp {
        column: String,
        op: Op,
        value: Value,
    },
    /// `column [NOT] IN ($n, …)`, one placeholder per element. An empty
    /// list renders `IN ()` as-is — a documented pass-through quirk, not a
    /// build error.
    InList {
        column: String,
        negated: bool,
        values: Vec<Value>,
    },
    Logic {
        kind: LogicKind,
        children: Vec<Expr>,
    },
    Json(JsonCond),
    /// A raw fragment; `segments` has one more element than `values` and
    /// the pieces interleave at render time against the shared counter.
    Raw {
        segments: Vec<String>,
        values: Vec<Value>,
    },
}

impl Expr {
    /// Builds a comparison node. `IN`/`NOT IN` with an array value become
    /// an [`Expr::InList`]; a scalar given to `IN` is treated as a
    /// single-element list.
    pub fn cmp(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Expr {
        let column = column.into();
        let value = value.into();
        if op == Op::IN || op == Op::NOT_IN {
            let values = match value {
                Value::Array(values) => values,
                value => vec![value],
            };
            return Expr::InList {
                column,
                negated: op == Op::NOT_IN,
                values,
            };
        }
        Expr::Cmp { column, op, value }
    }

    /// Calls `f` with every column token referenced by this subtree. Raw
    /// fragments are opaque and skipped.
    pub(crate) fn for_each_column(&self, f: &mut impl FnMut(&str)) {
        match self {
            Expr::Cmp { column, .. } | Expr::InList { column, .. } => f(column),
            Expr::Logic { children, .. } => {
                for child in children {
                    child.for_each_column(f);
                }
            }
            Expr::Json(cond) => f(cond.base()),
            Expr::Raw { .. } => {}
        }
    }
}

/// Builds a comparison from an operator given as text, e.g.
/// `cond("id", "in", vec![1, 2])`. Fails synchronously on an unknown
/// operator.
pub fn cond(column: impl Into<String>, op: &str, value: impl Into<Value>) -> Result<Expr> {
    let op: Op = op.parse()?;
    Ok(Expr::cmp(column, op, value))
}

/// Combines expressions with `AND`.
pub fn and(children: Vec<Expr>) -> Expr {
    Expr::Logic {
        kind: LogicKind::And,
        children,
    }
}

/// Combines expressions with `OR`.
pub fn or(children: Vec<Expr>) -> Expr {
    Expr::Logic {
        kind: LogicKind::Or,
        children,
    }
}

/// Negates an expression: renders `NOT (<child>)`.
pub fn not(child: Expr) -> Expr {
    Expr::Logic {
        kind: LogicKind::Not,
        children: vec![child],
    }
}

/// A column position in a comparison, e.g. `col("u.active")`.
pub fn col(name: impl Into<String>) -> Col {
    Col(name.into())
}

/// Comparison constructor surface for a single column.
#[derive(Debug, Clone)]
pub struct Col(String);

impl Col {
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::cmp(self.0, Op::EQ, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Expr {
        Expr::cmp(self.0, Op::NE, value)
    }

    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::cmp(self.0, Op::GT, value)
    }

    pub fn lt(self, value: impl Into<Value>) -> Expr {
        Expr::cmp(self.0, Op::LT, value)
    }

    pub fn gte(self, value: impl Into<Value>) -> Expr {
        Expr::cmp(self.0, Op::GTE, value)
    }

    pub fn lte(self, value: impl Into<Value>) -> Expr {
        Expr::cmp(self.0, Op::LTE, value)
    }

    pub fn like(self, pattern: impl Into<String>) -> Expr {
        Expr::cmp(self.0, Op::LIKE, pattern.into())
    }

    pub fn not_like(self, pattern: impl Into<String>) -> Expr {
        Expr::cmp(self.0, Op::NOT_LIKE, pattern.into())
    }

    pub fn ilike(self, pattern: impl Into<String>) -> Expr {
        Expr::cmp(self.0, Op::ILIKE, pattern.into())
    }

    pub fn similar_to(self, pattern: impl Into<String>) -> Expr {
        Expr::cmp(self.0, Op::SIMILAR_TO, pattern.into())
    }

    /// `~` regex match.
    pub fn matches(self, pattern: impl Into<String>) -> Expr {
        Expr::cmp(self.0, Op::REGEX, pattern.into())
    }

    /// `~*` case-insensitive regex match.
    pub fn imatches(self, pattern: impl Into<String>) -> Expr {
        Expr::cmp(self.0, Op::REGEX_CI, pattern.into())
    }

    pub fn in_<T, I>(self, values: I) -> Expr
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        Expr::InList {
            column: self.0,
            negated: false,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<T, I>(self, values: I) -> Expr
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        Expr::InList {
            column: self.0,
            negated: true,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `IS NULL`; consumes no placeholder.
    pub fn null(self) -> Expr {
        Expr::cmp(self.0, Op::IS, Value::Null)
    }

    /// `IS NOT NULL`; consumes no placeholder.
    pub fn not_null(self) -> Expr {
        Expr::cmp(self.0, Op::IS_NOT, Value::Null)
    }
}

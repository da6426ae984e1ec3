//! Table and column reference parsing.
//!
//! Table expressions come in as `"users"` or `"users as u"`; column
//! expressions as `"id"`, `"u.id"` or `"u.id as user_id"`. Existence of the
//! referenced objects is not checked here — that is the schema catalog's job
//! (see [`crate::schema`]), and only when a catalog is attached.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// A parsed table reference from a `FROM`/`JOIN`/`INSERT INTO` position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// Parses `"name"` or `"name as alias"` (keyword is case-insensitive).
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        match split_alias(expr) {
            Some((name, alias)) => {
                let name = name.trim();
                let alias = alias.trim();
                if name.is_empty() || alias.is_empty() || has_inner_space(name) || has_inner_space(alias) {
                    return Err(Error::MalformedTableExpr(expr.to_string()));
                }
                Ok(Self {
                    name: name.to_string(),
                    alias: Some(alias.to_string()),
                })
            }
            None => {
                if expr.is_empty() || has_inner_space(expr) {
                    return Err(Error::MalformedTableExpr(expr.to_string()));
                }
                Ok(Self {
                    name: expr.to_string(),
                    alias: None,
                })
            }
        }
    }

    /// The token that qualifies columns of this table: alias if present,
    /// else the bare name.
    pub fn identifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// The `FROM`/`JOIN` rendering. Table aliases use uppercase `AS`.
    pub(crate) fn render_target(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", quote_ident(&self.name), quote_ident(alias)),
            None => quote_ident(&self.name).into_owned(),
        }
    }
}

/// A parsed column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl ColumnRef {
    /// Parses `"name"`, `"qualifier.name"`, optionally followed by
    /// `" as alias"`.
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        let (head, alias) = match split_alias(expr) {
            Some((head, alias)) => {
                let alias = alias.trim();
                if alias.is_empty() || has_inner_space(alias) {
                    return Err(Error::MalformedColumnExpr(expr.to_string()));
                }
                (head.trim(), Some(alias.to_string()))
            }
            None => (expr, None),
        };

        let (qualifier, name) = match head.split_once('.') {
            Some((qualifier, name)) => (Some(qualifier.trim()), name.trim()),
            None => (None, head),
        };

        if name.is_empty()
            || has_inner_space(name)
            || qualifier.is_some_and(|q| q.is_empty() || has_inner_space(q))
        {
            return Err(Error::MalformedColumnExpr(expr.to_string()));
        }

        Ok(Self {
            qualifier: qualifier.map(str::to_string),
            name: name.to_string(),
            alias,
        })
    }

    /// The `qualifier.name` token, without any output alias.
    pub(crate) fn render_bare(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", quote_ident(q), quote_ident(&self.name)),
            None => quote_ident(&self.name).into_owned(),
        }
    }

    /// The projection rendering. Column aliases keep the caller's lowercase
    /// `as`, unlike table aliases; the asymmetry is intentional wire
    /// behavior.
    pub(crate) fn render_projection(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.render_bare(), quote_ident(alias)),
            None => self.render_bare(),
        }
    }
}

/// Splits a reference expression on a single case-insensitive ` as `
/// keyword. More than one occurrence is malformed enough that we refuse to
/// guess; `None` means no alias.
fn split_alias(expr: &str) -> Option<(&str, &str)> {
    let lower = expr.to_ascii_lowercase();
    let pos = lower.find(" as ")?;
    Some((&expr[..pos], &expr[pos + 4..]))
}

fn has_inner_space(token: &str) -> bool {
    token.chars().any(char::is_whitespace)
}

/// Double-quotes an identifier when it contains anything outside
/// `[A-Za-z0-9_]` or starts with a digit. Embedded quotes are doubled.
pub(crate) fn quote_ident(name: &str) -> Cow<'_, str> {
    let plain = !name.is_empty()
        && !name.chars().next().is_some_and(|c| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

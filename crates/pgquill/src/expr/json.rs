//! JSON/JSONB accessor chains.
//!
//! `jsonb("settings").field("notifications").field("email").eq(true)`
//! compiles to `settings -> $1 ->> $2 = $3` with parameters
//! `["notifications", "email", true]`. Every accessor key and every
//! terminal value is exactly one placeholder, drawn from the same counter
//! as the rest of the statement.

use crate::{binder::ParamBinder, expr::render::column_token, value::Value, Expr};

/// Starts an accessor chain on a JSON-typed column.
pub fn jsonb(column: impl Into<String>) -> JsonChain {
    JsonChain {
        base: column.into(),
        accessors: vec![],
        as_text: false,
    }
}

#[derive(Debug, Clone)]
enum Accessor {
    /// `->` / `->>` with a field-name key.
    Field(String),
    /// `#>` / `#>>` with a path-array key.
    Path(Vec<String>),
}

/// An unfinished accessor chain. Terminal methods turn it into an
/// [`Expr`].
#[derive(Debug, Clone)]
pub struct JsonChain {
    base: String,
    accessors: Vec<Accessor>,
    as_text: bool,
}

impl JsonChain {
    /// Descends into an object field (`->`).
    pub fn field(mut self, key: impl Into<String>) -> Self {
        self.accessors.push(Accessor::Field(key.into()));
        self
    }

    /// Descends along a path array (`#>`).
    pub fn path<S, I>(mut self, keys: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.accessors
            .push(Accessor::Path(keys.into_iter().map(Into::into).collect()));
        self
    }

    /// Forces the final accessor to produce text (`->>` / `#>>`) even for
    /// terminals that would otherwise keep the object form.
    pub fn as_text(mut self) -> Self {
        self.as_text = true;
        self
    }

    pub fn eq(self, value: impl Into<Value>) -> Expr {
        self.finish(Terminal::Eq(value.into()))
    }

    pub fn ne(self, value: impl Into<Value>) -> Expr {
        self.finish(Terminal::Ne(value.into()))
    }

    /// `@>` containment; the structured value binds as one placeholder,
    /// never decomposed.
    pub fn contains(self, value: impl Into<Value>) -> Expr {
        self.finish(Terminal::Contains(value.into()))
    }

    /// `<@` containment.
    pub fn contained_by(self, value: impl Into<Value>) -> Expr {
        self.finish(Terminal::ContainedBy(value.into()))
    }

    /// `?` on the base column; any accessors are bypassed.
    pub fn has_key(self, key: impl Into<String>) -> Expr {
        self.finish(Terminal::HasKey(key.into()))
    }

    /// `?|` on the base column.
    pub fn has_any_key<S, I>(self, keys: I) -> Expr
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.finish(Terminal::HasAnyKey(
            keys.into_iter().map(Into::into).collect(),
        ))
    }

    /// `?&` on the base column.
    pub fn has_all_keys<S, I>(self, keys: I) -> Expr
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.finish(Terminal::HasAllKeys(
            keys.into_iter().map(Into::into).collect(),
        ))
    }

    /// `<chain> IS NOT NULL`.
    pub fn exists(self) -> Expr {
        self.finish(Terminal::Exists)
    }

    /// `<chain> IS NULL`.
    pub fn is_null(self) -> Expr {
        self.finish(Terminal::IsNull)
    }

    fn finish(self, terminal: Terminal) -> Expr {
        Expr::Json(JsonCond {
            chain: self,
            terminal,
        })
    }
}

#[derive(Debug, Clone)]
enum Terminal {
    Eq(Value),
    Ne(Value),
    Contains(Value),
    ContainedBy(Value),
    HasKey(String),
    HasAnyKey(Vec<String>),
    HasAllKeys(Vec<String>),
    Exists,
    IsNull,
}

/// A completed JSON condition, ready to sit in a filter tree.
#[derive(Debug, Clone)]
pub struct JsonCond {
    chain: JsonChain,
    terminal: Terminal,
}

impl JsonCond {
    pub(crate) fn base(&self) -> &str {
        &self.chain.base
    }
}

fn text_array(keys: &[String]) -> Value {
    Value::Array(keys.iter().cloned().map(Value::Text).collect())
}

pub(crate) fn render(cond: &JsonCond, binder: &mut ParamBinder) -> String {
    let base = column_token(&cond.chain.base);

    // Key-existence operators apply to the base column directly.
    match &cond.terminal {
        Terminal::HasKey(key) => {
            return format!("{base} ? {}", binder.push(Value::Text(key.clone())));
        }
        Terminal::HasAnyKey(keys) => {
            return format!("{base} ?| {}", binder.push(text_array(keys)));
        }
        Terminal::HasAllKeys(keys) => {
            return format!("{base} ?& {}", binder.push(text_array(keys)));
        }
        _ => {}
    }

    // Equality terminals read the final accessor as text; .as_text() does
    // the same for everything else. Non-final accessors always keep the
    // object form.
    let text_final = cond.chain.as_text
        || matches!(cond.terminal, Terminal::Eq(_) | Terminal::Ne(_));

    let mut sql = base;
    let count = cond.chain.accessors.len();
    for (i, accessor) in cond.chain.accessors.iter().enumerate() {
        let text = text_final && i + 1 == count;
        let (op, key) = match accessor {
            Accessor::Field(key) => {
                (if text { "->>" } else { "->" }, Value::Text(key.clone()))
            }
            Accessor::Path(keys) => (if text { "#>>" } else { "#>" }, text_array(keys)),
        };
        let placeholder = binder.push(key);
        sql.push_str(&format!(" {op} {placeholder}"));
    }

    match &cond.terminal {
        Terminal::Eq(value) => format!("{sql} = {}", binder.push(value.clone())),
        Terminal::Ne(value) => format!("{sql} != {}", binder.push(value.clone())),
        Terminal::Contains(value) => format!("{sql} @> {}", binder.push(value.clone())),
        Terminal::ContainedBy(value) => format!("{sql} <@ {}", binder.push(value.clone())),
        Terminal::Exists => format!("{sql} IS NOT NULL"),
        Terminal::IsNull => format!("{sql} IS NULL"),
        // Handled by the early returns above.
        Terminal::HasKey(_) | Terminal::HasAnyKey(_) | Terminal::HasAllKeys(_) => sql,
    }
}

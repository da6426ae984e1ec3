//! The boolean expression compiler.
//!
//! Walks a filter tree depth-first, left to right, emitting SQL text and
//! binding one placeholder per literal value through the shared
//! [`ParamBinder`].

use crate::{
    binder::ParamBinder,
    expr::{json, Expr, LogicKind},
    table::quote_ident,
    Op,
};

/// Quotes a (possibly qualified) column token for use inside an
/// expression.
pub(crate) fn column_token(column: &str) -> String {
    match column.split_once('.') {
        Some((qualifier, name)) => {
            format!("{}.{}", quote_ident(qualifier), quote_ident(name))
        }
        None => quote_ident(column).into_owned(),
    }
}

/// Renders `expr` into SQL text. `nested` is true when the expression sits
/// inside another logical node; only then (or when a group has more than
/// one child) do AND/OR groups get their parenthesis pair, so a sole
/// top-level condition renders bare.
pub(crate) fn render_expr(expr: &Expr, binder: &mut ParamBinder, nested: bool) -> String {
    match expr {
        Expr::Cmp { column, op, value } => {
            let column = column_token(column);
            if value.is_null() && (*op == Op::IS || *op == Op::IS_NOT) {
                // No placeholder for the null marker.
                format!("{column} {} NULL", op.as_str())
            } else {
                let placeholder = binder.push(value.clone());
                format!("{column} {} {placeholder}", op.as_str())
            }
        }
        Expr::InList {
            column,
            negated,
            values,
        } => {
            let column = column_token(column);
            let placeholders: Vec<String> =
                values.iter().map(|v| binder.push(v.clone())).collect();
            let op = if *negated { "NOT IN" } else { "IN" };
            format!("{column} {op} ({})", placeholders.join(", "))
        }
        Expr::Logic {
            kind: LogicKind::Not,
            children,
        } => {
            let inner = children
                .first()
                .map(|child| render_expr(child, binder, true))
                .unwrap_or_default();
            format!("NOT ({inner})")
        }
        Expr::Logic { kind, children } => {
            let sep = if *kind == LogicKind::Or { " OR " } else { " AND " };
            let body = children
                .iter()
                .map(|child| render_expr(child, binder, true))
                .collect::<Vec<_>>()
                .join(sep);
            if nested || children.len() > 1 {
                format!("({body})")
            } else {
                body
            }
        }
        Expr::Json(cond) => json::render(cond, binder),
        Expr::Raw { segments, values } => {
            let mut sql = String::new();
            for (i, segment) in segments.iter().enumerate() {
                sql.push_str(segment);
                if i < values.len() {
                    sql.push_str(&binder.push(values[i].clone()));
                }
            }
            sql
        }
    }
}

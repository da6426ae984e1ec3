//! The SELECT builder and its renderer.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    binder::ParamBinder,
    error::Result,
    expr::{render::render_expr, Expr, LogicKind},
    query::{SortOrder, Statement},
    schema::Schema,
    table::{ColumnRef, TableRef},
    traits::Driver,
};

/// Join flavor; rendered verbatim in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct JoinClause {
    kind: JoinKind,
    table: TableRef,
    left: ColumnRef,
    right: ColumnRef,
}

/// An immutable `SELECT` builder.
///
/// Every chained call returns an extended copy; the builder is `Clone`, so
/// a shared prefix can branch into several statements:
///
/// ```
/// use pgquill::{col, SelectQuery};
///
/// # fn demo() -> pgquill::Result<()> {
/// let active = SelectQuery::from_table("users")?.filter(col("active").eq(true));
/// let first_page = active.clone().limit(20);
/// let everything = active.compile()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SelectQuery {
    source: TableRef,
    projection: Vec<ColumnRef>,
    joins: Vec<JoinClause>,
    filter: Option<Expr>,
    orders: Vec<(ColumnRef, SortOrder)>,
    limit: Option<u32>,
    offset: Option<u32>,
    schema: Option<Arc<Schema>>,
}

impl SelectQuery {
    /// Starts a query on `"table"` or `"table as alias"`.
    pub fn from_table(table: &str) -> Result<Self> {
        Ok(Self {
            source: TableRef::parse(table)?,
            projection: vec![],
            joins: vec![],
            filter: None,
            orders: vec![],
            limit: None,
            offset: None,
            schema: None,
        })
    }

    /// Replaces the projection. An empty list means select-all, identical
    /// to [`SelectQuery::select_all`].
    pub fn select<S, I>(mut self, columns: I) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let mut projection = vec![];
        for column in columns {
            projection.push(ColumnRef::parse(column.as_ref())?);
        }
        self.projection = projection;
        Ok(self)
    }

    /// Selects every column (`*`).
    pub fn select_all(mut self) -> Self {
        self.projection.clear();
        self
    }

    pub fn inner_join(self, table: &str, left: &str, right: &str) -> Result<Self> {
        self.join(JoinKind::Inner, table, left, right)
    }

    pub fn left_join(self, table: &str, left: &str, right: &str) -> Result<Self> {
        self.join(JoinKind::Left, table, left, right)
    }

    pub fn right_join(self, table: &str, left: &str, right: &str) -> Result<Self> {
        self.join(JoinKind::Right, table, left, right)
    }

    pub fn full_join(self, table: &str, left: &str, right: &str) -> Result<Self> {
        self.join(JoinKind::Full, table, left, right)
    }

    fn join(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Result<Self> {
        self.joins.push(JoinClause {
            kind,
            table: TableRef::parse(table)?,
            left: ColumnRef::parse(left)?,
            right: ColumnRef::parse(right)?,
        });
        Ok(self)
    }

    /// Adds a WHERE condition. Repeated calls fold into a single `AND`
    /// group in call order.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(Expr::Logic {
                kind: LogicKind::And,
                mut children,
            }) => {
                children.push(expr);
                Expr::Logic {
                    kind: LogicKind::And,
                    children,
                }
            }
            Some(existing) => Expr::Logic {
                kind: LogicKind::And,
                children: vec![existing, expr],
            },
            None => expr,
        });
        self
    }

    pub fn order_by(mut self, column: &str, order: SortOrder) -> Result<Self> {
        self.orders.push((ColumnRef::parse(column)?, order));
        Ok(self)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets limit and offset from 1-based page numbers.
    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.limit = Some(per_page);
        self.offset = Some(page.saturating_sub(1) * per_page);
        self
    }

    /// Attaches a schema catalog; `compile()` will reject unknown tables,
    /// unknown columns and bare-name qualifiers of aliased tables before
    /// rendering anything.
    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        let mut tables: Vec<&TableRef> = vec![&self.source];
        tables.extend(self.joins.iter().map(|j| &j.table));
        let scope = schema.scope(&tables)?;

        for column in &self.projection {
            scope.check_column_ref(column)?;
        }
        for join in &self.joins {
            scope.check_column_ref(&join.left)?;
            scope.check_column_ref(&join.right)?;
        }
        for (column, _) in &self.orders {
            scope.check_column_ref(column)?;
        }
        if let Some(filter) = &self.filter {
            let mut tokens = vec![];
            filter.for_each_column(&mut |token| tokens.push(token.to_string()));
            for token in tokens {
                scope.check_token(&token)?;
            }
        }
        Ok(())
    }

    /// Renders the statement. Clause order is fixed: projection, source,
    /// joins, filter, ordering, limit, offset. Placeholders are numbered
    /// by one counter across the whole statement.
    pub fn compile(&self) -> Result<Statement> {
        if let Some(schema) = &self.schema {
            self.validate(schema)?;
        }

        let mut binder = ParamBinder::new();

        let projection = if self.projection.is_empty() {
            "*".to_string()
        } else {
            self.projection
                .iter()
                .map(ColumnRef::render_projection)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", projection, self.source.render_target());

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {} = {}",
                join.kind.as_str(),
                join.table.render_target(),
                join.left.render_bare(),
                join.right.render_bare()
            ));
        }

        if let Some(filter) = &self.filter {
            sql.push_str(" WHERE ");
            sql.push_str(&render_expr(filter, &mut binder, false));
        }

        if !self.orders.is_empty() {
            let orders = self
                .orders
                .iter()
                .map(|(column, order)| format!("{} {}", column.render_bare(), order.as_str()))
                .collect::<Vec<_>>();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        debug!(params = binder.len(), "compiled SELECT statement");
        trace!(%sql);
        Ok(Statement {
            sql,
            params: binder.into_params(),
        })
    }

    /// Compiles and hands the statement to a driver.
    pub fn execute<D: Driver>(&self, driver: &mut D) -> Result<Vec<D::Row>> {
        let statement = self.compile()?;
        driver.query(&statement.sql, &statement.params)
    }
}

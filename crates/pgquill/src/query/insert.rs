//! The INSERT builder and its renderer.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    binder::ParamBinder,
    error::{Error, Result},
    query::Statement,
    schema::Schema,
    table::{quote_ident, ColumnRef, TableRef},
    traits::Driver,
    value::Value,
};

/// One row of column/value pairs, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((column.into(), value.into()));
        self
    }

    fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// What to do when the insert hits a conflict target.
#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    /// `DO UPDATE SET col = $n, …` with bound assignment values.
    DoUpdate(Vec<(String, Value)>),
}

impl ConflictAction {
    /// Convenience constructor for `DO UPDATE` assignments.
    pub fn do_update<C, V, I>(assignments: I) -> Self
    where
        C: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (C, V)>,
    {
        ConflictAction::DoUpdate(
            assignments
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

/// An immutable `INSERT` builder. The column list comes from the first
/// row; every later row must set the same columns (any order).
#[derive(Debug, Clone)]
pub struct InsertQuery {
    target: TableRef,
    rows: Vec<Row>,
    conflict: Option<(Vec<String>, ConflictAction)>,
    returning: Option<Vec<ColumnRef>>,
    schema: Option<Arc<Schema>>,
}

impl InsertQuery {
    /// Starts an insert into `"table"` or `"table as alias"`.
    pub fn into_table(table: &str) -> Result<Self> {
        Ok(Self {
            target: TableRef::parse(table)?,
            rows: vec![],
            conflict: None,
            returning: None,
            schema: None,
        })
    }

    /// Appends one row.
    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Appends several rows.
    pub fn rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Adds an `ON CONFLICT` clause. An empty target column list renders
    /// the bare `ON CONFLICT` form.
    pub fn on_conflict<S, I>(mut self, columns: I, action: ConflictAction) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.conflict = Some((columns.into_iter().map(Into::into).collect(), action));
        self
    }

    /// Adds a `RETURNING` clause for the given columns.
    pub fn returning<S, I>(mut self, columns: I) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let mut parsed = vec![];
        for column in columns {
            parsed.push(ColumnRef::parse(column.as_ref())?);
        }
        self.returning = Some(parsed);
        Ok(self)
    }

    /// `RETURNING *`.
    pub fn returning_all(mut self) -> Self {
        self.returning = Some(vec![]);
        self
    }

    /// Attaches a schema catalog; see [`crate::Schema`].
    pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The column list and, for each row, its values in that column order.
    /// Fails when a later row does not match the first row's columns.
    fn column_plan(&self) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let first = self.rows.first().ok_or(Error::EmptyInsert)?;
        let columns: Vec<String> = first.entries.iter().map(|(name, _)| name.clone()).collect();

        let mut value_rows = vec![];
        for (index, row) in self.rows.iter().enumerate() {
            if row.entries.len() != columns.len() {
                return Err(Error::RowShape { row: index + 1 });
            }
            let mut values = vec![];
            for column in &columns {
                match row.get(column) {
                    Some(value) => values.push(value.clone()),
                    None => return Err(Error::RowShape { row: index + 1 }),
                }
            }
            value_rows.push(values);
        }
        Ok((columns, value_rows))
    }

    fn validate(&self, schema: &Schema, columns: &[String]) -> Result<()> {
        let scope = schema.scope(&[&self.target])?;
        for column in columns {
            scope.check_token(column)?;
        }
        if let Some((targets, action)) = &self.conflict {
            for column in targets {
                scope.check_token(column)?;
            }
            if let ConflictAction::DoUpdate(assignments) = action {
                for (column, _) in assignments {
                    scope.check_token(column)?;
                }
            }
        }
        if let Some(returning) = &self.returning {
            for column in returning {
                scope.check_column_ref(column)?;
            }
        }
        Ok(())
    }

    /// Renders the statement. `VALUES` rows flatten row-major into
    /// placeholders before any `DO UPDATE` assignment values.
    pub fn compile(&self) -> Result<Statement> {
        let (columns, value_rows) = self.column_plan()?;
        if let Some(schema) = &self.schema {
            self.validate(schema, &columns)?;
        }

        let mut binder = ParamBinder::new();

        let column_list = columns
            .iter()
            .map(|name| quote_ident(name).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            self.target.render_target(),
            column_list
        );

        let rendered_rows = value_rows
            .into_iter()
            .map(|values| {
                let placeholders = values
                    .into_iter()
                    .map(|value| binder.push(value))
                    .collect::<Vec<_>>();
                format!("({})", placeholders.join(", "))
            })
            .collect::<Vec<_>>();
        sql.push_str(&rendered_rows.join(", "));

        if let Some((targets, action)) = &self.conflict {
            if targets.is_empty() {
                sql.push_str(" ON CONFLICT");
            } else {
                let targets = targets
                    .iter()
                    .map(|name| quote_ident(name).into_owned())
                    .collect::<Vec<_>>();
                sql.push_str(&format!(" ON CONFLICT ({})", targets.join(", ")));
            }
            match action {
                ConflictAction::DoNothing => sql.push_str(" DO NOTHING"),
                ConflictAction::DoUpdate(assignments) => {
                    let assignments = assignments
                        .iter()
                        .map(|(column, value)| {
                            format!("{} = {}", quote_ident(column), binder.push(value.clone()))
                        })
                        .collect::<Vec<_>>();
                    sql.push_str(&format!(" DO UPDATE SET {}", assignments.join(", ")));
                }
            }
        }

        if let Some(returning) = &self.returning {
            if returning.is_empty() {
                sql.push_str(" RETURNING *");
            } else {
                let returning = returning
                    .iter()
                    .map(ColumnRef::render_projection)
                    .collect::<Vec<_>>();
                sql.push_str(&format!(" RETURNING {}", returning.join(", ")));
            }
        }

        debug!(params = binder.len(), rows = self.rows.len(), "compiled INSERT statement");
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

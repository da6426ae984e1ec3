//! Runtime schema catalog.
//!
//! The catalog is an opt-in map of table names to column sets. When a
//! query carries one (via `.with_schema()`), every table and column
//! reference is checked before rendering, including alias exclusivity:
//! once a table is aliased, its bare name no longer qualifies columns in
//! that query. Without a catalog, unknown identifiers pass through and
//! surface as driver-side errors.

use std::collections::{HashMap, HashSet};

use crate::{
    error::{Error, Result},
    table::{ColumnRef, TableRef},
};

#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: HashMap<String, HashSet<String>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table and its columns.
    pub fn table<S, I>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        self.tables
            .insert(name.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    fn columns(&self, table: &str) -> Result<&HashSet<String>> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))
    }

    /// Verifies every referenced table exists and builds the qualifier
    /// scope for column checks.
    pub(crate) fn scope<'a>(&'a self, tables: &[&'a TableRef]) -> Result<Scope<'a>> {
        for table in tables {
            self.columns(&table.name)?;
        }
        Ok(Scope {
            schema: self,
            tables: tables.to_vec(),
        })
    }
}

/// The set of tables visible to one query, used to resolve qualifiers.
pub(crate) struct Scope<'a> {
    schema: &'a Schema,
    tables: Vec<&'a TableRef>,
}

impl Scope<'_> {
    pub(crate) fn check_column_ref(&self, column: &ColumnRef) -> Result<()> {
        self.check(column.qualifier.as_deref(), &column.name)
    }

    /// Checks a `qualifier.name` or bare `name` token from an expression
    /// tree.
    pub(crate) fn check_token(&self, token: &str) -> Result<()> {
        match token.split_once('.') {
            Some((qualifier, name)) => self.check(Some(qualifier), name),
            None => self.check(None, token),
        }
    }

    fn check(&self, qualifier: Option<&str>, column: &str) -> Result<()> {
        let Some(qualifier) = qualifier else {
            // Unqualified: the column must exist somewhere in scope.
            for table in &self.tables {
                if self.schema.columns(&table.name)?.contains(column) {
                    return Ok(());
                }
            }
            return Err(Error::UnknownColumn {
                table: self
                    .tables
                    .first()
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
                column: column.to_string(),
            });
        };

        // Alias exclusivity: the bare name of an aliased table is not a
        // valid qualifier.
        for table in &self.tables {
            if table.name == qualifier {
                if let Some(alias) = &table.alias {
                    if alias != qualifier {
                        return Err(Error::AliasConflict {
                            table: table.name.clone(),
                            alias: alias.clone(),
                        });
                    }
                }
            }
        }

        let table = self
            .tables
            .iter()
            .find(|t| t.identifier() == qualifier)
            .ok_or_else(|| Error::UnknownTable(qualifier.to_string()))?;

        if !self.schema.columns(&table.name)?.contains(column) {
            return Err(Error::UnknownColumn {
                table: table.name.clone(),
                column: column.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> Schema {
        Schema::new().table("users", ["id", "name", "active"])
    }

    #[test]
    fn test_scope_checks_tables() {
        let schema = users_schema();
        let users = TableRef::parse("users as u").unwrap();
        assert!(schema.scope(&[&users]).is_ok());

        let ghosts = TableRef::parse("ghosts").unwrap();
        assert!(matches!(
            schema.scope(&[&ghosts]).err(),
            Some(Error::UnknownTable(t)) if t == "ghosts"
        ));
    }

    #[test]
    fn test_alias_exclusivity() {
        let schema = users_schema();
        let users = TableRef::parse("users as u").unwrap();
        let scope = schema.scope(&[&users]).unwrap();

        assert!(scope.check_token("u.id").is_ok());
        assert!(matches!(
            scope.check_token("users.id"),
            Err(Error::AliasConflict { .. })
        ));
    }

    #[test]
    fn test_unqualified_lookup() {
        let schema = users_schema();
        let users = TableRef::parse("users").unwrap();
        let scope = schema.scope(&[&users]).unwrap();

        assert!(scope.check_token("active").is_ok());
        assert!(matches!(
            scope.check_token("missing"),
            Err(Error::UnknownColumn { .. })
        ));
    }
}

//! Error types for pgquill.

use miette::Diagnostic;
use thiserror::Error;

/// Error type for statement construction, validation and execution.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("malformed table expression: {0:?}")]
    #[diagnostic(
        code(pgquill::table_expr),
        help("expected \"table\" or \"table as alias\"")
    )]
    MalformedTableExpr(String),

    #[error("malformed column expression: {0:?}")]
    #[diagnostic(
        code(pgquill::column_expr),
        help("expected \"column\", \"qualifier.column\" or \"column as alias\"")
    )]
    MalformedColumnExpr(String),

    #[error("unknown comparison operator: {0:?}")]
    #[diagnostic(
        code(pgquill::operator),
        help("see the constants on `Op` for the supported operator set")
    )]
    UnknownOperator(String),

    #[error("raw fragment has {markers} marker(s) but {values} value(s)")]
    #[diagnostic(
        code(pgquill::raw_arity),
        help("every `?` marker in a raw fragment needs exactly one interpolated value")
    )]
    RawArity { markers: usize, values: usize },

    #[error("insert row #{row} does not match the columns of the first row")]
    #[diagnostic(
        code(pgquill::row_shape),
        help("every row of a multi-row insert must set the same columns")
    )]
    RowShape { row: usize },

    #[error("insert statement has no rows")]
    #[diagnostic(
        code(pgquill::empty_insert),
        help("add at least one row with .row() before compiling")
    )]
    EmptyInsert,

    #[error("unknown table: {0}")]
    #[diagnostic(
        code(pgquill::unknown_table),
        help("register the table in the schema catalog, or compile without .with_schema()")
    )]
    UnknownTable(String),

    #[error("unknown column {column:?} on table {table:?}")]
    #[diagnostic(
        code(pgquill::unknown_column),
        help("check the column name against the schema catalog")
    )]
    UnknownColumn { table: String, column: String },

    #[error("table {table:?} is aliased as {alias:?}; columns must be qualified by the alias")]
    #[diagnostic(
        code(pgquill::alias_conflict),
        help("once a table carries an alias, its bare name is no longer a valid qualifier")
    )]
    AliasConflict { table: String, alias: String },

    #[error("database error: {0}")]
    #[diagnostic(
        code(pgquill::database),
        help("reported by the driver; the statement itself compiled cleanly")
    )]
    Database(String),
}

/// Result type alias for pgquill operations.
pub type Result<T> = std::result::Result<T, Error>;

//! The driver seam.
//!
//! The builder never talks to a database itself; it hands `(sql, params)`
//! to whatever implements [`Driver`]. Driver failures are expected to
//! surface as [`crate::Error::Database`], propagated unchanged.

use crate::{error::Result, value::Value};

/// A minimal database driver interface.
pub trait Driver {
    /// The driver's row type.
    type Row;

    /// Runs a compiled statement and returns its rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Self::Row>>;
}

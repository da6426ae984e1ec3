//! The shared placeholder counter.
//!
//! One `ParamBinder` is created per compile pass and threaded by `&mut`
//! through every sub-compiler, so placeholder numbers stay strictly
//! sequential across the whole statement regardless of how clauses nest.

use crate::value::Value;

pub(crate) struct ParamBinder {
    values: Vec<Value>,
}

impl ParamBinder {
    pub(crate) fn new() -> Self {
        Self { values: vec![] }
    }

    /// Binds a value and returns its `$n` placeholder.
    pub(crate) fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn into_params(self) -> Vec<Value> {
        self.values
    }
}

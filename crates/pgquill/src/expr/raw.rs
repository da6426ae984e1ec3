//! Raw parameterized fragments.
//!
//! A fragment is written with `?` markers and a matching value list, e.g.
//! `Expr::raw("lower(email) = ?", [email])`. The markers are provisional:
//! actual `$n` numbers are assigned at render time from the shared counter,
//! so a fragment's position inside a larger filter tree decides its
//! placeholder numbers.

use crate::{
    error::{Error, Result},
    value::Value,
    Expr,
};

impl Expr {
    /// Builds a raw fragment. Fails if the marker count and value count
    /// disagree.
    pub fn raw<T, I>(text: &str, values: I) -> Result<Expr>
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let segments: Vec<String> = text.split('?').map(str::to_string).collect();
        let markers = segments.len() - 1;
        if markers != values.len() {
            return Err(Error::RawArity {
                markers,
                values: values.len(),
            });
        }
        Ok(Expr::Raw { segments, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_arity_checked_at_construction() {
        assert!(Expr::raw("x = ?", [1]).is_ok());
        assert!(matches!(
            Expr::raw("x = ? AND y = ?", [1]),
            Err(Error::RawArity {
                markers: 2,
                values: 1
            })
        ));
        assert!(matches!(
            Expr::raw("x = 1", [1]),
            Err(Error::RawArity {
                markers: 0,
                values: 1
            })
        ));
    }
}

use std::collections::HashMap;
use std::fmt;

use crate::types::RowValues;

/// Field name to value mapping, used both for named parameters and serialized rows.
pub type FieldMap = HashMap<String, RowValues>;

/// Parameter source supplied with a single call.
///
/// Every call signature accepts `impl Into<Params>`, so the shape is decided once at the call
/// boundary instead of being inspected at each use site:
/// ```rust
/// use sql_bridge::prelude::*;
///
/// let positional = Params::from(vec![RowValues::Int(1), RowValues::Int(2)]);
/// let named = Params::named([("id", RowValues::Int(1))]);
/// let scalar = Params::from(RowValues::Text("alice".into()));
/// assert_eq!(positional.kind(), "positional sequence");
/// assert_eq!(named.kind(), "named mapping");
/// assert_eq!(scalar.kind(), "single value");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// No parameters.
    #[default]
    None,
    /// Ordered values bound left to right.
    Positional(Vec<RowValues>),
    /// Values looked up by `$name` tokens.
    Named(FieldMap),
    /// A bare value for a single-slot statement.
    Scalar(RowValues),
}

impl Params {
    /// Build a named source from any iterator of `(name, value)` pairs.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RowValues>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// True when the source carries no values at all. A scalar, even `NULL`, is a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(values) => values.is_empty(),
            Params::Named(map) => map.is_empty(),
            Params::Scalar(_) => false,
        }
    }

    /// Human-readable shape name used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Params::None => "no parameters",
            Params::Positional(_) => "positional sequence",
            Params::Named(_) => "named mapping",
            Params::Scalar(_) => "single value",
        }
    }

    /// Pick `self` unless it is empty, in which case fall back to `defaults`.
    #[must_use]
    pub fn or_defaults(self, defaults: &Params) -> Params {
        if self.is_empty() {
            defaults.clone()
        } else {
            self
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Params::None => f.write_str("none"),
            Params::Positional(values) => write!(f, "{values:?}"),
            Params::Named(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {:?}", map[*key])?;
                }
                write!(f, "}}")
            }
            Params::Scalar(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::None
    }
}

impl From<Vec<RowValues>> for Params {
    fn from(values: Vec<RowValues>) -> Self {
        Params::Positional(values)
    }
}

impl From<&[RowValues]> for Params {
    fn from(values: &[RowValues]) -> Self {
        Params::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[RowValues; N]> for Params {
    fn from(values: [RowValues; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<FieldMap> for Params {
    fn from(map: FieldMap) -> Self {
        Params::Named(map)
    }
}

impl From<RowValues> for Params {
    fn from(value: RowValues) -> Self {
        Params::Scalar(value)
    }
}

use crate::params::Params;

/// Finished SQL text plus the parameters that travel with it.
///
/// Query builders hand the adapter one of these; `Sql::positional` is the counterpart of a
/// tagged template whose interpolations became `?` markers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sql {
    text: String,
    params: Params,
}

impl Sql {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Params::None,
        }
    }

    /// SQL with `?` markers and the values for them, in order.
    #[must_use]
    pub fn positional(text: impl Into<String>, values: impl Into<Params>) -> Self {
        Self::new(text).with_params(values)
    }

    #[must_use]
    pub fn with_params(mut self, params: impl Into<Params>) -> Self {
        self.params = params.into();
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Params) {
        (self.text, self.params)
    }
}

impl From<&str> for Sql {
    fn from(text: &str) -> Self {
        Sql::new(text)
    }
}

impl From<String> for Sql {
    fn from(text: String) -> Self {
        Sql::new(text)
    }
}

/// Anything that can render itself as finished SQL: plain strings, [`Sql`] values, or a query
/// builder's output.
pub trait QueryFragment {
    fn to_sql(&self) -> Sql;
}

impl QueryFragment for Sql {
    fn to_sql(&self) -> Sql {
        self.clone()
    }
}

impl QueryFragment for str {
    fn to_sql(&self) -> Sql {
        Sql::new(self)
    }
}

impl QueryFragment for String {
    fn to_sql(&self) -> Sql {
        Sql::new(self.as_str())
    }
}

impl<T: QueryFragment + ?Sized> QueryFragment for &T {
    fn to_sql(&self) -> Sql {
        (**self).to_sql()
    }
}

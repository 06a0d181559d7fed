use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Error as JsonError;

use crate::error::SqlBridgeError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Build a `T` from a row's field/value pairs, matching fields by column name.
///
/// `None` passes through as `None`. Missing or extra fields are handled by `T`'s own serde
/// attributes (`#[serde(default)]`, `deny_unknown_fields`, ...). Integer `0`/`1` columns read
/// into `bool` fields, since that is how booleans are stored.
///
/// # Errors
/// Returns [`SqlBridgeError::RowConversion`] when the row does not deserialize into `T`.
pub fn materialize<T: DeserializeOwned>(
    row: Option<&CustomDbRow>,
) -> Result<Option<T>, SqlBridgeError> {
    row.map(materialize_row).transpose()
}

pub(crate) fn materialize_row<T: DeserializeOwned>(
    row: &CustomDbRow,
) -> Result<T, SqlBridgeError> {
    let fields = row
        .column_names
        .iter()
        .zip(row.values())
        .map(|(name, value)| (name.as_str(), ValueDeserializer(value)));
    let map: MapDeserializer<'_, _, JsonError> = MapDeserializer::new(fields);
    Ok(T::deserialize(map)?)
}

/// Deserializes one column value straight from `RowValues`.
#[derive(Clone, Copy)]
struct ValueDeserializer<'a>(&'a RowValues);

impl<'de> IntoDeserializer<'de, JsonError> for ValueDeserializer<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for ValueDeserializer<'_> {
    type Error = JsonError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, JsonError> {
        match self.0 {
            RowValues::Int(i) => visitor.visit_i64(*i),
            RowValues::Float(f) => visitor.visit_f64(*f),
            RowValues::Text(s) => visitor.visit_str(s),
            RowValues::Bool(b) => visitor.visit_bool(*b),
            RowValues::Null => visitor.visit_unit(),
            RowValues::Blob(bytes) => {
                visitor.visit_seq(SeqDeserializer::new(bytes.iter().copied()))
            }
            RowValues::Timestamp(_) | RowValues::JSON(_) => {
                self.0.to_json().deserialize_any(visitor)
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, JsonError> {
        match self.0.as_bool() {
            Some(b) => visitor.visit_bool(*b),
            None => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, JsonError> {
        if self.0.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, JsonError> {
        match self.0 {
            RowValues::Blob(bytes) => visitor.visit_bytes(bytes),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, JsonError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, JsonError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, JsonError> {
        match self.0 {
            RowValues::Text(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            other => other.to_json().deserialize_enum(name, variants, visitor),
        }
    }

    forward_to_deserialize_any! {
        i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;

    use super::*;
    use crate::types::RowValues;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Contact {
        name: String,
        email: String,
    }

    #[test]
    fn materializes_matching_fields() {
        let row = CustomDbRow::new(
            Arc::new(vec!["name".into(), "email".into()]),
            vec![
                RowValues::Text("Jane".into()),
                RowValues::Text("jane@mail.org".into()),
            ],
        );
        let contact: Contact = materialize(Some(&row)).unwrap().unwrap();
        assert_eq!(contact.name, "Jane");
        assert_eq!(contact.email, "jane@mail.org");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Flag {
        id: Option<i64>,
        active: bool,
        score: f64,
    }

    #[test]
    fn integer_columns_read_into_bool_fields() {
        let row = CustomDbRow::new(
            Arc::new(vec!["id".into(), "active".into(), "score".into()]),
            vec![RowValues::Null, RowValues::Int(1), RowValues::Int(3)],
        );
        let flag: Flag = materialize(Some(&row)).unwrap().unwrap();
        assert_eq!(
            flag,
            Flag {
                id: None,
                active: true,
                score: 3.0
            }
        );

        let row = CustomDbRow::new(
            Arc::new(vec!["id".into(), "active".into(), "score".into()]),
            vec![RowValues::Int(2), RowValues::Int(7), RowValues::Float(0.5)],
        );
        let err = materialize::<Flag>(Some(&row)).unwrap_err();
        assert!(matches!(err, SqlBridgeError::RowConversion(_)));
    }

    #[test]
    fn none_stays_none() {
        let contact: Option<Contact> = materialize(None).unwrap();
        assert!(contact.is_none());
    }

    #[test]
    fn type_mismatch_is_a_conversion_error() {
        let row = CustomDbRow::new(
            Arc::new(vec!["name".into(), "email".into()]),
            vec![RowValues::Int(1), RowValues::Null],
        );
        let err = materialize::<Contact>(Some(&row)).unwrap_err();
        assert!(matches!(err, SqlBridgeError::RowConversion(_)));
    }
}

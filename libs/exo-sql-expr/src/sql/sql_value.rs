// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use bytes::BytesMut;
use tokio_postgres::types::{to_sql_checked, IsNull, Kind, ToSql, Type};

use crate::expression_error::ExpressionError;

/// A value bound to a placeholder.
///
/// Implements [`ToSql`], so a binding table can be handed to a tokio-postgres executor as is.
#[derive(Debug, Clone, PartialEq)]
pub enum SQLValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Array(Vec<SQLValue>),
}

impl SQLValue {
    /// Null, the empty string and the empty array. Numeric-keyed condition entries holding such a
    /// value are skipped.
    pub fn is_empty(&self) -> bool {
        match self {
            SQLValue::Null => true,
            SQLValue::Text(text) => text.is_empty(),
            SQLValue::Array(elems) => elems.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SQLValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SQLValue]> {
        match self {
            SQLValue::Array(elems) => Some(elems),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            SQLValue::Null => "null",
            SQLValue::Bool(_) => "bool",
            SQLValue::Int(_) => "int",
            SQLValue::Float(_) => "float",
            SQLValue::Text(_) => "text",
            SQLValue::Json(_) => "json",
            SQLValue::Array(_) => "array",
        }
    }
}

impl Display for SQLValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SQLValue::Null => write!(f, "NULL"),
            SQLValue::Bool(v) => write!(f, "{v}"),
            SQLValue::Int(v) => write!(f, "{v}"),
            SQLValue::Float(v) => write!(f, "{v}"),
            SQLValue::Text(v) => write!(f, "{v:?}"),
            SQLValue::Json(v) => write!(f, "{v}"),
            SQLValue::Array(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl ToSql for SQLValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SQLValue::Null => Ok(IsNull::Yes),
            SQLValue::Bool(v) => v.to_sql(ty, out),
            // Narrow to the width the server expects for the parameter
            SQLValue::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SQLValue::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            SQLValue::Text(v) => v.to_sql(ty, out),
            SQLValue::Json(v) => v.to_sql(ty, out),
            SQLValue::Array(elems) => match ty.kind() {
                Kind::Array(_) => elems.to_sql(ty, out),
                // An array that was not expanded into one placeholder per element
                _ => Err(ExpressionError::TypeMismatch {
                    value: self.to_string(),
                    ty: ty.to_string(),
                }
                .into()),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl From<bool> for SQLValue {
    fn from(value: bool) -> Self {
        SQLValue::Bool(value)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SQLValue {
                fn from(value: $t) -> Self {
                    SQLValue::Int(i64::from(value))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SQLValue {
    fn from(value: f32) -> Self {
        SQLValue::Float(f64::from(value))
    }
}

impl From<f64> for SQLValue {
    fn from(value: f64) -> Self {
        SQLValue::Float(value)
    }
}

impl From<&str> for SQLValue {
    fn from(value: &str) -> Self {
        SQLValue::Text(value.to_string())
    }
}

impl From<String> for SQLValue {
    fn from(value: String) -> Self {
        SQLValue::Text(value)
    }
}

impl<T: Into<SQLValue>> From<Option<T>> for SQLValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SQLValue::Null)
    }
}

impl<T: Into<SQLValue>> From<Vec<T>> for SQLValue {
    fn from(values: Vec<T>) -> Self {
        SQLValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SQLValue> + Clone> From<&[T]> for SQLValue {
    fn from(values: &[T]) -> Self {
        SQLValue::Array(values.iter().cloned().map(Into::into).collect())
    }
}

/// Scalars and arrays map onto the matching variant; objects are kept as [`SQLValue::Json`].
impl From<serde_json::Value> for SQLValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => SQLValue::Null,
            Value::Bool(v) => SQLValue::Bool(v),
            Value::Number(n) => match n.as_i64() {
                Some(v) => SQLValue::Int(v),
                None => SQLValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(v) => SQLValue::Text(v),
            Value::Array(elems) => SQLValue::Array(elems.into_iter().map(Into::into).collect()),
            object @ Value::Object(_) => SQLValue::Json(object),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_json() {
        assert_eq!(SQLValue::from(json!(null)), SQLValue::Null);
        assert_eq!(SQLValue::from(json!(5)), SQLValue::Int(5));
        assert_eq!(SQLValue::from(json!(2.5)), SQLValue::Float(2.5));
        assert_eq!(
            SQLValue::from(json!(["a", 1])),
            SQLValue::Array(vec![SQLValue::Text("a".into()), SQLValue::Int(1)])
        );
        assert_eq!(
            SQLValue::from(json!({"k": 1})),
            SQLValue::Json(json!({"k": 1}))
        );
    }

    #[test]
    fn emptiness() {
        assert!(SQLValue::Null.is_empty());
        assert!(SQLValue::from("").is_empty());
        assert!(SQLValue::from(Vec::<i32>::new()).is_empty());
        assert!(!SQLValue::from(0).is_empty());
        assert!(!SQLValue::from(false).is_empty());
    }

    #[test]
    fn int_narrowing() {
        let mut out = BytesMut::new();
        assert!(SQLValue::Int(7).to_sql(&Type::INT4, &mut out).is_ok());
        assert_eq!(&out[..], &7i32.to_be_bytes());

        let mut out = BytesMut::new();
        assert!(SQLValue::Int(i64::MAX).to_sql(&Type::INT2, &mut out).is_err());
    }

    #[test]
    fn array_needs_an_array_type() {
        let value = SQLValue::from(vec![1, 2]);

        let mut out = BytesMut::new();
        let err = value.to_sql(&Type::INT4, &mut out).err().expect("expected an error");
        assert!(matches!(
            err.downcast_ref::<ExpressionError>(),
            Some(ExpressionError::TypeMismatch { .. })
        ));
        assert!(out.is_empty());

        let mut out = BytesMut::new();
        assert!(value.to_sql(&Type::INT4_ARRAY, &mut out).is_ok());
    }

    #[test]
    fn null_is_null() {
        let mut out = BytesMut::new();
        assert!(matches!(
            SQLValue::Null.to_sql(&Type::TEXT, &mut out),
            Ok(IsNull::Yes)
        ));
    }

    #[test]
    fn display() {
        assert_eq!(
            SQLValue::from(vec![SQLValue::from("x"), SQLValue::Null]).to_string(),
            r#"["x", NULL]"#
        );
    }
}

//! Bound values carried alongside rendered SQL.
//!
//! Every placeholder in a rendered statement is satisfied by one [`Value`], in
//! the same left-to-right order. `Value` is clone-friendly so builders can be
//! cloned without re-encoding their parameters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A single bound argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL. Comparisons against it render as `IS [NOT] NULL`.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Check if this is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Convert a scalar JSON value into a bound [`Value`].
///
/// Arrays and objects are bound as JSON documents.
pub(crate) fn from_json_scalar(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Json(other),
    }
}

#[cfg(feature = "postgres")]
mod pg {
    use super::Value;
    use bytes::BytesMut;
    use std::error::Error;
    use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

    impl ToSql for Value {
        fn to_sql(
            &self,
            ty: &Type,
            out: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
            match self {
                Value::Null => Ok(IsNull::Yes),
                Value::Bool(b) => b.to_sql_checked(ty, out),
                Value::Int(i) => {
                    if *ty == Type::INT2 {
                        i16::try_from(*i)?.to_sql_checked(ty, out)
                    } else if *ty == Type::INT4 {
                        i32::try_from(*i)?.to_sql_checked(ty, out)
                    } else {
                        i.to_sql_checked(ty, out)
                    }
                }
                Value::Float(f) => {
                    if *ty == Type::FLOAT4 {
                        (*f as f32).to_sql_checked(ty, out)
                    } else {
                        f.to_sql_checked(ty, out)
                    }
                }
                Value::Text(s) => s.as_str().to_sql_checked(ty, out),
                Value::Bytes(b) => b.as_slice().to_sql_checked(ty, out),
                Value::Json(j) => j.to_sql_checked(ty, out),
                Value::Uuid(u) => u.to_sql_checked(ty, out),
                Value::Timestamp(t) => {
                    if *ty == Type::TIMESTAMP {
                        t.naive_utc().to_sql_checked(ty, out)
                    } else {
                        t.to_sql_checked(ty, out)
                    }
                }
            }
        }

        // Each variant checks its own Rust type against `ty` in `to_sql`.
        fn accepts(_ty: &Type) -> bool {
            true
        }

        to_sql_checked!();
    }

}

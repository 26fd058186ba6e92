//! Typed values exchanged between records and drivers.
//!
//! Every record field is carried as a [`Value`] together with its declared
//! [`FieldType`]. The [`FieldValue`] trait converts between Rust field types
//! and values; `#[derive(Model)]` relies on it for the generated accessors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValueError;

/// The declared storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean flag.
    Bool,
    /// Signed integer, stored as `i64`.
    Int,
    /// Floating point number, stored as `f64`.
    Float,
    /// UTF-8 text.
    Text,
    /// UTC timestamp.
    Timestamp,
    /// UUID.
    Uuid,
    /// Arbitrary JSON document.
    Json,
}

impl FieldType {
    /// Returns the zero value of this type.
    ///
    /// This is the value a freshly defaulted Rust field of the type converts
    /// to, which is what makes it usable for new-record detection.
    pub fn zero(self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int => Value::Int(0),
            FieldType::Float => Value::Float(0.0),
            FieldType::Text => Value::Text(String::new()),
            FieldType::Timestamp => Value::Timestamp(DateTime::<Utc>::default()),
            FieldType::Uuid => Value::Uuid(Uuid::nil()),
            FieldType::Json => Value::Json(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Timestamp => "timestamp",
            FieldType::Uuid => "uuid",
            FieldType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absent value of a nullable field.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Timestamp value.
    Timestamp(DateTime<Utc>),
    /// UUID value.
    Uuid(Uuid),
    /// JSON document.
    Json(serde_json::Value),
}

impl Value {
    /// Returns a short name for the kind of this value.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
    serde_json::Value => Json,
}

/// Conversion between a Rust field type and a [`Value`].
pub trait FieldValue: Sized {
    /// The declared storage type.
    const FIELD_TYPE: FieldType;

    /// Whether the field accepts [`Value::Null`].
    const NULLABLE: bool = false;

    /// Converts the field into a value.
    fn to_value(&self) -> Value;

    /// Converts a value back into the field type.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

fn mismatch(expected: FieldType, found: &Value) -> ValueError {
    ValueError::Mismatch {
        expected,
        found: found.kind(),
    }
}

impl FieldValue for i64 {
    const FIELD_TYPE: FieldType = FieldType::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch(FieldType::Int, &other)),
        }
    }
}

macro_rules! impl_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                const FIELD_TYPE: FieldType = FieldType::Int;

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| ValueError::OutOfRange {
                            value: i,
                            target: stringify!($ty),
                        }),
                        other => Err(mismatch(FieldType::Int, &other)),
                    }
                }
            }
        )*
    };
}

impl_narrow_int!(i8, i16, i32, u8, u16, u32);

impl FieldValue for f64 {
    const FIELD_TYPE: FieldType = FieldType::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch(FieldType::Float, &other)),
        }
    }
}

impl FieldValue for f32 {
    const FIELD_TYPE: FieldType = FieldType::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FieldValue for bool {
    const FIELD_TYPE: FieldType = FieldType::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(FieldType::Bool, &other)),
        }
    }
}

impl FieldValue for String {
    const FIELD_TYPE: FieldType = FieldType::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(FieldType::Text, &other)),
        }
    }
}

impl FieldValue for DateTime<Utc> {
    const FIELD_TYPE: FieldType = FieldType::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch(FieldType::Timestamp, &other)),
        }
    }
}

impl FieldValue for Uuid {
    const FIELD_TYPE: FieldType = FieldType::Uuid;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Uuid(u) => Ok(u),
            other => Err(mismatch(FieldType::Uuid, &other)),
        }
    }
}

impl FieldValue for serde_json::Value {
    const FIELD_TYPE: FieldType = FieldType::Json;

    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(j) => Ok(j),
            other => Err(mismatch(FieldType::Json, &other)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

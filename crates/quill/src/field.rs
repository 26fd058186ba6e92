//! The field value bag.
//!
//! A [`Field`] is the interchange record between the mapping layer and every
//! driver: logical name, storage name, primary flag, declared type and the
//! current value. Fields are rebuilt on every extract/assign cycle and carry
//! no identity of their own.

use std::fmt;

use crate::value::{FieldType, Value};

/// One stored row: a list of populated fields in descriptor order.
pub type Row = Vec<Field>;

/// A field declaration together with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Rust field name.
    name: &'static str,
    /// Column name the driver reads and writes.
    storage_name: &'static str,
    /// Whether this field is the primary key.
    primary: bool,
    /// Declared storage type.
    ty: FieldType,
    /// Whether the field accepts nulls.
    nullable: bool,
    /// Current value; [`Value::Null`] until populated.
    value: Value,
}

impl Field {
    /// Creates an unpopulated field whose storage name equals its logical name.
    pub fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            storage_name: name,
            primary: false,
            ty,
            nullable: false,
            value: Value::Null,
        }
    }

    /// Overrides the storage name.
    pub fn with_storage_name(mut self, storage_name: &'static str) -> Self {
        self.storage_name = storage_name;
        self
    }

    /// Marks the field as primary key.
    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Marks the field as nullable.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Returns a copy of this field carrying the given value.
    pub fn with_value(&self, value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }

    /// Replaces the current value.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Returns the logical (Rust) name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the storage name.
    pub fn storage_name(&self) -> &'static str {
        self.storage_name
    }

    /// Returns true for the primary key field.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Returns the declared type.
    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    /// Returns true if the field accepts nulls.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the current value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the field and returns its value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns the zero value for the declared type.
    pub fn zero_value(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            self.ty.zero()
        }
    }

    /// Returns true if the current value equals the zero value.
    pub fn is_zero(&self) -> bool {
        self.value == self.zero_value()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.storage_name, self.value)
    }
}

/// Finds the field stored under the given column name.
pub fn by_storage_name<'a>(row: &'a [Field], storage_name: &str) -> Option<&'a Field> {
    row.iter().find(|f| f.storage_name == storage_name)
}

/// Finds the primary key field of a row.
pub fn primary_of(row: &[Field]) -> Option<&Field> {
    row.iter().find(|f| f.primary)
}

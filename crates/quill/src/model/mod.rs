//! Record descriptions and their resolution into table metadata.
//!
//! A record type implements [`Model`] (normally through `#[derive(Model)]`),
//! which exposes its declared [`ModelShape`] plus a get/set accessor pair keyed
//! by field name. [`ModelDescriptor::resolve`] turns a shape into the table
//! name, ordered field list and primary field every driver works with.
//!
//! # Example
//!
//! ```
//! use quill::{Model, ModelDescriptor, ModelMetadata};
//!
//! #[derive(Debug, Default, Model)]
//! struct Person {
//!     #[quill(table = "people")]
//!     meta: ModelMetadata,
//!     #[quill(primary)]
//!     id: i64,
//!     #[quill(column = "full_name")]
//!     name: String,
//!     age: i32,
//! }
//!
//! let descriptor = ModelDescriptor::of::<Person>().unwrap();
//! assert_eq!(descriptor.table(), "people");
//! assert_eq!(descriptor.primary().unwrap().name(), "id");
//! assert_eq!(descriptor.fields()[1].storage_name(), "full_name");
//! ```

mod cache;
mod descriptor;
pub mod mapping;

pub use cache::DescriptorCache;
pub use descriptor::ModelDescriptor;

use crate::error::MappingError;
use crate::value::{FieldType, FieldValue, Value};

/// A record type that can be stored through a driver.
///
/// Implementations are generated by `#[derive(Model)]`. Hand-written
/// implementations must keep `shape()` a pure function of the type and keep
/// the accessor pair consistent with the declared fields.
pub trait Model: Default + Send + 'static {
    /// Returns the declared shape of this record type.
    fn shape() -> ModelShape;

    /// Reads a declared field by its logical name.
    fn field_value(&self, name: &str) -> Option<Value>;

    /// Writes a declared field by its logical name.
    ///
    /// Fields declared read-only reject the write with
    /// [`MappingError::FieldNotSettable`].
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), MappingError>;

    /// Writes a field with a value that came from storage.
    ///
    /// Unlike [`set_field`](Model::set_field) this also assigns read-only
    /// fields, so stored records load back whole. Used when populating
    /// records from driver rows and when backfilling an allocated key.
    fn load_field(&mut self, name: &str, value: Value) -> Result<(), MappingError> {
        self.set_field(name, value)
    }
}

/// Zero-sized marker field that declares a record's table.
///
/// ```ignore
/// #[quill(table = "posts")]
/// meta: ModelMetadata,
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelMetadata;

/// The kind of Rust item a model was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Struct with named fields.
    Record,
    /// Tuple or unit struct.
    Tuple,
    /// Enum.
    Enum,
}

/// The table marker found on a record, with its table name if one was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMarker {
    /// Declared table name.
    pub name: Option<&'static str>,
}

/// The declared shape of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelShape {
    /// Rust type name.
    pub type_name: &'static str,
    /// Item kind.
    pub kind: ShapeKind,
    /// The `ModelMetadata` marker, if declared.
    pub table: Option<TableMarker>,
    /// Stored fields in declaration order.
    pub fields: Vec<FieldDecl>,
}

impl ModelShape {
    /// Starts a named-field record shape with no marker and no fields.
    pub fn record(type_name: &'static str) -> Self {
        Self {
            type_name,
            kind: ShapeKind::Record,
            table: None,
            fields: Vec::new(),
        }
    }

    /// Overrides the item kind.
    pub fn with_kind(mut self, kind: ShapeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches a table marker carrying the given name.
    pub fn with_table(mut self, name: &'static str) -> Self {
        self.table = Some(TableMarker { name: Some(name) });
        self
    }

    /// Attaches a table marker without a name.
    pub fn with_bare_marker(mut self) -> Self {
        self.table = Some(TableMarker { name: None });
        self
    }

    /// Appends a field declaration.
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

/// A single stored field declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    /// Rust field name.
    pub name: &'static str,
    /// Explicit column name.
    pub column: Option<&'static str>,
    /// Whether the field is the primary key.
    pub primary: bool,
    /// Whether the field rejects assignment.
    pub readonly: bool,
    /// Declared storage type.
    pub ty: FieldType,
    /// Whether the field accepts nulls.
    pub nullable: bool,
}

impl FieldDecl {
    /// Declares a field with an explicit storage type.
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            column: None,
            primary: false,
            readonly: false,
            ty,
            nullable: false,
        }
    }

    /// Declares a field whose type and nullability follow the Rust type `T`.
    pub const fn of<T: FieldValue>(name: &'static str) -> Self {
        let mut decl = Self::new(name, T::FIELD_TYPE);
        decl.nullable = T::NULLABLE;
        decl
    }

    /// Sets the column name.
    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Marks the field as primary key.
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Marks the field as read-only.
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

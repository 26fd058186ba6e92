//! Error types for the mapping layer and its drivers.
//!
//! This module defines all error types used throughout the crate, following a
//! hierarchy that separates model resolution, field mapping, missing rows,
//! query registration, transaction lifecycle and backend failures.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::transaction::TransactionState;
use crate::value::FieldType;

/// The primary error type for all storage operations.
///
/// Lower layers return one of the categorized errors; the session and
/// transaction layers wrap them in [`StorageError::Context`] with the
/// attempted operation and the record type or table involved. Use
/// [`StorageError::root`] to match on the original cause.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Model descriptor resolution errors
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Field extraction and population errors
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Primary key errors
    #[error(transparent)]
    PrimaryKey(#[from] PrimaryKeyError),

    /// Missing row errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Query registration errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Transaction lifecycle errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A lower-level error annotated with the operation that triggered it.
    #[error("unable to {operation} {target}: {source}")]
    Context {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    /// Wraps this error with the attempted operation and its target.
    pub fn during(self, operation: &'static str, target: impl Into<String>) -> Self {
        StorageError::Context {
            operation,
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping every [`StorageError::Context`] layer.
    pub fn root(&self) -> &StorageError {
        let mut current = self;
        while let StorageError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns true if the root cause is a missing row for a primary key.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            StorageError::Resource(ResourceError::NotFound { .. })
        )
    }
}

/// Errors raised while deriving a [`ModelDescriptor`](crate::model::ModelDescriptor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The shape is not a record with named fields.
    #[error("model {type_name} is required to be a struct with named fields")]
    NotAStruct { type_name: &'static str },

    /// The shape does not declare a `ModelMetadata` marker field.
    #[error("model {type_name} is required to carry a ModelMetadata marker field")]
    MissingMetadataMarker { type_name: &'static str },

    /// The marker is present but has no table name attached.
    #[error("table name is missing on the ModelMetadata marker of {type_name}")]
    MissingTableName { type_name: &'static str },

    /// More than one field is marked primary.
    #[error("model {type_name} marks both {first} and {second} as primary")]
    DuplicatePrimaryField {
        type_name: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

/// Errors raised while moving values between a record and a field list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// The record does not expose the requested field.
    #[error("field {field} not found on {type_name}")]
    FieldNotFound { type_name: &'static str, field: String },

    /// The field exists but cannot be assigned.
    #[error("field {field} on {type_name} is read-only and cannot be assigned")]
    FieldNotSettable { type_name: &'static str, field: String },

    /// The incoming value does not convert into the field's type.
    #[error("field {field} on {type_name} cannot hold the incoming value: {source}")]
    TypeMismatch {
        type_name: &'static str,
        field: String,
        #[source]
        source: ValueError,
    },
}

/// Errors converting a [`Value`](crate::value::Value) into a Rust type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value has a different kind than the declared type.
    #[error("expected {expected} value, found {found}")]
    Mismatch {
        expected: FieldType,
        found: &'static str,
    },

    /// The integer does not fit into the target type.
    #[error("value {value} does not fit into {target}")]
    OutOfRange { value: i64, target: &'static str },
}

/// Errors related to primary keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKeyError {
    /// The model has no field marked primary.
    #[error("model {type_name} has no primary field, mark one with #[quill(primary)]")]
    NoPrimaryField { type_name: &'static str },
}

/// Errors for rows that do not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// No row with the given primary key.
    #[error("record not found in {table} with {key}")]
    NotFound { table: String, key: String },

    /// No row matches the given predicate.
    #[error("no record in {table} matches '{predicate}'")]
    NoMatch { table: String, predicate: String },
}

/// Errors related to query predicates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The predicate string is unknown to the driver.
    #[error("query '{predicate}' is not registered with the driver")]
    NotRegistered { predicate: String },
}

/// Errors related to the transaction lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The transaction was already committed or rolled back.
    #[error("transaction is already finished ({state})")]
    AlreadyFinished { state: TransactionState },

    /// The transaction callback panicked; the panic was caught and converted.
    #[error("{message} (recovered)")]
    RecoveredFault { message: String },
}

/// Errors originating from a storage driver.
#[derive(Error, Debug)]
pub enum DriverError {
    /// No driver has been installed in the registry.
    #[error("no driver configured")]
    NotConfigured,

    /// The driver does not support the requested capability.
    #[error("capability '{capability}' not supported by {backend}")]
    Unsupported { backend: String, capability: String },

    /// The transaction token is unknown to the driver.
    #[error("{backend} has no active transaction {token}")]
    UnknownTransaction { backend: String, token: String },

    /// Generic backend failure.
    #[error("{backend} failed to {operation}: {message}")]
    Failed {
        backend: String,
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Replaying a committed transaction onto its parent failed.
    #[error("{backend} failed to replay transaction {token}: {source}")]
    ReplayFailed {
        backend: String,
        token: String,
        #[source]
        source: Box<StorageError>,
    },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

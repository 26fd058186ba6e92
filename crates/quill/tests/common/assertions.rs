//! Assertion helpers for error causes.
//!
//! Session and transaction errors arrive wrapped in context layers; these
//! helpers match on the root cause.

use quill::error::{
    DriverError, MappingError, PrimaryKeyError, QueryError, ResolutionError, ResourceError,
    StorageError, TransactionError,
};
use quill::{StorageResult, TransactionState};

/// Asserts that the result failed with a missing row.
pub fn assert_not_found<T: std::fmt::Debug>(result: StorageResult<T>) {
    match result {
        Err(err) => assert!(
            matches!(err.root(), StorageError::Resource(ResourceError::NotFound { .. })),
            "Expected NotFound, got: {}",
            err
        ),
        Ok(value) => panic!("Expected NotFound, got: {:?}", value),
    }
}

/// Asserts that the result failed because no row matched a predicate.
pub fn assert_no_match<T: std::fmt::Debug>(result: StorageResult<T>) {
    match result {
        Err(err) => assert!(
            matches!(err.root(), StorageError::Resource(ResourceError::NoMatch { .. })),
            "Expected NoMatch, got: {}",
            err
        ),
        Ok(value) => panic!("Expected NoMatch, got: {:?}", value),
    }
}

/// Asserts that the result failed with an unregistered predicate.
pub fn assert_not_registered<T: std::fmt::Debug>(result: StorageResult<T>, predicate: &str) {
    match result {
        Err(err) => match err.root() {
            StorageError::Query(QueryError::NotRegistered { predicate: p }) => {
                assert_eq!(p, predicate)
            }
            other => panic!("Expected NotRegistered, got: {}", other),
        },
        Ok(value) => panic!("Expected NotRegistered, got: {:?}", value),
    }
}

/// Asserts that the result failed because the transaction already finished.
pub fn assert_already_finished<T: std::fmt::Debug>(
    result: StorageResult<T>,
    expected: TransactionState,
) {
    match result {
        Err(err) => match err.root() {
            StorageError::Transaction(TransactionError::AlreadyFinished { state }) => {
                assert_eq!(*state, expected)
            }
            other => panic!("Expected AlreadyFinished, got: {}", other),
        },
        Ok(value) => panic!("Expected AlreadyFinished, got: {:?}", value),
    }
}

/// Asserts that the result failed with an unsupported driver capability.
pub fn assert_unsupported<T: std::fmt::Debug>(result: StorageResult<T>) {
    match result {
        Err(err) => assert!(
            matches!(err.root(), StorageError::Driver(DriverError::Unsupported { .. })),
            "Expected Unsupported, got: {}",
            err
        ),
        Ok(value) => panic!("Expected Unsupported, got: {:?}", value),
    }
}

/// Returns the resolution error at the root of `err`.
pub fn resolution_cause(err: &StorageError) -> &ResolutionError {
    match err.root() {
        StorageError::Resolution(cause) => cause,
        other => panic!("Expected a resolution error, got: {}", other),
    }
}

/// Returns the mapping error at the root of `err`.
pub fn mapping_cause(err: &StorageError) -> &MappingError {
    match err.root() {
        StorageError::Mapping(cause) => cause,
        other => panic!("Expected a mapping error, got: {}", other),
    }
}

/// Returns the primary key error at the root of `err`.
pub fn primary_key_cause(err: &StorageError) -> &PrimaryKeyError {
    match err.root() {
        StorageError::PrimaryKey(cause) => cause,
        other => panic!("Expected a primary key error, got: {}", other),
    }
}

//! Models and driver setup used across tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use quill::backends::memory::{MemoryDriver, MemoryDriverConfig, PredicateError};
use quill::field::by_storage_name;
use quill::{Field, Model, ModelMetadata, Session, Value};

/// A person record with an integer key.
#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Person {
    #[quill(table = "people")]
    pub meta: ModelMetadata,
    #[quill(primary)]
    pub id: i64,
    pub name: String,
    pub age: i32,
}

impl Person {
    /// Creates an unsaved person.
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            age,
            ..Default::default()
        }
    }
}

/// A post record with a renamed column and a nullable field.
#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Post {
    #[quill(table = "posts")]
    pub meta: ModelMetadata,
    #[quill(primary)]
    pub id: i64,
    #[quill(column = "post_title")]
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Creates an unsaved post.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            content: None,
            created_at: fixed_time(),
            ..Default::default()
        }
    }
}

/// A fixed timestamp so records compare equal across runs.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
}

fn column_equals(row: &[Field], column: &str, args: &[Value]) -> Result<bool, PredicateError> {
    let expected = args
        .first()
        .ok_or_else(|| format!("predicate on {} needs one argument", column))?;
    Ok(by_storage_name(row, column).map(Field::value) == Some(expected))
}

/// Registers the predicates the tests query with.
pub fn register_predicates(driver: &MemoryDriver) {
    driver.register_predicate("title = $1", |row, args| {
        column_equals(row, "post_title", args)
    });
    driver.register_predicate("name = $1", |row, args| column_equals(row, "name", args));
    driver.register_predicate("age > $1", |row, args| {
        let min = args
            .first()
            .and_then(Value::as_int)
            .ok_or("age > $1 needs an integer argument")?;
        let age = by_storage_name(row, "age")
            .and_then(|f| f.value().as_int())
            .unwrap_or_default();
        Ok(age > min)
    });
}

/// Creates a memory driver with the test predicates registered.
pub fn memory_driver() -> Arc<MemoryDriver> {
    let driver = Arc::new(MemoryDriver::new());
    register_predicates(&driver);
    driver
}

/// Creates a memory driver with a custom configuration.
pub fn memory_driver_with(config: MemoryDriverConfig) -> Arc<MemoryDriver> {
    let driver = Arc::new(MemoryDriver::with_config(config));
    register_predicates(&driver);
    driver
}

/// Creates a session over a fresh memory driver, returning both.
pub fn create_session() -> (Session, Arc<MemoryDriver>) {
    let driver = memory_driver();
    let session = Session::with_driver(driver.clone());
    (session, driver)
}

/// Saves a person through the session and returns it with its key.
pub fn saved_person(session: &Session, name: &str, age: i32) -> Person {
    let mut person = Person::new(name, age);
    session.save(&mut person).expect("save person");
    person
}

//! Session CRUD tests against the memory driver.

mod common;

use std::sync::Arc;

use common::*;
use quill::backends::memory::ReceivedExec;
use quill::error::{DriverError, StorageError};
use quill::field::by_storage_name;
use quill::{Model, ModelMetadata, QueryContext, Session, TxToken, Value};

// ============================================================================
// End-to-end
// ============================================================================

/// Test the create, read, rename, read cycle on a single record.
#[test]
fn test_save_get_update_round_trip() {
    let (session, _driver) = create_session();

    let mut john = Person::new("John", 31);
    assert_eq!(john.id, 0);
    session.save(&mut john).unwrap();
    assert_ne!(john.id, 0, "save should backfill the assigned key");

    let loaded: Person = session.get(john.id).unwrap();
    assert_eq!(loaded, john);

    john.name = "John Smith".to_string();
    let id = john.id;
    session.save(&mut john).unwrap();
    assert_eq!(john.id, id, "update must keep the key");

    let reloaded: Person = session.get(id).unwrap();
    assert_eq!(reloaded.name, "John Smith");
    assert_eq!(reloaded.age, 31);
    assert_eq!(reloaded.id, id);
    assert_eq!(session.all::<Person>().unwrap().len(), 1);
}

// ============================================================================
// Create Tests
// ============================================================================

#[test]
fn test_keys_are_allocated_sequentially() {
    let (session, _driver) = create_session();
    let a = saved_person(&session, "A", 1);
    let b = saved_person(&session, "B", 2);
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
}

/// Test that renamed columns are what the driver stores.
#[test]
fn test_column_override_reaches_driver() {
    let (session, driver) = create_session();

    let mut post = Post::new("Hello");
    session.save(&mut post).unwrap();

    let rows = driver.rows("posts");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        by_storage_name(&rows[0], "post_title").map(|f| f.value()),
        Some(&Value::from("Hello"))
    );
    assert!(by_storage_name(&rows[0], "title").is_none());
}

#[test]
fn test_nullable_field_round_trip() {
    let (session, _driver) = create_session();

    let mut post = Post::new("Draft");
    session.save(&mut post).unwrap();
    let loaded: Post = session.get(post.id).unwrap();
    assert_eq!(loaded.content, None);
    assert_eq!(loaded.created_at, fixed_time());

    post.content = Some("body".to_string());
    session.save(&mut post).unwrap();
    let loaded: Post = session.get(post.id).unwrap();
    assert_eq!(loaded, post);
}

/// Test that a non-integer key is rejected by the memory driver.
#[test]
fn test_text_key_unsupported() {
    #[derive(Debug, Default, Model)]
    struct Tag {
        #[quill(table = "tags")]
        meta: ModelMetadata,
        #[quill(primary)]
        slug: String,
    }

    let (session, _driver) = create_session();
    assert_unsupported(session.save(&mut Tag::default()));
}

// ============================================================================
// Read Tests
// ============================================================================

#[test]
fn test_get_missing_record() {
    let (session, _driver) = create_session();
    let result = session.get::<Person>(42);
    let message = result.as_ref().unwrap_err().to_string();
    assert_eq!(
        message,
        "unable to get Person (people): record not found in people with id=42"
    );
    assert!(result.as_ref().unwrap_err().is_not_found());
    assert_not_found(result);
}

/// Test that all() returns rows in insertion order.
#[test]
fn test_all_preserves_insertion_order() {
    let (session, _driver) = create_session();
    for (name, age) in [("C", 3), ("A", 1), ("B", 2)] {
        saved_person(&session, name, age);
    }

    let names: Vec<_> = session
        .all::<Person>()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}

/// Test that ordering, grouping and paging are ignored by the memory driver.
#[test]
fn test_context_modifiers_ignored() {
    let (session, _driver) = create_session();
    for name in ["x", "y", "z"] {
        saved_person(&session, name, 1);
    }

    let ctx = QueryContext::new()
        .with_order("name DESC")
        .with_group("age")
        .with_limit(1)
        .with_skip(1);
    let people: Vec<Person> = session.query(ctx).all().unwrap();
    assert_eq!(people.len(), 3);
    assert_eq!(people[0].name, "x");
}

// ============================================================================
// Query Tests
// ============================================================================

#[test]
fn test_filter_and_first() {
    let (session, _driver) = create_session();
    saved_person(&session, "Ann", 20);
    saved_person(&session, "Bob", 35);
    saved_person(&session, "Cid", 50);

    let older: Vec<Person> = session.filter("age > $1", &[Value::Int(30)]).unwrap();
    let names: Vec<_> = older.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Cid"]);

    let bob: Person = session.first("name = $1", &[Value::from("Bob")]).unwrap();
    assert_eq!(bob.age, 35);

    let first_older: Person = session.first("age > $1", &[Value::Int(30)]).unwrap();
    assert_eq!(first_older.name, "Bob");

    assert_no_match(session.first::<Person>("name = $1", &[Value::from("Zed")]));
    assert!(
        session
            .filter::<Person>("name = $1", &[Value::from("Zed")])
            .unwrap()
            .is_empty()
    );
}

/// Test that unknown predicates fail instead of returning nothing.
#[test]
fn test_unregistered_predicate() {
    let (session, _driver) = create_session();
    saved_person(&session, "Ann", 20);

    assert_not_registered(
        session.filter::<Person>("name LIKE $1", &[Value::from("A%")]),
        "name LIKE $1",
    );
    assert_not_registered(
        session.first::<Person>("name LIKE $1", &[Value::from("A%")]),
        "name LIKE $1",
    );
    assert_not_registered(
        session
            .query(QueryContext::new().with_limit(1))
            .first::<Person>("id IN $1", &[]),
        "id IN $1",
    );
}

#[test]
fn test_predicate_error_surfaces() {
    let (session, _driver) = create_session();
    saved_person(&session, "Ann", 20);

    let err = session
        .filter::<Person>("age > $1", &[Value::from("old")])
        .unwrap_err();
    assert!(matches!(
        err.root(),
        StorageError::Driver(DriverError::Failed { .. })
    ));
}

// ============================================================================
// Remove Tests
// ============================================================================

#[test]
fn test_remove() {
    let (session, _driver) = create_session();
    let ann = saved_person(&session, "Ann", 20);
    let bob = saved_person(&session, "Bob", 30);

    session.remove(&ann).unwrap();
    assert_not_found(session.get::<Person>(ann.id));
    assert_not_found(session.remove(&ann));

    let remaining = session.all::<Person>().unwrap();
    assert_eq!(remaining, vec![bob]);
}

/// Test that updating a record that was never stored fails.
#[test]
fn test_update_missing_record() {
    let (session, _driver) = create_session();
    let mut ghost = Person::new("Ghost", 1);
    ghost.id = 77;
    assert_not_found(session.save(&mut ghost));
}

// ============================================================================
// Exec and Registry Tests
// ============================================================================

#[test]
fn test_exec_pass_through() {
    let (session, driver) = create_session();

    session
        .exec("DELETE FROM people WHERE age < $1", &[Value::Int(18)])
        .unwrap();
    assert_eq!(
        driver.last_exec(),
        Some(ReceivedExec {
            tx: TxToken::None,
            statement: "DELETE FROM people WHERE age < $1".to_string(),
            args: vec![Value::Int(18)],
        })
    );

    let tx = session.begin().unwrap();
    tx.exec("VACUUM", &[]).unwrap();
    let received = driver.last_exec().unwrap();
    assert_eq!(&received.tx, tx.token());
    assert_eq!(received.statement, "VACUUM");
}

/// Test that reconfiguring swaps the driver for every clone of a session.
#[test]
fn test_reconfigure_switches_driver() {
    let (session, first) = create_session();
    let other_handle = session.clone();
    saved_person(&session, "Ann", 20);

    let second = memory_driver();
    session.configure(second.clone());

    assert!(other_handle.all::<Person>().unwrap().is_empty());
    saved_person(&other_handle, "Bob", 30);
    assert_eq!(first.rows("people").len(), 1);
    assert_eq!(second.rows("people").len(), 1);
}

#[test]
fn test_shared_registry() {
    let driver = memory_driver();
    let registry = Arc::new(quill::DriverRegistry::new(driver));
    let a = Session::new(registry.clone());
    let b = Session::new(registry);

    let ann = saved_person(&a, "Ann", 20);
    let loaded: Person = b.get(ann.id).unwrap();
    assert_eq!(loaded, ann);
}

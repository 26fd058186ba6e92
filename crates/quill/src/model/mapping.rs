//! Moving values between records and field lists.

use crate::error::MappingError;
use crate::field::{Field, Row};

use super::{Model, ModelDescriptor};

/// Reads every declared field of `record`, in descriptor order.
pub fn extract<M: Model>(record: &M, descriptor: &ModelDescriptor) -> Result<Row, MappingError> {
    descriptor
        .fields()
        .iter()
        .map(|field| {
            record
                .field_value(field.name())
                .map(|value| field.with_value(value))
                .ok_or_else(|| MappingError::FieldNotFound {
                    type_name: descriptor.type_name(),
                    field: field.name().to_string(),
                })
        })
        .collect()
}

/// Writes each incoming field value onto the matching field of `record`.
///
/// The values are treated as stored data, so read-only fields are assigned too.
pub fn populate<M: Model>(record: &mut M, fields: Row) -> Result<(), MappingError> {
    for field in fields {
        let name = field.name();
        record.load_field(name, field.into_value())?;
    }
    Ok(())
}

/// Returns the primary field carrying the record's current key.
pub fn primary_field_of<M: Model>(record: &M, primary: &Field) -> Result<Field, MappingError> {
    record
        .field_value(primary.name())
        .map(|value| primary.with_value(value))
        .ok_or_else(|| MappingError::FieldNotFound {
            type_name: short_type_name::<M>(),
            field: primary.name().to_string(),
        })
}

/// Returns true if the record's primary key is still the zero value.
pub fn is_new<M: Model>(record: &M, primary: &Field) -> Result<bool, MappingError> {
    primary_field_of(record, primary).map(|field| field.is_zero())
}

/// Builds one record per row and appends them to `target` in row order.
pub fn populate_rows<M: Model>(target: &mut Vec<M>, rows: Vec<Row>) -> Result<(), MappingError> {
    target.reserve(rows.len());
    for row in rows {
        let mut record = M::default();
        populate(&mut record, row)?;
        target.push(record);
    }
    Ok(())
}

fn short_type_name<M>() -> &'static str {
    let full = std::any::type_name::<M>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDecl, ModelShape};
    use crate::value::{FieldValue, Value};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Note {
        id: i64,
        body: String,
        version: i32,
    }

    impl Model for Note {
        fn shape() -> ModelShape {
            ModelShape::record("Note")
                .with_table("notes")
                .with_field(FieldDecl::of::<i64>("id").primary())
                .with_field(FieldDecl::of::<String>("body"))
                .with_field(FieldDecl::of::<i32>("version").readonly())
        }

        fn field_value(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(self.id.to_value()),
                "body" => Some(self.body.to_value()),
                "version" => Some(self.version.to_value()),
                _ => None,
            }
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<(), MappingError> {
            if name == "version" {
                return Err(MappingError::FieldNotSettable {
                    type_name: "Note",
                    field: name.to_string(),
                });
            }
            self.load_field(name, value)
        }

        fn load_field(&mut self, name: &str, value: Value) -> Result<(), MappingError> {
            let mismatch = |source| MappingError::TypeMismatch {
                type_name: "Note",
                field: name.to_string(),
                source,
            };
            match name {
                "id" => self.id = i64::from_value(value).map_err(mismatch)?,
                "body" => self.body = String::from_value(value).map_err(mismatch)?,
                "version" => self.version = i32::from_value(value).map_err(mismatch)?,
                _ => {
                    return Err(MappingError::FieldNotFound {
                        type_name: "Note",
                        field: name.to_string(),
                    });
                }
            }
            Ok(())
        }
    }

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::of::<Note>().unwrap()
    }

    #[test]
    fn test_extract_reads_in_order() {
        let note = Note {
            id: 4,
            body: "hello".to_string(),
            version: 2,
        };
        let row = extract(&note, &descriptor()).unwrap();

        let values: Vec<_> = row.iter().map(|f| f.value().clone()).collect();
        assert_eq!(
            values,
            vec![Value::Int(4), Value::from("hello"), Value::Int(2)]
        );
        assert!(row[0].is_primary());
    }

    #[test]
    fn test_populate_errors() {
        let d = descriptor();
        let mut note = Note::default();

        let err = populate(&mut note, vec![d.fields()[1].with_value(9)]).unwrap_err();
        assert!(matches!(err, MappingError::TypeMismatch { .. }));

        let stray = Field::new("author", crate::value::FieldType::Text).with_value("x");
        let err = populate(&mut note, vec![stray]).unwrap_err();
        assert_eq!(
            err,
            MappingError::FieldNotFound {
                type_name: "Note",
                field: "author".to_string()
            }
        );
    }

    #[test]
    fn test_populate_assigns_readonly() {
        let d = descriptor();
        let mut note = Note::default();

        populate(&mut note, vec![d.fields()[2].with_value(3)]).unwrap();
        assert_eq!(note.version, 3);

        let err = note.set_field("version", Value::Int(4)).unwrap_err();
        assert!(matches!(err, MappingError::FieldNotSettable { .. }));
        assert_eq!(note.version, 3);
    }

    #[test]
    fn test_is_new_tracks_primary_zero() {
        let d = descriptor();
        let primary = d.primary().unwrap();

        let mut note = Note::default();
        assert!(is_new(&note, primary).unwrap());
        note.id = 12;
        assert!(!is_new(&note, primary).unwrap());
        assert_eq!(
            primary_field_of(&note, primary).unwrap().value(),
            &Value::Int(12)
        );
    }

    #[test]
    fn test_populate_rows_preserves_order() {
        let d = descriptor();
        let rows = vec![
            vec![d.fields()[0].with_value(1), d.fields()[1].with_value("a")],
            vec![d.fields()[0].with_value(2), d.fields()[1].with_value("b")],
        ];

        let mut notes = vec![Note {
            id: 99,
            ..Default::default()
        }];
        populate_rows(&mut notes, rows).unwrap();

        let ids: Vec<_> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![99, 1, 2]);
        assert_eq!(notes[2].body, "b");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Note>(), "Note");
    }
}

use crate::error::{PrimaryKeyError, ResolutionError};
use crate::field::Field;

use super::{Model, ModelShape, ShapeKind};

/// Resolved table metadata for a record type.
///
/// Built once per type and read-only afterwards. Two resolutions of the same
/// shape are always equal, which is what makes [`DescriptorCache`](super::DescriptorCache)
/// safe.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    type_name: &'static str,
    table: &'static str,
    fields: Vec<Field>,
    primary: Option<Field>,
}

impl ModelDescriptor {
    /// Resolves a declared shape.
    ///
    /// Fails if the shape is not a named-field struct, has no `ModelMetadata`
    /// marker, has a marker without a table name, or marks more than one
    /// field primary. A missing primary field is not an error here; see
    /// [`ModelDescriptor::primary`].
    pub fn resolve(shape: &ModelShape) -> Result<Self, ResolutionError> {
        let type_name = shape.type_name;

        if shape.kind != ShapeKind::Record {
            return Err(ResolutionError::NotAStruct { type_name });
        }

        let marker = shape
            .table
            .ok_or(ResolutionError::MissingMetadataMarker { type_name })?;
        let table = match marker.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ResolutionError::MissingTableName { type_name }),
        };

        let mut fields = Vec::with_capacity(shape.fields.len());
        let mut primary: Option<Field> = None;

        for decl in &shape.fields {
            let field = Field::new(decl.name, decl.ty)
                .with_storage_name(decl.column.unwrap_or(decl.name))
                .with_primary(decl.primary)
                .with_nullable(decl.nullable);

            if decl.primary {
                if let Some(first) = &primary {
                    return Err(ResolutionError::DuplicatePrimaryField {
                        type_name,
                        first: first.name(),
                        second: decl.name,
                    });
                }
                primary = Some(field.clone());
            }

            fields.push(field);
        }

        Ok(Self {
            type_name,
            table,
            fields,
            primary,
        })
    }

    /// Resolves the shape of `M`.
    pub fn of<M: Model>() -> Result<Self, ResolutionError> {
        Self::resolve(&M::shape())
    }

    /// Returns the Rust type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the table name.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Returns the stored fields in declaration order, without values.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the declared field with the given logical name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the primary field, failing if none is declared.
    pub fn primary(&self) -> Result<&Field, PrimaryKeyError> {
        self.primary.as_ref().ok_or(PrimaryKeyError::NoPrimaryField {
            type_name: self.type_name,
        })
    }

    /// Returns a label of the form `Type (table)` for error context.
    pub fn label(&self) -> String {
        format!("{} ({})", self.type_name, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDecl;
    use crate::value::FieldType;

    fn post_shape() -> ModelShape {
        ModelShape::record("Post")
            .with_table("posts")
            .with_field(FieldDecl::new("id", FieldType::Int).primary())
            .with_field(FieldDecl::new("title", FieldType::Text).column("post_title"))
            .with_field(FieldDecl::new("created_at", FieldType::Timestamp))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Test that fields keep declaration order and storage names resolve.
    #[test]
    fn test_resolve_orders_fields() {
        let descriptor = ModelDescriptor::resolve(&post_shape()).unwrap();

        assert_eq!(descriptor.table(), "posts");
        let names: Vec<_> = descriptor.fields().iter().map(Field::name).collect();
        assert_eq!(names, vec!["id", "title", "created_at"]);
        let columns: Vec<_> = descriptor
            .fields()
            .iter()
            .map(Field::storage_name)
            .collect();
        assert_eq!(columns, vec!["id", "post_title", "created_at"]);
        assert_eq!(descriptor.primary().unwrap().name(), "id");
        assert_eq!(descriptor.label(), "Post (posts)");
    }

    /// Test that resolving the same shape twice yields identical descriptors.
    #[test]
    fn test_resolve_is_deterministic() {
        let a = ModelDescriptor::resolve(&post_shape()).unwrap();
        let b = ModelDescriptor::resolve(&post_shape()).unwrap();
        assert_eq!(a, b);
    }

    /// Test that non-record shapes are rejected before anything else.
    #[test]
    fn test_resolve_rejects_non_struct() {
        let shape = post_shape().with_kind(ShapeKind::Enum);
        assert_eq!(
            ModelDescriptor::resolve(&shape),
            Err(ResolutionError::NotAStruct { type_name: "Post" })
        );

        let shape = ModelShape::record("Pair").with_kind(ShapeKind::Tuple);
        assert_eq!(
            ModelDescriptor::resolve(&shape),
            Err(ResolutionError::NotAStruct { type_name: "Pair" })
        );
    }

    #[test]
    fn test_resolve_requires_marker_and_table() {
        let shape = ModelShape::record("Loose");
        assert_eq!(
            ModelDescriptor::resolve(&shape),
            Err(ResolutionError::MissingMetadataMarker { type_name: "Loose" })
        );

        let shape = ModelShape::record("Loose").with_bare_marker();
        assert_eq!(
            ModelDescriptor::resolve(&shape),
            Err(ResolutionError::MissingTableName { type_name: "Loose" })
        );

        let shape = ModelShape::record("Loose").with_table("");
        assert_eq!(
            ModelDescriptor::resolve(&shape),
            Err(ResolutionError::MissingTableName { type_name: "Loose" })
        );
    }

    // ========================================================================
    // Primary key
    // ========================================================================

    /// Test that a missing primary is only reported when asked for.
    #[test]
    fn test_missing_primary_is_lazy() {
        let shape = ModelShape::record("Summary")
            .with_table("summaries")
            .with_field(FieldDecl::new("total", FieldType::Int));

        let descriptor = ModelDescriptor::resolve(&shape).unwrap();
        assert_eq!(descriptor.fields().len(), 1);
        assert_eq!(
            descriptor.primary(),
            Err(PrimaryKeyError::NoPrimaryField {
                type_name: "Summary"
            })
        );
    }

    #[test]
    fn test_duplicate_primary_rejected() {
        let shape = post_shape().with_field(FieldDecl::new("slug", FieldType::Text).primary());
        assert_eq!(
            ModelDescriptor::resolve(&shape),
            Err(ResolutionError::DuplicatePrimaryField {
                type_name: "Post",
                first: "id",
                second: "slug",
            })
        );
    }
}

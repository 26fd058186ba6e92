use syn::{Attribute, LitStr, Type};

///
/// QuillAttrs
///
/// Everything a field may declare through `#[quill(...)]`.
///

#[derive(Default)]
pub struct QuillAttrs {
    pub table: Option<LitStr>,
    pub column: Option<LitStr>,
    pub primary: bool,
    pub readonly: bool,
    pub skip: bool,
}

impl QuillAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("quill")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    out.table = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("column") {
                    out.column = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("primary") {
                    out.primary = true;
                } else if meta.path.is_ident("readonly") {
                    out.readonly = true;
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                } else {
                    return Err(meta.error(
                        "unsupported quill attribute, expected one of: table, column, primary, readonly, skip",
                    ));
                }
                Ok(())
            })?;
        }

        Ok(out)
    }

    pub fn has_field_options(&self) -> bool {
        self.column.is_some() || self.primary || self.readonly || self.skip
    }
}

// is_marker
// true when the field's type path ends in `ModelMetadata`
pub fn is_marker(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "ModelMetadata"),
        _ => false,
    }
}

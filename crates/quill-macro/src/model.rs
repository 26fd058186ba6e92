use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, LitStr};

use crate::attrs::{QuillAttrs, is_marker};

// derive_model
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

///
/// StoredField
///
/// A named field that takes part in storage.
///

struct StoredField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    attrs: QuillAttrs,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let type_name = ident.to_string();

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => return Ok(opaque_impl(input, quote!(Tuple))),
        },
        Data::Enum(_) => return Ok(opaque_impl(input, quote!(Enum))),
        Data::Union(_) => {
            return Err(Error::new_spanned(
                ident,
                "Model cannot be derived for unions",
            ));
        }
    };

    let mut marker: Option<Option<LitStr>> = None;
    let mut stored = Vec::new();

    for field in named {
        let field_ident = field.ident.as_ref().expect("named field");
        let attrs = QuillAttrs::parse(&field.attrs)?;

        if is_marker(&field.ty) {
            if marker.is_some() {
                return Err(Error::new_spanned(
                    field,
                    "only one ModelMetadata marker is allowed per model",
                ));
            }
            if attrs.has_field_options() {
                return Err(Error::new_spanned(
                    field,
                    "the ModelMetadata marker only accepts #[quill(table = \"...\")]",
                ));
            }
            marker = Some(attrs.table);
            continue;
        }

        if attrs.table.is_some() {
            return Err(Error::new_spanned(
                field,
                "#[quill(table = \"...\")] belongs on the ModelMetadata marker field",
            ));
        }
        if attrs.skip {
            continue;
        }

        stored.push(StoredField {
            ident: field_ident,
            ty: &field.ty,
            attrs,
        });
    }

    let table = match marker {
        None => quote!(::core::option::Option::None),
        Some(None) => quote! {
            ::core::option::Option::Some(::quill::model::TableMarker {
                name: ::core::option::Option::None,
            })
        },
        Some(Some(name)) => quote! {
            ::core::option::Option::Some(::quill::model::TableMarker {
                name: ::core::option::Option::Some(#name),
            })
        },
    };

    let decls = stored.iter().map(|field| {
        let name = field.ident.to_string();
        let ty = field.ty;
        let column = field.attrs.column.as_ref().map(|c| quote!(.column(#c)));
        let primary = field.attrs.primary.then(|| quote!(.primary()));
        let readonly = field.attrs.readonly.then(|| quote!(.readonly()));

        quote! {
            ::quill::model::FieldDecl::of::<#ty>(#name) #column #primary #readonly
        }
    });

    let get_arms = stored.iter().map(|field| {
        let name = field.ident.to_string();
        let field_ident = field.ident;

        quote! {
            #name => ::core::option::Option::Some(
                ::quill::value::FieldValue::to_value(&self.#field_ident)
            ),
        }
    });

    let load_arms = stored.iter().map(|field| {
        let name = field.ident.to_string();
        let field_ident = field.ident;
        let ty = field.ty;

        quote! {
            #name => {
                self.#field_ident = <#ty as ::quill::value::FieldValue>::from_value(value)
                    .map_err(|source| ::quill::error::MappingError::TypeMismatch {
                        type_name: #type_name,
                        field: ::std::string::ToString::to_string(name),
                        source,
                    })?;
                ::core::result::Result::Ok(())
            }
        }
    });

    // readonly fields refuse caller writes but still load from storage
    let readonly_names = stored
        .iter()
        .filter(|field| field.attrs.readonly)
        .map(|field| field.ident.to_string())
        .collect::<Vec<_>>();
    let readonly_arm = (!readonly_names.is_empty()).then(|| {
        quote! {
            #(#readonly_names)|* => ::core::result::Result::Err(
                ::quill::error::MappingError::FieldNotSettable {
                    type_name: #type_name,
                    field: ::std::string::ToString::to_string(name),
                }
            ),
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::quill::model::Model for #ident #ty_generics #where_clause {
            fn shape() -> ::quill::model::ModelShape {
                ::quill::model::ModelShape {
                    type_name: #type_name,
                    kind: ::quill::model::ShapeKind::Record,
                    table: #table,
                    fields: ::std::vec![#(#decls),*],
                }
            }

            fn field_value(&self, name: &str) -> ::core::option::Option<::quill::value::Value> {
                match name {
                    #(#get_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::quill::value::Value,
            ) -> ::core::result::Result<(), ::quill::error::MappingError> {
                match name {
                    #readonly_arm
                    _ => ::quill::model::Model::load_field(self, name, value),
                }
            }

            #[allow(unused_variables)]
            fn load_field(
                &mut self,
                name: &str,
                value: ::quill::value::Value,
            ) -> ::core::result::Result<(), ::quill::error::MappingError> {
                match name {
                    #(#load_arms)*
                    _ => ::core::result::Result::Err(
                        ::quill::error::MappingError::FieldNotFound {
                            type_name: #type_name,
                            field: ::std::string::ToString::to_string(name),
                        }
                    ),
                }
            }
        }
    })
}

// opaque_impl
// tuple structs and enums get a shape that fails resolution as NotAStruct
fn opaque_impl(input: &DeriveInput, kind: TokenStream) -> TokenStream {
    let ident = &input.ident;
    let type_name = ident.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics ::quill::model::Model for #ident #ty_generics #where_clause {
            fn shape() -> ::quill::model::ModelShape {
                ::quill::model::ModelShape {
                    type_name: #type_name,
                    kind: ::quill::model::ShapeKind::#kind,
                    table: ::core::option::Option::None,
                    fields: ::std::vec::Vec::new(),
                }
            }

            fn field_value(&self, _name: &str) -> ::core::option::Option<::quill::value::Value> {
                ::core::option::Option::None
            }

            fn set_field(
                &mut self,
                name: &str,
                _value: ::quill::value::Value,
            ) -> ::core::result::Result<(), ::quill::error::MappingError> {
                ::core::result::Result::Err(::quill::error::MappingError::FieldNotFound {
                    type_name: #type_name,
                    field: ::std::string::ToString::to_string(name),
                })
            }
        }
    }
}

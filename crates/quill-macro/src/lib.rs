//! Derive macro for quill models.
//!
//! ```ignore
//! #[derive(Default, Model)]
//! struct Post {
//!     #[quill(table = "posts")]
//!     meta: ModelMetadata,
//!     #[quill(primary)]
//!     id: i64,
//!     #[quill(column = "post_title")]
//!     title: String,
//!     #[quill(readonly)]
//!     created_at: DateTime<Utc>,
//!     #[quill(skip)]
//!     cached_len: usize,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod model;

/// Derives `quill::Model`.
///
/// Field attributes:
/// - `#[quill(table = "...")]` on the `ModelMetadata` marker names the table
/// - `#[quill(primary)]` marks the primary key
/// - `#[quill(column = "...")]` overrides the storage name
/// - `#[quill(readonly)]` rejects assignment through `set_field`; values read
///   back from storage are still loaded
/// - `#[quill(skip)]` leaves the field out of storage
#[proc_macro_derive(Model, attributes(quill))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input.into()).into()
}

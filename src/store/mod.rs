//! Snippet persistence.
//!
//! The store owns every SQL statement in the application and classifies
//! failures into the one distinction handlers care about: "no such row"
//! ([`StoreError::NotFound`]) versus everything else
//! ([`StoreError::Storage`]).

mod snippets;

pub use snippets::{Snippet, SnippetStore, StoreError};

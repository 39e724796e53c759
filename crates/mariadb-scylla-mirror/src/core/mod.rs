//! Core abstractions for the mirror setup engine.
//!
//! - [`schema`]: table and column metadata produced by introspection
//! - [`identifier`]: validated identifier quoting and literal escaping
//! - [`traits`]: client seams for the source catalog and target store
//!
//! All statement synthesis builds on `identifier` so that DDL/DML text is
//! escaped by construction rather than by ad-hoc interpolation.

pub mod identifier;
pub mod schema;
pub mod traits;

pub use schema::{Column, Table};
pub use traits::{SourceCatalog, TargetStore};

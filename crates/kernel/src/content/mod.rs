//! Content read module.
//!
//! This module provides:
//! - ContentTypeRegistry: content type and component definitions
//! - ReadQuery: parsed parameters of a content API read
//! - EntryService: filtered, paged, populated reads

mod entry_service;
mod read_query;
mod type_registry;

pub use entry_service::{EntryPage, EntryService};
pub use read_query::{ReadLimits, ReadQuery};
pub use type_registry::{ContentTypeRegistry, SchemaError, SchemaOwner};

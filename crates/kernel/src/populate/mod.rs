//! Relation and component population.
//!
//! - [`PopulateTree`]: the populate paths of one request, merged
//! - [`PopulationEngine`]: validates a tree against the schema and expands
//!   root entries under a publication filter

mod engine;
mod path;

pub use engine::{PUBLISHED_AT, PopulatePlan, PopulatedEntry, PopulationEngine};
pub use path::{POPULATE_PARAM, PopulateTree};

//! Vellum SDK
//!
//! Schema types shared between the kernel and anything that defines
//! content: content types, components, and their field definitions.

pub mod types;

pub mod prelude {
    pub use crate::types::*;
}

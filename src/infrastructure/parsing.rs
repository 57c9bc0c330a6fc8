//! HTML extraction infrastructure for wishlist pages
//!
//! Trait-based parsing: selectors are compiled once from configuration and
//! run against a single DOM snapshot per extraction pass.

pub mod config;
pub mod context;
pub mod field_extractor;
pub mod numeric;

// Re-export public types
pub use config::{FieldSelector, Projection, SelectorConfig};
pub use context::ExtractionContext;
pub use field_extractor::{CompiledField, FieldExtractor, extract_field};

use scraper::Html;

use crate::infrastructure::harvest_error::HarvestResult;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse HTML with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> HarvestResult<Self::Output>;
}

/// Validation trait for extracted results
pub trait Validator<T> {
    type Output;

    /// Check extracted data before it is assembled
    fn validate(&self, data: &T) -> HarvestResult<Self::Output>;
}

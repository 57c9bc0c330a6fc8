//! Wishlist Harvest - wishlist extraction and validation pipeline
//!
//! Scrolls an infinitely-loading wishlist page until its items materialize,
//! extracts every item attribute as an independent DOM sequence, verifies
//! that all sequences line up, and assembles an immutable snapshot.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod cli;
pub mod test_utils;

// Re-export the pipeline surface for easier access
pub use application::{EventHandler, HandlerResponse, HarvestEvent, WishlistHarvester};
pub use domain::{WishlistItem, WishlistSnapshot};
pub use infrastructure::{Document, HarvestConfig, HarvestError, HarvestResult};

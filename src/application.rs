//! Application layer - the harvest pipeline and its entry points
//!
//! Stages are plain structs composed by [`WishlistHarvester`]; the
//! [`EventHandler`] wraps the harvester in the request/response contract.

pub mod consistency_validator;
pub mod event_handler;
pub mod harvester;
pub mod record_assembler;
pub mod scroll_driver;
pub mod validated_config;

// Re-export commonly used items
pub use consistency_validator::ConsistencyValidator;
pub use event_handler::{EventHandler, HandlerResponse, HarvestEvent, status_for};
pub use harvester::WishlistHarvester;
pub use record_assembler::RecordAssembler;
pub use scroll_driver::{ScrollDriver, ScrollOutcome};
pub use validated_config::ValidatedScrollSettings;

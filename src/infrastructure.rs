//! Infrastructure layer: configuration, logging, errors, DOM extraction and
//! the document handles the pipeline runs against.

pub mod browser;
pub mod config;
pub mod document;
pub mod harvest_error;
pub mod logging;
pub mod parsing;
pub mod scripted_document;

// Re-export commonly used items
pub use browser::{ChromiumDocument, ChromiumSession};
pub use config::{ConfigError, ConfigLoader, HarvestConfig, LoggingConfig, ScrollStep, ViewportConfig};
pub use document::{Document, PageOpener};
pub use harvest_error::{HarvestError, HarvestResult};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{FieldExtractor, FieldSelector, Projection, SelectorConfig};
pub use scripted_document::{DocumentCall, ReplayOpener, ScriptedDocument};

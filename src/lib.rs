pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::LocalStorage;
pub use app::pipelines::DocumentPipeline;
pub use self::core::{extract_domains, DocumentScanner, ScanEngine};
pub use domain::model::{Domain, DomainSet, OcrMode, OcrOutcome, ScanReport};
pub use utils::error::{Result, ScanError};

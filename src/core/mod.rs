pub mod engine;
pub mod extractor;
pub mod ocr;
pub mod scan;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use engine::ScanEngine;
pub use extractor::{extract_domains, normalize_hostname, scan_text};
pub use scan::DocumentScanner;

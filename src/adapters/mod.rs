// Adapters layer: concrete implementations for external systems (files, PDF/XLSX parsers, OCR tools).

pub mod ocr;
pub mod pdf;
pub mod spreadsheet;
pub mod storage;

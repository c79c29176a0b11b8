use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// A normalized hostname: lowercase, no trailing dot, no `www.` prefix, no port.
///
/// Only [`crate::core::extractor::normalize_hostname`] builds one, so every
/// value in a [`DomainSet`] went through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub(crate) fn from_normalized(host: String) -> Self {
        Self(host)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique domains, always iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSet(BTreeSet<Domain>);

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: Domain) -> bool {
        self.0.insert(domain)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().map(|d| d.as_str().to_string()).collect()
    }

    /// One domain per line, with a single trailing newline when non-empty.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for domain in &self.0 {
            out.push_str(domain.as_str());
            out.push('\n');
        }
        out
    }
}

impl FromIterator<Domain> for DomainSet {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DomainSet {
    type Item = Domain;
    type IntoIter = std::collections::btree_set::IntoIter<Domain>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Spreadsheet,
    Text,
}

impl DocumentKind {
    /// Lowercased extension including the dot, e.g. `.pdf`; empty when absent.
    pub fn extension_of(file_name: &str) -> String {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default()
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        match Self::extension_of(file_name).as_str() {
            ".pdf" => Some(DocumentKind::Pdf),
            ".xlsx" | ".xls" => Some(DocumentKind::Spreadsheet),
            ".txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// When the OCR fallback is allowed to run for a PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrMode {
    /// Only when the native text layer yields no domains.
    #[default]
    Auto,
    /// Always, in addition to the native text.
    Force,
    Off,
}

/// Result of recognizing one page, or a whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OcrOutcome {
    Success { text: String },
    Failure { reason: String },
}

impl OcrOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OcrOutcome::Success { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            OcrOutcome::Success { text } => Some(text),
            OcrOutcome::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            OcrOutcome::Success { .. } => None,
            OcrOutcome::Failure { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrReport {
    pub outcome: OcrOutcome,
    pub pages_total: usize,
    pub pages_recognized: usize,
}

impl OcrReport {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            outcome: OcrOutcome::Failure {
                reason: reason.into(),
            },
            pages_total: 0,
            pages_recognized: 0,
        }
    }
}

/// Everything read out of one uploaded document before domain extraction.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub kind: DocumentKind,
    pub native_text: String,
    pub page_count: usize,
    pub ocr: Option<OcrReport>,
}

impl ExtractedDocument {
    /// Native text followed by the OCR text, when OCR produced any.
    pub fn combined_text(&self) -> String {
        match self.ocr.as_ref().and_then(|r| r.outcome.text()) {
            Some(ocr_text) if !ocr_text.is_empty() => {
                let mut text = String::with_capacity(self.native_text.len() + ocr_text.len() + 1);
                text.push_str(&self.native_text);
                text.push('\n');
                text.push_str(ocr_text);
                text
            }
            _ => self.native_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub file_name: String,
    pub kind: DocumentKind,
    pub urls_found: Vec<String>,
    pub domains: DomainSet,
    pub text_preview: String,
    pub ocr: Option<OcrReport>,
}

/// Emitted while a single document is being scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    NativeTextExtracted { chars: usize, pages: usize },
    OcrStarted { reason: String },
    PagesRendered { converter: String, pages: usize },
    PageRecognized { page: usize, total: usize, chars: usize },
    PageFailed { page: usize, total: usize, reason: String },
    OcrFinished { success: bool, pages_recognized: usize },
    DomainsExtracted { count: usize },
}

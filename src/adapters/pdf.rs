use crate::utils::error::{Result, ScanError};

/// Text layer of a PDF plus its page count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfText {
    pub text: String,
    pub page_count: usize,
}

/// Native text via `pdf-extract`. The parser can panic on malformed input,
/// so the panic is caught and reported as an ordinary error.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ScanError::PdfError {
            message: e.to_string(),
        }),
        Err(panic) => {
            let message = panic
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "pdf parser panicked".to_string());
            Err(ScanError::PdfError { message })
        }
    }
}

pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| ScanError::PdfError {
        message: e.to_string(),
    })?;
    Ok(document.get_pages().len())
}

/// Never fails: an unreadable text layer becomes empty text so that the OCR
/// fallback still gets a chance.
pub fn read_pdf(bytes: &[u8]) -> PdfText {
    let text = extract_text(bytes).unwrap_or_else(|e| {
        tracing::warn!("⚠️ PDF text extraction failed, continuing without text layer: {}", e);
        String::new()
    });

    let page_count = page_count(bytes).unwrap_or_else(|e| {
        tracing::debug!("Could not count PDF pages: {}", e);
        0
    });

    PdfText { text, page_count }
}

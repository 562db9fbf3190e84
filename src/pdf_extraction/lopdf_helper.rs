// lopdf backend - Pure Rust PDF text, always available
use lopdf::Document;
use std::path::Path;

use super::{ExtractionError, PdfDocument, TextBackend};

const NAME: &str = "lopdf";

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

/// Load a PDF document using lopdf
pub fn load_pdf(path: &Path) -> Result<Document, ExtractionError> {
    Document::load(path).map_err(|e| ExtractionError::Open {
        backend: NAME,
        reason: e.to_string(),
    })
}

struct LopdfDocument {
    document: Document,
    // lopdf numbers pages from 1, in tree order
    page_numbers: Vec<u32>,
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractionError> {
        let number = *self.page_numbers.get(index).ok_or_else(|| ExtractionError::Page {
            page: index + 1,
            reason: "no such page".into(),
        })?;
        self.document
            .extract_text(&[number])
            .map_err(|e| ExtractionError::Page {
                page: index + 1,
                reason: e.to_string(),
            })
    }
}

impl TextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> bool {
        true
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError> {
        let document = load_pdf(path)?;
        let page_numbers = document.get_pages().into_keys().collect();
        Ok(Box::new(LopdfDocument { document, page_numbers }))
    }
}

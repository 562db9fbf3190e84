// PDF text extraction: bounded page sampling over ranked backends
pub mod extraction_router;
pub mod lopdf_helper;
pub mod pdftotext;

pub use extraction_router::{BackendKind, ExtractionRouter};
pub use lopdf_helper::LopdfBackend;
pub use pdftotext::PdftotextBackend;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{backend} is not available")]
    Unavailable { backend: &'static str },

    #[error("{backend} could not open the document: {reason}")]
    Open { backend: &'static str, reason: String },

    #[error("page {page} unreadable: {reason}")]
    Page { page: usize, reason: String },

    #[error("no backend could open {path}")]
    Unreadable { path: String },
}

/// An open document. Dropping it releases whatever the backend holds.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Raw text of the zero-based page `index`.
    fn page_text(&self, index: usize) -> Result<String, ExtractionError>;
}

/// A way of turning a file into a [`PdfDocument`].
pub trait TextBackend {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderReason {
    /// No backend could open the document.
    Unreadable,
    /// The document opened but the sampled pages carried no text.
    NoText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOrigin {
    Pages {
        backend: &'static str,
        pages: Vec<usize>,
    },
    Placeholder(PlaceholderReason),
}

/// Bounded, never-empty text handed to the feature encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSample {
    pub text: String,
    pub origin: SampleOrigin,
}

impl TextSample {
    pub fn placeholder(reason: PlaceholderReason) -> Self {
        Self {
            text: config::PLACEHOLDER_TEXT.to_string(),
            origin: SampleOrigin::Placeholder(reason),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, SampleOrigin::Placeholder(_))
    }

    pub fn is_unreadable(&self) -> bool {
        self.origin == SampleOrigin::Placeholder(PlaceholderReason::Unreadable)
    }

    pub fn preview(&self, max_chars: usize) -> &str {
        truncate_chars(&self.text, max_chars)
    }
}

pub struct Extractor<'a> {
    router: &'a ExtractionRouter,
    max_pages: usize,
    max_chars: usize,
}

impl<'a> Extractor<'a> {
    pub fn new(router: &'a ExtractionRouter, max_pages: usize, max_chars: usize) -> Self {
        Self { router, max_pages, max_chars }
    }

    /// Sample the leading pages of `path`. Never fails: an unopenable
    /// document or an all-blank prefix yields the placeholder text.
    pub fn extract(&self, path: &Path) -> TextSample {
        let Some((backend, document)) = self.router.open(path) else {
            warn!(path = %path.display(), "no backend could open the document, using placeholder");
            return TextSample::placeholder(PlaceholderReason::Unreadable);
        };

        let total = document.page_count();
        let wanted = total.min(self.max_pages);
        info!(backend, total, reading = wanted, "sampling leading pages");

        let mut parts = Vec::with_capacity(wanted);
        let mut pages = Vec::with_capacity(wanted);
        for index in 0..wanted {
            match document.page_text(index) {
                Ok(text) if !text.is_empty() => {
                    debug!(page = index + 1, chars = text.chars().count(), "page extracted");
                    parts.push(text);
                    pages.push(index + 1);
                }
                Ok(_) => debug!(page = index + 1, "page has no text"),
                Err(e) => warn!(page = index + 1, error = %e, "skipping unreadable page"),
            }
        }
        drop(document);

        let joined = parts.join(" ");
        info!(chars = joined.chars().count(), "extracted text length");
        let text = truncate_chars(&joined, self.max_chars);
        if text.trim().is_empty() {
            warn!("no text extracted, using placeholder");
            return TextSample::placeholder(PlaceholderReason::NoText);
        }

        TextSample {
            text: text.to_string(),
            origin: SampleOrigin::Pages { backend, pages },
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// In-memory backend: `None` pages fail to extract. With `panics`
    /// set, reading any page panics the way a broken parser would.
    pub struct FakeBackend {
        pub name: &'static str,
        pub available: bool,
        pub panics: bool,
        pub pages: Option<Vec<Option<String>>>,
        pub released: Rc<Cell<usize>>,
    }

    impl FakeBackend {
        pub fn with_pages(pages: Vec<Option<&str>>) -> Self {
            Self {
                name: "fake",
                available: true,
                panics: false,
                pages: Some(pages.into_iter().map(|p| p.map(str::to_string)).collect()),
                released: Rc::new(Cell::new(0)),
            }
        }

        pub fn unopenable() -> Self {
            Self {
                name: "broken",
                available: true,
                panics: false,
                pages: None,
                released: Rc::new(Cell::new(0)),
            }
        }
    }

    struct FakeDocument {
        pages: Vec<Option<String>>,
        panics: bool,
        released: Rc<Cell<usize>>,
    }

    impl Drop for FakeDocument {
        fn drop(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    impl PdfDocument for FakeDocument {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> Result<String, ExtractionError> {
            if self.panics {
                panic!("corrupt content stream on page {}", index + 1);
            }
            self.pages[index].clone().ok_or_else(|| ExtractionError::Page {
                page: index + 1,
                reason: "broken content stream".into(),
            })
        }
    }

    impl TextBackend for FakeBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn open(&self, _path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError> {
            match &self.pages {
                Some(pages) => Ok(Box::new(FakeDocument {
                    pages: pages.clone(),
                    panics: self.panics,
                    released: Rc::clone(&self.released),
                })),
                None => Err(ExtractionError::Open {
                    backend: self.name,
                    reason: "corrupt xref".into(),
                }),
            }
        }
    }
}

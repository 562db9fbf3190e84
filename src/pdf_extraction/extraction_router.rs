// Ranked backend selection for PDF text extraction
//
// Backends are tried in preference order. One that is not installed, or that
// cannot open the file, is skipped silently in favour of the next. Callers
// only ever see the `PdfDocument` trait, never which backend served it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::{LopdfBackend, PdfDocument, PdftotextBackend, TextBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// poppler's `pdftotext`/`pdfinfo`, when installed
    Pdftotext,
    /// Pure Rust, always compiled in
    Lopdf,
}

impl BackendKind {
    /// Default preference order, most capable first.
    pub const fn ranked() -> &'static [BackendKind] {
        &[BackendKind::Pdftotext, BackendKind::Lopdf]
    }

    pub fn backend(self) -> Box<dyn TextBackend> {
        match self {
            BackendKind::Pdftotext => Box::new(PdftotextBackend::default()),
            BackendKind::Lopdf => Box::new(LopdfBackend),
        }
    }
}

pub struct ExtractionRouter {
    backends: Vec<Box<dyn TextBackend>>,
}

impl ExtractionRouter {
    pub fn new(backends: Vec<Box<dyn TextBackend>>) -> Self {
        Self { backends }
    }

    pub fn from_kinds(kinds: &[BackendKind]) -> Self {
        Self::new(kinds.iter().map(|kind| kind.backend()).collect())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn available(&self) -> Vec<&'static str> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.name())
            .collect()
    }

    /// Open `path` with the first available backend that accepts it.
    pub fn open(&self, path: &Path) -> Option<(&'static str, Box<dyn PdfDocument>)> {
        for backend in &self.backends {
            if !backend.is_available() {
                debug!(backend = backend.name(), "backend unavailable, skipping");
                continue;
            }
            match backend.open(path) {
                Ok(document) => return Some((backend.name(), document)),
                Err(e) => debug!(
                    backend = backend.name(),
                    error = %e,
                    "backend could not open document"
                ),
            }
        }
        None
    }
}

impl Default for ExtractionRouter {
    fn default() -> Self {
        Self::from_kinds(BackendKind::ranked())
    }
}

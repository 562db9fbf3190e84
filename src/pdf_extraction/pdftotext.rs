// poppler-utils backend: `pdfinfo` for the page count, `pdftotext` per page
//
//   pdfinfo [pdf_path]
//   pdftotext -f [page] -l [page] -layout [pdf_path] -

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{ExtractionError, PdfDocument, TextBackend};

const NAME: &str = "pdftotext";

#[derive(Debug, Clone)]
pub struct PdftotextBackend {
    pdftotext: String,
    pdfinfo: String,
}

impl Default for PdftotextBackend {
    fn default() -> Self {
        Self::new("pdftotext", "pdfinfo")
    }
}

impl PdftotextBackend {
    pub fn new(pdftotext: impl Into<String>, pdfinfo: impl Into<String>) -> Self {
        Self {
            pdftotext: pdftotext.into(),
            pdfinfo: pdfinfo.into(),
        }
    }
}

struct PdftotextDocument {
    path: PathBuf,
    pdftotext: String,
    pages: usize,
}

impl PdfDocument for PdftotextDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractionError> {
        extract_page(&self.pdftotext, &self.path, index + 1).map_err(|e| ExtractionError::Page {
            page: index + 1,
            reason: format!("{e:#}"),
        })
    }
}

impl TextBackend for PdftotextBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> bool {
        which::which(&self.pdftotext).is_ok() && which::which(&self.pdfinfo).is_ok()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError> {
        let pages = page_count(&self.pdfinfo, path).map_err(|e| ExtractionError::Open {
            backend: NAME,
            reason: format!("{e:#}"),
        })?;
        Ok(Box::new(PdftotextDocument {
            path: path.to_path_buf(),
            pdftotext: self.pdftotext.clone(),
            pages,
        }))
    }
}

fn page_count(pdfinfo: &str, path: &Path) -> Result<usize> {
    let output = Command::new(pdfinfo)
        .arg(path)
        .output()
        .with_context(|| format!("running {pdfinfo}"))?;
    if !output.status.success() {
        bail!("{pdfinfo} failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }
    parse_page_count(&String::from_utf8_lossy(&output.stdout))
}

fn parse_page_count(info: &str) -> Result<usize> {
    let line = info
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .context("pdfinfo output has no Pages line")?;
    line.trim()
        .parse()
        .with_context(|| format!("bad page count {:?}", line.trim()))
}

fn extract_page(pdftotext: &str, path: &Path, page: usize) -> Result<String> {
    let page = page.to_string();
    let output = Command::new(pdftotext)
        .args(["-f", &page, "-l", &page, "-layout"])
        .arg(path)
        .arg("-")
        .output()
        .with_context(|| format!("running {pdftotext}"))?;
    if !output.status.success() {
        bail!("{pdftotext} failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

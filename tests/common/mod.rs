// Shared fixtures: lopdf-generated PDFs and small JSON artifacts
#![allow(dead_code)]

use lopdf::dictionary;
use lopdf::{Document, Object, Stream};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const VECTORIZER_JSON: &str = r#"{
    "vocabulary": {
        "academic": 0, "research": 1, "thesis": 2, "dissertation": 3,
        "protein": 4, "folding": 5, "market": 6, "price": 7
    },
    "idf": [1.0, 1.0, 1.2, 1.5, 2.0, 2.0, 2.0, 2.0]
}"#;

pub const KMEANS_JSON: &str = r#"{
    "cluster_centers": [
        [0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.7, 0.7, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.7, 0.7]
    ],
    "metric": "euclidean"
}"#;

/// Temp dir holding `vectorizer.json` and `kmeans.json`.
pub fn model_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("vectorizer.json"), VECTORIZER_JSON).unwrap();
    fs::write(dir.path().join("kmeans.json"), KMEANS_JSON).unwrap();
    dir
}

/// Write a PDF with one Helvetica text line per page.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = pages
        .iter()
        .map(|text| {
            let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

pub fn pdf_in(dir: &TempDir, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    write_pdf(&path, pages);
    path
}

/// One primary-output line: `<cluster_id>,<confidence>`.
pub fn is_result_line(line: &str) -> bool {
    Regex::new(r"^\d+,\d+(\.\d+)?$").unwrap().is_match(line)
}

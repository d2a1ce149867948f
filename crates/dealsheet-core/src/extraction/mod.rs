pub mod lines;
pub mod pdftotext;
pub mod table;

use crate::error::DealsError;
use serde::{Deserialize, Serialize};

/// One positioned run of text as emitted by the PDF text layer.
///
/// Coordinates are in PDF space: `y` grows upwards, so the top of the page
/// has the largest `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        TextFragment {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedPage {
    pub page_number: usize,
    pub fragments: Vec<TextFragment>,
}

/// Everything the deal parsers need from one PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    pub pages: Vec<PositionedPage>,
    /// Flattened text used for the date banner and the plain-text parser.
    #[serde(default)]
    pub raw_text: String,
}

impl ExtractedDocument {
    /// Build a document from pages alone, deriving `raw_text` from them.
    pub fn from_pages(pages: Vec<PositionedPage>) -> Self {
        let raw_text = flatten_raw_text(&pages);
        ExtractedDocument { pages, raw_text }
    }

    /// Fill in `raw_text` when a JSON document omitted it.
    pub fn with_derived_raw_text(mut self) -> Self {
        if self.raw_text.trim().is_empty() {
            self.raw_text = flatten_raw_text(&self.pages);
        }
        self
    }
}

/// Join fragments with single spaces per page and pages with newlines.
pub fn flatten_raw_text(pages: &[PositionedPage]) -> String {
    pages
        .iter()
        .map(|page| {
            page.fragments
                .iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract positioned fragments and flattened text from PDF bytes.
    fn extract(&self, pdf_bytes: &[u8]) -> Result<ExtractedDocument, DealsError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

use crate::error::DealsError;
use crate::extraction::{ExtractedDocument, PdfExtractor, PositionedPage, TextFragment};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Word fragments come from `pdftotext -bbox`; the flattened text comes
/// from `pdftotext -layout`, which keeps one printed line per text line.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<ExtractedDocument, DealsError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| DealsError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| DealsError::Extraction(e.to_string()))?;
        let tmp_path = tmpfile.path().to_path_buf();

        let layout = run_pdftotext("-layout", &tmp_path)?;
        // pdftotext separates pages with form feeds.
        let raw_text = layout.replace('\x0c', "\n");

        let bbox = run_pdftotext("-bbox", &tmp_path)?;
        let pages = parse_bbox_words(&bbox)?;

        tracing::debug!(
            pages = pages.len(),
            fragments = pages.iter().map(|p| p.fragments.len()).sum::<usize>(),
            "pdftotext extraction complete"
        );

        Ok(ExtractedDocument { pages, raw_text })
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn run_pdftotext(mode: &str, pdf_path: &Path) -> Result<String, DealsError> {
    let output = Command::new("pdftotext")
        .arg(mode)
        .arg(pdf_path)
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DealsError::PdftotextNotFound
            } else {
                DealsError::Extraction(format!("pdftotext {mode} failed: {e}"))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(DealsError::PdftotextFailed { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `pdftotext -bbox` XHTML into positioned word fragments.
///
/// pdftotext measures y from the top of the page; fragments are flipped
/// into PDF space (`y = page_height - yMax`) so that larger y means higher
/// on the page.
fn parse_bbox_words(xml: &str) -> Result<Vec<PositionedPage>, DealsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<PositionedPage> = Vec::new();
    let mut page_height = 0.0_f32;
    let mut open_word: Option<WordBox> = None;
    let mut word_text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DealsError::Extraction(format!("invalid pdftotext bbox output: {e}")))?;

        match event {
            Event::Start(tag) => match tag.local_name().as_ref() {
                b"page" => {
                    page_height = attr_f32(&tag, b"height").unwrap_or(0.0);
                    pages.push(PositionedPage {
                        page_number: pages.len() + 1,
                        fragments: Vec::new(),
                    });
                }
                b"word" => {
                    open_word = WordBox::from_tag(&tag);
                    word_text.clear();
                }
                _ => {}
            },
            Event::Text(text) if open_word.is_some() => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| DealsError::Extraction(format!("invalid word text: {e}")))?;
                word_text.push_str(&unescaped);
            }
            Event::End(tag) if tag.local_name().as_ref() == b"word" => {
                if let (Some(word), Some(page)) = (open_word.take(), pages.last_mut()) {
                    let text = word_text.trim();
                    if !text.is_empty() {
                        page.fragments.push(word.into_fragment(text, page_height));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

#[derive(Debug, Clone, Copy)]
struct WordBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

impl WordBox {
    fn from_tag(tag: &BytesStart<'_>) -> Option<WordBox> {
        Some(WordBox {
            x_min: attr_f32(tag, b"xMin")?,
            y_min: attr_f32(tag, b"yMin")?,
            x_max: attr_f32(tag, b"xMax")?,
            y_max: attr_f32(tag, b"yMax")?,
        })
    }

    fn into_fragment(self, text: &str, page_height: f32) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x: self.x_min,
            y: page_height - self.y_max,
            width: self.x_max - self.x_min,
            height: self.y_max - self.y_min,
        }
    }
}

fn attr_f32(tag: &BytesStart<'_>, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok()?.trim().parse().ok())
}

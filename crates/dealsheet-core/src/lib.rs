pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod quantity;

pub use config::ParserOptions;
pub use error::DealsError;
pub use model::{DealTier, ParsedDeals, ParserEngine};
pub use parsing::table::parse_table_pages;
pub use parsing::text::parse_text_matrix;
pub use parsing::tiers::parse_deal_text;

use extraction::{ExtractedDocument, PdfExtractor, PositionedPage};
use tracing::warn;

/// Main API entry point: extract a deals PDF and parse its deal table.
pub fn parse_deals_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    options: &ParserOptions,
) -> Result<ParsedDeals, DealsError> {
    let document = extractor.extract(pdf_bytes)?;
    parse_deals_document(&document, options)
}

/// Parse an already-extracted document.
pub fn parse_deals_document(
    document: &ExtractedDocument,
    options: &ParserOptions,
) -> Result<ParsedDeals, DealsError> {
    parse_deals(&document.pages, &document.raw_text, options)
}

/// Parse with the table-aware parser, falling back to the plain-text parser
/// on the same `raw_text` when it fails.
///
/// A fallback result is marked `used_legacy_fallback` and carries a warning
/// naming why the table parser gave up. When both parsers fail the error
/// names both reasons.
pub fn parse_deals(
    pages: &[PositionedPage],
    raw_text: &str,
    options: &ParserOptions,
) -> Result<ParsedDeals, DealsError> {
    let table_err = match parse_table_pages(pages, raw_text, options) {
        Ok(parsed) => return Ok(parsed),
        Err(e) if options.legacy_fallback => e,
        Err(e) => return Err(e),
    };

    warn!(error = %table_err, "table parser failed, falling back to plain-text parser");

    match parse_text_matrix(raw_text) {
        Ok(mut parsed) => {
            parsed.diagnostics.parsed_pages = pages.len();
            parsed.diagnostics.used_legacy_fallback = true;
            parsed
                .warnings
                .insert(0, format!("Table parser failed ({table_err}); used plain-text fallback."));
            Ok(parsed)
        }
        Err(legacy_err) => Err(DealsError::ParsersFailed {
            table: Box::new(table_err),
            legacy: Box::new(legacy_err),
        }),
    }
}

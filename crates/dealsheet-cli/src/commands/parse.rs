use dealsheet_core::config::load_options;
use dealsheet_core::error::DealsError;
use dealsheet_core::extraction::pdftotext::PdftotextExtractor;
use dealsheet_core::extraction::{ExtractedDocument, PdfExtractor};
use dealsheet_core::{ParsedDeals, ParserOptions};
use std::path::{Path, PathBuf};

use crate::output;
use crate::Engine;

pub fn run(
    input_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
    engine: Engine,
    config: Option<PathBuf>,
) -> Result<(), DealsError> {
    let options = match config {
        Some(path) => load_options(&path)?,
        None => ParserOptions::default(),
    };

    let document = load_document(&input_file)?;
    let parsed = parse_with_engine(&document, engine, &options)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&parsed)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} SKU(s) with {} deal tier(s), written to {}",
                parsed.matrix.len(),
                parsed.deals.len(),
                path.display()
            );
            for w in &parsed.warnings {
                eprintln!("  warning: {w}");
            }
            if parsed.skipped_lines > 0 {
                eprintln!("  {} line(s) skipped during parsing", parsed.skipped_lines);
            }
        }
        None => match output_format {
            "json" => output::json::print(&parsed)?,
            _ => output::table::print(&parsed),
        },
    }

    Ok(())
}

/// Read a PDF through pdftotext, or a pre-extracted document from JSON.
fn load_document(input_file: &Path) -> Result<ExtractedDocument, DealsError> {
    let is_json = input_file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let bytes = std::fs::read(input_file)?;
    if is_json {
        let document: ExtractedDocument = serde_json::from_slice(&bytes)?;
        return Ok(document.with_derived_raw_text());
    }

    let extractor = PdftotextExtractor::new();
    tracing::debug!(backend = extractor.backend_name(), file = %input_file.display(), "extracting PDF");
    extractor.extract(&bytes)
}

fn parse_with_engine(
    document: &ExtractedDocument,
    engine: Engine,
    options: &ParserOptions,
) -> Result<ParsedDeals, DealsError> {
    match engine {
        Engine::Auto => dealsheet_core::parse_deals_document(document, options),
        Engine::Table => {
            dealsheet_core::parse_table_pages(&document.pages, &document.raw_text, options)
        }
        Engine::Legacy => dealsheet_core::parse_text_matrix(&document.raw_text),
    }
}

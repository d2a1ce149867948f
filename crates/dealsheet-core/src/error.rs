use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DealsError {
    #[error("could not find effective date range in deals PDF (expected 'DEAL EFFECTIVE DATES <MONTH> <DAY> - [<MONTH>] <DAY>, <YEAR>')")]
    MissingDateRange,

    #[error("could not detect deals table headers (ITEM # / UPC / DESCRIPTION / PACK/SIZE / COST / DEAL)")]
    MissingTableHeaders,

    #[error("table parser failed: {table}; legacy parser failed: {legacy}")]
    ParsersFailed {
        table: Box<DealsError>,
        legacy: Box<DealsError>,
    },

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to load parser options from {path}: {reason}")]
    OptionsLoad { path: PathBuf, reason: String },

    #[error("invalid parser options: {0}")]
    OptionsInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

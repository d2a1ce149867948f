use crate::error::DealsError;
use crate::extraction::lines::{DEFAULT_WORD_GAP, DEFAULT_Y_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the deal parsers. Every field has a default, so an empty
/// JSON object is a valid options file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserOptions {
    /// Max y-distance from a line's anchor for a fragment to join that line.
    pub line_y_tolerance: f32,
    /// Horizontal gap above which two runs are separated by a space.
    pub word_gap: f32,
    /// Re-attach a stray "get N FREE" on the next SKU's line to the previous row.
    pub bleed_through: bool,
    /// Re-run the plain-text parser when the table-aware parser fails.
    pub legacy_fallback: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            line_y_tolerance: DEFAULT_Y_TOLERANCE,
            word_gap: DEFAULT_WORD_GAP,
            bleed_through: true,
            legacy_fallback: true,
        }
    }
}

/// Load parser options from a JSON file.
pub fn load_options(path: &Path) -> Result<ParserOptions, DealsError> {
    let content = std::fs::read_to_string(path).map_err(|e| DealsError::OptionsLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let options: ParserOptions =
        serde_json::from_str(&content).map_err(|e| DealsError::OptionsLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_options(&options)?;
    Ok(options)
}

/// Parse parser options from a JSON string (no file path context).
pub fn parse_options_str(json: &str) -> Result<ParserOptions, DealsError> {
    let options: ParserOptions = serde_json::from_str(json)?;
    validate_options(&options)?;
    Ok(options)
}

/// Validate that tolerances are usable distances.
pub fn validate_options(options: &ParserOptions) -> Result<(), DealsError> {
    for (name, value) in [
        ("line_y_tolerance", options.line_y_tolerance),
        ("word_gap", options.word_gap),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(DealsError::OptionsInvalid(format!(
                "{name} must be a finite, non-negative number (got {value})"
            )));
        }
    }
    Ok(())
}

//! Plain-text deals parser, used when the table-aware parser cannot run.
//!
//! Works on flattened text only. Tier lines set or extend an "active" tier
//! set, and every SKU line that follows receives it. No column headers are
//! required.

use crate::error::DealsError;
use crate::model::{DealTier, ParseDiagnostics, ParsedDeals, ParserEngine};
use crate::parsing::dates::extract_effective_date_range;
use crate::parsing::normalize::{normalize_dashes, normalize_sku};
use crate::parsing::tiers::{dedupe_tiers, extract_phrase_tiers, extract_word_ratio_tiers};
use crate::parsing::{assemble_deals, merge_sku_tiers, SkuTierMap};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static SKU_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2,}[0-9]{2,}[A-Z]?)\b").expect("static regex must compile")
});

static BUY_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^buy\s+([0-9]{1,3})\+?\s*$").expect("static regex must compile"));

static GET_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^get\s+([0-9]{1,3})\s*free$").expect("static regex must compile")
});

const NO_DEALS_WARNING: &str = "No SKU deals were parsed from the PDF.";

#[derive(Debug, Default)]
struct TextState {
    active_tiers: Vec<DealTier>,
    pending_buy_qty: Option<u32>,
    sku_tiers: SkuTierMap,
    skipped_lines: usize,
    sku_lines: usize,
    sku_lines_with_tiers: usize,
}

impl TextState {
    fn step(&mut self, line: &str) {
        if let Some(sku) = extract_sku(line) {
            self.sku_lines += 1;
            if self.active_tiers.is_empty() {
                self.skipped_lines += 1;
                debug!(%sku, "no active tiers for SKU line");
                return;
            }
            self.sku_lines_with_tiers += 1;
            merge_sku_tiers(&mut self.sku_tiers, &sku, &self.active_tiers);
            return;
        }

        let ratio_tiers = extract_word_ratio_tiers(line);
        if !ratio_tiers.is_empty() {
            self.active_tiers = ratio_tiers;
            self.pending_buy_qty = None;
            return;
        }

        let phrase_tiers = extract_phrase_tiers(line);
        if !phrase_tiers.is_empty() {
            self.extend_active(phrase_tiers);
            self.pending_buy_qty = None;
            return;
        }

        if let Some(qty) = capture_qty(&BUY_ONLY_RE, line) {
            self.pending_buy_qty = Some(qty);
            return;
        }

        if let (Some(buy_qty), Some(free_qty)) = (self.pending_buy_qty, capture_qty(&GET_ONLY_RE, line)) {
            if let Some(tier) = DealTier::new(buy_qty, free_qty) {
                self.extend_active([tier]);
            }
            self.pending_buy_qty = None;
        }
    }

    fn extend_active(&mut self, tiers: impl IntoIterator<Item = DealTier>) {
        let current = std::mem::take(&mut self.active_tiers);
        self.active_tiers = dedupe_tiers(current.into_iter().chain(tiers));
    }
}

/// Parse flattened deals text into a matrix.
pub fn parse_text_matrix(raw_text: &str) -> Result<ParsedDeals, DealsError> {
    let range = extract_effective_date_range(raw_text).ok_or(DealsError::MissingDateRange)?;

    let mut state = TextState::default();
    for line in split_lines(raw_text) {
        state.step(&line);
    }

    let diagnostics = ParseDiagnostics {
        sku_rows_detected: state.sku_lines,
        sku_rows_with_free_tiers: state.sku_lines_with_tiers,
        rows_skipped_no_tiers: state.skipped_lines,
        parser_engine: ParserEngine::Legacy,
        ..Default::default()
    };

    info!(
        sku_lines = state.sku_lines,
        skipped = state.skipped_lines,
        "plain-text parse complete"
    );

    Ok(assemble_deals(
        state.sku_tiers,
        range,
        state.skipped_lines,
        Vec::new(),
        NO_DEALS_WARNING,
        diagnostics,
    ))
}

fn split_lines(raw_text: &str) -> Vec<String> {
    normalize_dashes(raw_text)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_sku(line: &str) -> Option<String> {
    SKU_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_sku(m.as_str()))
}

fn capture_qty(re: &Regex, line: &str) -> Option<u32> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

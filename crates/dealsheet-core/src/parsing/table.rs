//! Table-aware deals parser.
//!
//! Walks grouped text lines in reading order and assembles per-SKU tier
//! sets. The parser state is an explicit [`TableState`] value: each line is
//! first classified into a [`LineKind`] against the current state, then the
//! state transitions by value. [`TableState::flush`] closes the active row.
//!
//! Section ratios (a line such as `10+1 20+3` above a block of SKUs) apply to
//! every following SKU row until a header, another section line, or a bare
//! threshold list (`5+ 50+`) replaces or clears them.

use crate::config::ParserOptions;
use crate::error::DealsError;
use crate::extraction::lines::{group_fragments_into_lines, TextLine};
use crate::extraction::table::{detect_header_anchors, HeaderAnchors};
use crate::extraction::PositionedPage;
use crate::model::{DealTier, ParseDiagnostics, ParsedDeals, ParserEngine};
use crate::parsing::dates::extract_effective_date_range;
use crate::parsing::normalize::{compact_sku, is_punctuation_only, looks_like_sku, normalize_space};
use crate::parsing::tiers::{
    dedupe_tiers, extract_phrase_tiers, extract_ratio_tiers, extract_tiers, has_threshold_markers,
    is_deal_vocabulary, is_non_free_deal,
};
use crate::parsing::{assemble_deals, merge_sku_tiers, SkuTierMap};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

static SKU_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([A-Z0-9-]{3,})\s+([0-9]{8,14})\b").expect("static regex must compile")
});

static IGNORE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:bloom packaging corp\b|tel\s*#|fax\s*#|www\.|deal effective dates\b|special while supplies last\b)",
    )
    .expect("static regex must compile")
});

static BUY_QTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbuy\s+[0-9]{1,3}\b").expect("static regex must compile"));

static GET_FREE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)get\s+[0-9]{1,3}\s*free").expect("static regex must compile"));

const NO_DEALS_WARNING: &str = "No SKU deals were parsed from the PDF tables.";

/// A SKU row being assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct RowState {
    pub sku: String,
    /// Section tiers in force when the row started.
    pub section_tiers: Vec<DealTier>,
    /// Deal text collected from the row line and its continuation lines.
    pub deal_parts: Vec<String>,
}

/// What a single line means to the parser, given the state before it.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Header(HeaderAnchors),
    /// Before the first header, banner/contact noise, or punctuation only.
    Ignored,
    SkuRow {
        sku: String,
        /// The row line itself carries deal text.
        seeds_deal_text: bool,
        /// "get N FREE" text that belongs to the previous row.
        bleed: Option<String>,
    },
    /// Ratio tiers with no phrase-form tiers: replaces the section tiers.
    SectionRatio(Vec<DealTier>),
    /// Bare `N+` pay thresholds: clears the section tiers.
    ThresholdOnly,
    Continuation,
    /// Ratio tiers alongside phrase text while no row is active.
    OrphanRatio(Vec<DealTier>),
    Noise,
}

#[derive(Debug, Clone, Default)]
pub struct TableState {
    pub seen_header: bool,
    pub anchors: Option<HeaderAnchors>,
    pub section_tiers: Vec<DealTier>,
    pub active_row: Option<RowState>,
    pub sku_tiers: SkuTierMap,
    pub diagnostics: ParseDiagnostics,
}

impl TableState {
    pub fn new(parsed_pages: usize) -> Self {
        TableState {
            diagnostics: ParseDiagnostics {
                parsed_pages,
                parser_engine: ParserEngine::Table,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Classify a line against the current state without changing it.
    pub fn classify(&self, line: &TextLine, bleed_through: bool) -> LineKind {
        if let Some(anchors) = detect_header_anchors(line) {
            return LineKind::Header(anchors);
        }

        let text = line.text.as_str();
        if !self.seen_header
            || text.is_empty()
            || IGNORE_LINE_RE.is_match(text)
            || is_punctuation_only(text)
        {
            return LineKind::Ignored;
        }

        if let Some(sku) = sku_from_row_line(text) {
            let bleed = match &self.active_row {
                Some(_) if bleed_through => bleed_through_fragment(text),
                _ => None,
            };
            return LineKind::SkuRow {
                sku,
                seeds_deal_text: is_deal_vocabulary(text) || !extract_ratio_tiers(text).is_empty(),
                bleed,
            };
        }

        let ratio_tiers = extract_ratio_tiers(text);
        let has_phrase = !extract_phrase_tiers(text).is_empty();

        // A line with both notations is deal text, not a section default.
        if !ratio_tiers.is_empty() && !has_phrase {
            return LineKind::SectionRatio(ratio_tiers);
        }

        if ratio_tiers.is_empty() && !has_phrase && has_threshold_markers(text) {
            return LineKind::ThresholdOnly;
        }

        if self.active_row.is_some() && is_deal_vocabulary(text) {
            return LineKind::Continuation;
        }

        if self.active_row.is_none() && !ratio_tiers.is_empty() {
            return LineKind::OrphanRatio(ratio_tiers);
        }

        LineKind::Noise
    }

    /// Apply a classified line.
    pub fn apply(mut self, line: &TextLine, kind: LineKind) -> Self {
        match kind {
            LineKind::Header(anchors) => {
                self = self.flush();
                self.seen_header = true;
                self.anchors = Some(anchors);
                self.section_tiers.clear();
                self.diagnostics.table_headers_detected += 1;
            }
            LineKind::SkuRow {
                sku,
                seeds_deal_text,
                bleed,
            } => {
                if let (Some(row), Some(fragment)) = (self.active_row.as_mut(), bleed) {
                    debug!(previous = %row.sku, next = %sku, %fragment, "re-attaching bleed-through deal text");
                    row.deal_parts.push(fragment);
                }
                self = self.flush();
                let deal_parts = if seeds_deal_text {
                    vec![line.text.clone()]
                } else {
                    Vec::new()
                };
                self.active_row = Some(RowState {
                    sku,
                    section_tiers: self.section_tiers.clone(),
                    deal_parts,
                });
                self.diagnostics.sku_rows_detected += 1;
            }
            LineKind::SectionRatio(tiers) => {
                self = self.flush();
                debug!(?tiers, "section tiers replaced");
                self.section_tiers = tiers;
            }
            LineKind::ThresholdOnly => {
                self = self.flush();
                debug!(line = %line.text, "threshold list clears section tiers");
                self.section_tiers.clear();
            }
            LineKind::Continuation => {
                if let Some(row) = self.active_row.as_mut() {
                    row.deal_parts.push(line.text.clone());
                }
            }
            LineKind::OrphanRatio(tiers) => {
                self.section_tiers = tiers;
            }
            LineKind::Ignored | LineKind::Noise => {}
        }
        self
    }

    /// Classify and apply one line.
    pub fn step(self, line: &TextLine, options: &ParserOptions) -> Self {
        let kind = self.classify(line, options.bleed_through);
        self.apply(line, kind)
    }

    /// Close the active row: merge its own deal-text tiers with its section
    /// snapshot and union the result into the SKU's accumulated tiers.
    pub fn flush(mut self) -> Self {
        let Some(row) = self.active_row.take() else {
            return self;
        };

        let deal_text = normalize_space(&row.deal_parts.join(" "));
        let merged = dedupe_tiers(
            row.section_tiers
                .iter()
                .copied()
                .chain(extract_tiers(&deal_text)),
        );

        if merged.is_empty() {
            self.diagnostics.rows_skipped_no_tiers += 1;
            if is_non_free_deal(&deal_text) {
                self.diagnostics.rows_skipped_non_free += 1;
            }
            debug!(sku = %row.sku, %deal_text, "row has no free tiers");
            return self;
        }

        self.diagnostics.sku_rows_with_free_tiers += 1;
        merge_sku_tiers(&mut self.sku_tiers, &row.sku, &merged);
        self
    }
}

/// The SKU of a row line: an item token followed by an 8-14 digit UPC.
pub fn sku_from_row_line(text: &str) -> Option<String> {
    let caps = SKU_ROW_RE.captures(text)?;
    let token = caps.get(1)?.as_str();
    looks_like_sku(token).then(|| compact_sku(token))
}

/// The "get N FREE" clauses on a line that has no "buy N" of its own.
///
/// One vendor's layout wraps the tail of a multi-line deal cell onto the
/// next SKU's baseline; such clauses belong to the previous row.
pub fn bleed_through_fragment(line_text: &str) -> Option<String> {
    if BUY_QTY_RE.is_match(line_text) {
        return None;
    }
    let clauses: Vec<&str> = GET_FREE_RE
        .find_iter(line_text)
        .map(|m| m.as_str())
        .collect();
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" "))
    }
}

/// Parse positioned pages into a deals matrix.
///
/// Fails with [`DealsError::MissingDateRange`] before looking at any row when
/// `raw_text` has no effective-dates banner, and with
/// [`DealsError::MissingTableHeaders`] when no page has a column header line.
pub fn parse_table_pages(
    pages: &[PositionedPage],
    raw_text: &str,
    options: &ParserOptions,
) -> Result<ParsedDeals, DealsError> {
    let range = extract_effective_date_range(raw_text).ok_or(DealsError::MissingDateRange)?;

    let state = pages
        .iter()
        .flat_map(|page| {
            group_fragments_into_lines(&page.fragments, options.line_y_tolerance, options.word_gap)
        })
        .fold(TableState::new(pages.len()), |state, line| state.step(&line, options))
        .flush();

    if state.diagnostics.table_headers_detected == 0 {
        return Err(DealsError::MissingTableHeaders);
    }

    let diagnostics = state.diagnostics;
    info!(
        pages = diagnostics.parsed_pages,
        headers = diagnostics.table_headers_detected,
        sku_rows = diagnostics.sku_rows_detected,
        with_free_tiers = diagnostics.sku_rows_with_free_tiers,
        skipped_non_free = diagnostics.rows_skipped_non_free,
        "table parse complete"
    );

    Ok(assemble_deals(
        state.sku_tiers,
        range,
        diagnostics.rows_skipped_no_tiers,
        Vec::new(),
        NO_DEALS_WARNING,
        diagnostics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::TextFragment;

    fn line(text: &str) -> TextLine {
        TextLine {
            y: 500.0,
            fragments: vec![TextFragment::new(text, 40.0, 500.0, 200.0, 8.0)],
            text: normalize_space(text),
        }
    }

    fn header_line() -> TextLine {
        let fragments = vec![
            TextFragment::new("ITEM #", 40.0, 700.0, 30.0, 8.0),
            TextFragment::new("UPC", 95.0, 700.0, 20.0, 8.0),
            TextFragment::new("DESCRIPTION", 200.0, 700.0, 60.0, 8.0),
            TextFragment::new("PACK/SIZE", 315.0, 700.0, 50.0, 8.0),
            TextFragment::new("COST", 380.0, 700.0, 25.0, 8.0),
            TextFragment::new("DEAL", 418.0, 700.0, 25.0, 8.0),
        ];
        TextLine {
            y: 700.0,
            text: "ITEM # UPC DESCRIPTION PACK/SIZE COST DEAL".into(),
            fragments,
        }
    }

    fn tier(buy_qty: u32, free_qty: u32) -> DealTier {
        DealTier { buy_qty, free_qty }
    }

    fn after_header() -> TableState {
        let header = header_line();
        let state = TableState::new(1);
        let kind = state.classify(&header, true);
        state.apply(&header, kind)
    }

    fn run(state: TableState, lines: &[&str]) -> TableState {
        let options = ParserOptions::default();
        lines
            .iter()
            .fold(state, |s, text| s.step(&line(text), &options))
    }

    #[test]
    fn test_lines_before_first_header_are_ignored() {
        let state = TableState::new(1);
        assert_eq!(state.classify(&line("10+1 20+3"), true), LineKind::Ignored);
        assert_eq!(
            state.classify(&line("LOT601 012345678905 Lollipops"), true),
            LineKind::Ignored
        );
    }

    #[test]
    fn test_header_resets_section_tiers() {
        let state = run(after_header(), &["10+1"]);
        assert_eq!(state.section_tiers, vec![tier(10, 1)]);
        let header = header_line();
        let kind = state.classify(&header, true);
        assert!(matches!(kind, LineKind::Header(_)));
        let state = state.apply(&header, kind);
        assert!(state.section_tiers.is_empty());
        assert_eq!(state.diagnostics.table_headers_detected, 2);
        assert_eq!(state.anchors.map(|a| a.deal_x), Some(418.0));
    }

    #[test]
    fn test_noise_lines_are_ignored() {
        let state = after_header();
        for text in [
            "BLOOM PACKAGING CORP",
            "TEL# 555-0100 FAX# 555-0101",
            "www.example.com",
            "DEAL EFFECTIVE DATES FEB 1 - FEB 27, 2026",
            "SPECIAL WHILE SUPPLIES LAST",
            "------",
        ] {
            assert_eq!(state.classify(&line(text), true), LineKind::Ignored, "{text}");
        }
    }

    #[test]
    fn test_sku_row_classification() {
        let state = after_header();
        assert_eq!(
            state.classify(&line("lot601 012345678905 Lollipops 24/1oz $12.00"), true),
            LineKind::SkuRow {
                sku: "LOT601".into(),
                seeds_deal_text: false,
                bleed: None,
            }
        );
        assert_eq!(
            state.classify(&line("SIZ024 012345678912 Gum 12/1oz $9.00 Buy 20 get 10 FREE"), true),
            LineKind::SkuRow {
                sku: "SIZ024".into(),
                seeds_deal_text: true,
                bleed: None,
            }
        );
        // No digit in the item token.
        assert_eq!(sku_from_row_line("ABC 012345678905 Something"), None);
        assert_eq!(state.classify(&line("ABC 012345678905 Something"), true), LineKind::Noise);
        // UPC too short.
        assert_eq!(sku_from_row_line("LOT601 0123456 Lollipops"), None);
    }

    #[test]
    fn test_section_ratio_requires_no_phrase() {
        let state = after_header();
        assert_eq!(
            state.classify(&line("10+1 20+3"), true),
            LineKind::SectionRatio(vec![tier(10, 1), tier(20, 3)])
        );
        // Mixed notation with no active row is an orphan ratio, not a section line.
        assert_eq!(
            state.classify(&line("10+1 or Buy 20 get 3 FREE"), true),
            LineKind::OrphanRatio(vec![tier(10, 1)])
        );
        let with_row = run(state, &["LOT601 012345678905 Lollipops"]);
        assert_eq!(
            with_row.classify(&line("10+1 or Buy 20 get 3 FREE"), true),
            LineKind::Continuation
        );
    }

    #[test]
    fn test_threshold_list_clears_section() {
        let state = run(after_header(), &["10+1 20+3"]);
        assert_eq!(state.classify(&line("5+ 50+"), true), LineKind::ThresholdOnly);
        let state = run(state, &["5+ 50+", "LOT601 012345678905 Lollipops"]).flush();
        assert!(state.sku_tiers.is_empty());
        assert_eq!(state.diagnostics.rows_skipped_no_tiers, 1);
        assert_eq!(state.diagnostics.rows_skipped_non_free, 0);
    }

    #[test]
    fn test_pay_continuation_is_not_a_threshold_list() {
        let state = run(after_header(), &["ONG1221 032797812214 Toffee Chews 20/7oz $42.00"]);
        assert_eq!(state.classify(&line("Buy 20+ pay $14.50"), true), LineKind::Continuation);
        let state = run(state, &["Buy 20+ pay $14.50"]).flush();
        assert!(state.sku_tiers.is_empty());
        assert_eq!(state.diagnostics.rows_skipped_no_tiers, 1);
        assert_eq!(state.diagnostics.rows_skipped_non_free, 1);
    }

    #[test]
    fn test_pay_continuation_keeps_section_tiers() {
        let state = run(
            after_header(),
            &[
                "10+1",
                "AAA111 012345678905 Item A",
                "Buy 20+ pay $14.50",
                "BBB222 012345678912 Item B",
            ],
        )
        .flush();
        assert_eq!(state.section_tiers, vec![tier(10, 1)]);
        let skus: Vec<_> = state.sku_tiers.keys().cloned().collect();
        assert_eq!(skus, vec!["AAA111".to_string(), "BBB222".to_string()]);
        let tiers: Vec<_> = state.sku_tiers["BBB222"].iter().copied().collect();
        assert_eq!(tiers, vec![tier(10, 1)]);
    }

    #[test]
    fn test_continuation_lines_accumulate() {
        let state = run(
            after_header(),
            &["LOT601 012345678905 Lollipops 24/1oz $12.00 Buy 20", "get 4 FREE"],
        );
        let row = state.active_row.as_ref().unwrap();
        assert_eq!(row.deal_parts.len(), 2);
        let state = state.flush();
        let tiers: Vec<_> = state.sku_tiers["LOT601"].iter().copied().collect();
        assert_eq!(tiers, vec![tier(20, 4)]);
    }

    #[test]
    fn test_flush_without_active_row_is_identity() {
        let state = after_header().flush();
        assert!(state.sku_tiers.is_empty());
        assert_eq!(state.diagnostics.rows_skipped_no_tiers, 0);
    }

    #[test]
    fn test_flush_counts_non_free_row() {
        let state = TableState {
            active_row: Some(RowState {
                sku: "ONG1221".into(),
                section_tiers: vec![],
                deal_parts: vec!["Buy 20 pay $14.50".into()],
            }),
            ..TableState::new(1)
        }
        .flush();
        assert!(state.active_row.is_none());
        assert!(state.sku_tiers.is_empty());
        assert_eq!(state.diagnostics.rows_skipped_no_tiers, 1);
        assert_eq!(state.diagnostics.rows_skipped_non_free, 1);
    }

    #[test]
    fn test_flush_merges_section_snapshot_with_row_tiers() {
        let state = TableState {
            active_row: Some(RowState {
                sku: "BLM578".into(),
                section_tiers: vec![tier(10, 1)],
                deal_parts: vec!["Buy 20 get 3 FREE".into(), "10+1".into()],
            }),
            ..TableState::new(1)
        }
        .flush();
        let tiers: Vec<_> = state.sku_tiers["BLM578"].iter().copied().collect();
        assert_eq!(tiers, vec![tier(10, 1), tier(20, 3)]);
        assert_eq!(state.diagnostics.sku_rows_with_free_tiers, 1);
    }

    #[test]
    fn test_bleed_through_fragment() {
        assert_eq!(
            bleed_through_fragment("BLM578 012345678929 Mints get 6 FREE"),
            Some("get 6 FREE".into())
        );
        assert_eq!(bleed_through_fragment("BLM578 012345678929 Buy 30 get 6 FREE"), None);
        assert_eq!(bleed_through_fragment("BLM578 012345678929 Mints"), None);
    }

    #[test]
    fn test_bleed_through_reattaches_to_previous_row() {
        let lines = [
            "BLM577 012345678912 Mints 12/1oz $8.00 Buy 30",
            "BLM578 012345678929 Mints 12/2oz $9.00 get 6 FREE",
        ];
        let state = run(after_header(), &lines).flush();
        let tiers: Vec<_> = state.sku_tiers["BLM577"].iter().copied().collect();
        assert_eq!(tiers, vec![tier(30, 6)]);
        assert!(!state.sku_tiers.contains_key("BLM578"));
    }

    #[test]
    fn test_bleed_through_can_be_disabled() {
        let options = ParserOptions {
            bleed_through: false,
            ..Default::default()
        };
        let state = [
            "BLM577 012345678912 Mints 12/1oz $8.00 Buy 30",
            "BLM578 012345678929 Mints 12/2oz $9.00 get 6 FREE",
        ]
        .iter()
        .fold(after_header(), |s, text| s.step(&line(text), &options))
        .flush();
        assert!(state.sku_tiers.is_empty());
        assert_eq!(state.diagnostics.rows_skipped_no_tiers, 2);
    }

    #[test]
    fn test_same_sku_on_two_rows_accumulates() {
        let state = run(
            after_header(),
            &[
                "10+1",
                "LOT601 012345678905 Lollipops",
                "20+4",
                "LOT601 012345678905 Lollipops",
            ],
        )
        .flush();
        let tiers: Vec<_> = state.sku_tiers["LOT601"].iter().copied().collect();
        assert_eq!(tiers, vec![tier(10, 1), tier(20, 4)]);
        assert_eq!(state.diagnostics.sku_rows_detected, 2);
    }
}

//! Deal tier grammar shared by the table-aware and plain-text parsers.
//!
//! Two notations are recognised:
//! - ratio form, `20+7` (buy 20, get 7 free)
//! - phrase form, `Buy 20 get 7 FREE` (case-insensitive, `Buy 20+ get 7 free` allowed)
//!
//! Every extractor returns tiers deduplicated and sorted by (buy, free);
//! tiers with a zero quantity are dropped.

use crate::model::DealTier;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static RATIO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,3})\+([0-9]{1,3})").expect("static regex must compile"));

static WORD_RATIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,3})\+([0-9]{1,3})\b").expect("static regex must compile")
});

static PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)buy\s+([0-9]{1,3})\+?\s*get\s+([0-9]{1,3})\s*free")
        .expect("static regex must compile")
});

static THRESHOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{1,3}\+(?:[^0-9]|$)").expect("static regex must compile"));

static DEAL_VOCAB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:buy|get|free|pay|pallet|plt|masters|unit)\b")
        .expect("static regex must compile")
});

static NON_FREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:pay|pallet|plt|masters|unit)\b").expect("static regex must compile")
});

/// Ratio-form tiers (`20+7`). A line containing `=` is an arithmetic
/// artifact such as `1+2=3` and yields nothing.
pub fn extract_ratio_tiers(text: &str) -> Vec<DealTier> {
    if text.contains('=') {
        return Vec::new();
    }
    capture_tiers(&RATIO_RE, text)
}

/// Ratio-form tiers that must stand alone as words, so `12345+6` does not
/// read as `345+6`. Used on flattened text where columns have run together.
pub fn extract_word_ratio_tiers(text: &str) -> Vec<DealTier> {
    if text.contains('=') {
        return Vec::new();
    }
    capture_tiers(&WORD_RATIO_RE, text)
}

/// Phrase-form tiers (`Buy 20 get 7 FREE`).
pub fn extract_phrase_tiers(text: &str) -> Vec<DealTier> {
    capture_tiers(&PHRASE_RE, text)
}

/// Both grammars, merged.
pub fn extract_tiers(text: &str) -> Vec<DealTier> {
    dedupe_tiers(
        extract_ratio_tiers(text)
            .into_iter()
            .chain(extract_phrase_tiers(text)),
    )
}

/// Drop invalid tiers, collapse duplicates, sort ascending by (buy, free).
pub fn dedupe_tiers(tiers: impl IntoIterator<Item = DealTier>) -> Vec<DealTier> {
    tiers
        .into_iter()
        .filter(DealTier::is_valid)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse a single deal cell. Phrase form wins over ratio form; text that
/// describes a pay-price or pallet deal yields `None`.
pub fn parse_deal_text(text: &str) -> Option<DealTier> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    first_tier(&PHRASE_RE, text).or_else(|| first_tier(&WORD_RATIO_RE, text))
}

/// Bare `N+` markers (`5+ 50+`) that head a pay-threshold list. A line with
/// deal vocabulary (`Buy 20+ pay $14.50`) is deal text, not a threshold list.
pub fn has_threshold_markers(text: &str) -> bool {
    THRESHOLD_RE.is_match(text) && !is_deal_vocabulary(text)
}

/// Any buy/get/free/pay/pallet vocabulary.
pub fn is_deal_vocabulary(text: &str) -> bool {
    DEAL_VOCAB_RE.is_match(text)
}

/// Vocabulary of deals that are not "get N free": pay prices, pallet and unit deals.
pub fn is_non_free_deal(text: &str) -> bool {
    NON_FREE_RE.is_match(text)
}

fn capture_tiers(re: &Regex, text: &str) -> Vec<DealTier> {
    dedupe_tiers(re.captures_iter(text).filter_map(|caps| tier_from_captures(&caps)))
}

fn first_tier(re: &Regex, text: &str) -> Option<DealTier> {
    re.captures(text).and_then(|caps| tier_from_captures(&caps))
}

fn tier_from_captures(caps: &regex::Captures<'_>) -> Option<DealTier> {
    let buy = caps.get(1)?.as_str().parse().ok()?;
    let free = caps.get(2)?.as_str().parse().ok()?;
    DealTier::new(buy, free)
}

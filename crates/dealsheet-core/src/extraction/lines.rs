use crate::extraction::TextFragment;
use crate::parsing::normalize::normalize_space;

/// Fragments whose y differs from the line anchor by more than this start a new line.
pub const DEFAULT_Y_TOLERANCE: f32 = 2.4;

/// Horizontal gap (in PDF units) above which adjacent runs are separate words.
pub const DEFAULT_WORD_GAP: f32 = 1.5;

/// A horizontal line of text reconstructed from positioned fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// y of the first fragment placed on the line.
    pub y: f32,
    /// Fragments sorted left-to-right.
    pub fragments: Vec<TextFragment>,
    /// Fragments joined with inferred word spacing, whitespace-normalized.
    pub text: String,
}

/// Group a page's fragments into lines, top of the page first.
///
/// Whitespace-only fragments and fragments with a non-finite position are
/// dropped before grouping, so a page without visible text yields no lines.
pub fn group_fragments_into_lines(
    fragments: &[TextFragment],
    y_tolerance: f32,
    word_gap: f32,
) -> Vec<TextLine> {
    let mut sorted: Vec<&TextFragment> = fragments
        .iter()
        .filter(|f| !f.text.trim().is_empty() && f.x.is_finite() && f.y.is_finite())
        .collect();

    // Sort by Y descending (top of page first), then X ascending.
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut grouped: Vec<(f32, Vec<TextFragment>)> = Vec::new();
    for fragment in sorted {
        match grouped.last_mut() {
            Some((anchor_y, members)) if (*anchor_y - fragment.y).abs() <= y_tolerance => {
                members.push(fragment.clone());
            }
            _ => grouped.push((fragment.y, vec![fragment.clone()])),
        }
    }

    grouped
        .into_iter()
        .map(|(y, mut members)| {
            members.sort_by(|a, b| a.x.total_cmp(&b.x));
            let text = join_fragments(&members, word_gap);
            TextLine {
                y,
                fragments: members,
                text,
            }
        })
        .collect()
}

/// Join fragments left-to-right, inserting a space where the gap between
/// one fragment's right edge and the next one's left edge exceeds `word_gap`.
pub fn join_fragments(fragments: &[TextFragment], word_gap: f32) -> String {
    let mut sorted: Vec<&TextFragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut result = String::new();
    let mut prev_end: Option<f32> = None;
    for fragment in sorted {
        let text = normalize_space(&fragment.text);
        if text.is_empty() {
            continue;
        }
        if let Some(end) = prev_end {
            if fragment.x - end > word_gap && !result.is_empty() {
                result.push(' ');
            }
        }
        result.push_str(&text);
        prev_end = Some(fragment.right());
    }

    normalize_space(&result)
}

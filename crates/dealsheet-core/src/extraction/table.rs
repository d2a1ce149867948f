use crate::extraction::lines::TextLine;
use crate::extraction::TextFragment;
use crate::parsing::normalize::normalize_space;

/// Column keywords a deals table header must contain, left to right.
pub const HEADER_KEYWORDS: [&str; 6] = ["ITEM", "UPC", "DESCRIPTION", "PACK", "COST", "DEAL"];

/// x-coordinates of the six column headings on the most recent header line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderAnchors {
    pub item_x: f32,
    pub upc_x: f32,
    pub description_x: f32,
    pub pack_x: f32,
    pub cost_x: f32,
    pub deal_x: f32,
}

/// Detect if a line looks like a deals table header row.
pub fn is_table_header(text: &str) -> bool {
    let upper = text.to_uppercase();
    HEADER_KEYWORDS.iter().all(|kw| upper.contains(kw))
}

/// Return the column anchors when `line` is a header, `None` otherwise.
///
/// Each anchor is the x of the first fragment whose text contains the
/// keyword, so a keyword split across two runs disqualifies the line.
pub fn detect_header_anchors(line: &TextLine) -> Option<HeaderAnchors> {
    if !is_table_header(&line.text) {
        return None;
    }

    let x_of = |keyword: &str| find_fragment_x(&line.fragments, keyword);

    Some(HeaderAnchors {
        item_x: x_of("ITEM")?,
        upc_x: x_of("UPC")?,
        description_x: x_of("DESCRIPTION")?,
        pack_x: x_of("PACK")?,
        cost_x: x_of("COST")?,
        deal_x: x_of("DEAL")?,
    })
}

fn find_fragment_x(fragments: &[TextFragment], keyword: &str) -> Option<f32> {
    fragments
        .iter()
        .find(|f| normalize_space(&f.text).to_uppercase().contains(keyword))
        .map(|f| f.x)
}

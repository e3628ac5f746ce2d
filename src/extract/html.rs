//! Pattern-based HTML fragment extraction
//!
//! The fragment is parsed tolerantly (html5ever never fails) only to split it
//! into candidate blocks; every field is then matched with patterns over the
//! block's visible text. When the markup drifts, this yields fewer rooms
//! instead of an error.

use crate::extract::normalize::{build_attributes, collapse_whitespace};
use crate::extract::RecordExtractor;
use crate::model::{keys, RoomRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Elements that may hold one room
const CANDIDATE_SELECTOR: &str = "tr, li, .room, .roomCard, [data-room-id]";

/// Attributes that carry an explicit room id
const ID_ATTRIBUTES: &[&str] = &["data-room-id", "data-id"];

struct Patterns {
    room_no: Regex,
    layout: Regex,
    area: Regex,
    floor: Regex,
    labeled_rent: Regex,
    any_yen: Regex,
    common_fee: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                room_no: Regex::new(r"(\d{2,4})\s*号室").ok()?,
                layout: Regex::new(r"([1-4]LDK|[1-4]DK|[1-4]K|ワンルーム)").ok()?,
                area: Regex::new(r"(\d+(?:\.\d+)?)\s*(?:㎡|m²|&#13217;)").ok()?,
                floor: Regex::new(r"(\d+)\s*階").ok()?,
                labeled_rent: Regex::new(r"賃料[:：]?\s*([\d,]+)\s*円").ok()?,
                any_yen: Regex::new(r"([\d,]+)\s*円").ok()?,
                common_fee: Regex::new(r"共益?費[:：]?\s*([\d,]+)\s*円").ok()?,
            })
        })
        .as_ref()
}

/// Extracts rooms from an HTML document or fragment
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPatternExtractor;

impl RecordExtractor for HtmlPatternExtractor {
    fn name(&self) -> &'static str {
        "html-pattern"
    }

    fn extract(&self, text: &str) -> Vec<RoomRecord> {
        let fragment = Html::parse_fragment(text);

        let blocks = candidate_blocks(&fragment);
        let blocks = if blocks.is_empty() {
            // No recognizable containers: fall back to line-oriented text
            text_lines(&fragment)
                .into_iter()
                .map(|line| (None, line))
                .collect()
        } else {
            blocks
        };

        blocks
            .into_iter()
            .filter_map(|(explicit_id, text)| parse_block(explicit_id, &text))
            .collect()
    }
}

/// Returns `(explicit id, collapsed text)` for every leaf-most candidate
fn candidate_blocks(fragment: &Html) -> Vec<(Option<String>, String)> {
    let selector = match Selector::parse(CANDIDATE_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    fragment
        .select(&selector)
        .filter(|element| !has_nested_candidate(element, &selector))
        .map(|element| {
            let explicit_id = ID_ATTRIBUTES
                .iter()
                .find_map(|name| element.value().attr(name))
                .map(str::to_string);
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            (explicit_id, text)
        })
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

fn has_nested_candidate(element: &ElementRef, selector: &Selector) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|descendant| selector.matches(&descendant))
}

/// Elements that start a new visual line in the fallback text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section", "table",
    "tbody", "tfoot", "thead", "tr", "ul",
];

/// Splits the fragment into visual lines
///
/// Inline siblings (`<span>101号室</span><span>85,000円</span>`) stay on one
/// line; block elements and newlines in text end a line.
fn text_lines(fragment: &Html) -> Vec<String> {
    let mut text = String::new();
    push_visible_text(fragment.root_element(), &mut text);

    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

fn push_visible_text(element: ElementRef, out: &mut String) {
    let block = BLOCK_ELEMENTS.contains(&element.value().name());
    if block {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child) = ElementRef::wrap(child) {
            push_visible_text(child, out);
        }
    }

    if block {
        out.push('\n');
    }
}

/// Matches room fields in one block of text
///
/// A block counts as a room when it shows a room number or a rent.
fn parse_block(explicit_id: Option<String>, text: &str) -> Option<RoomRecord> {
    let p = patterns()?;

    let name = capture(&p.room_no, text).map(|n| format!("{}号室", n));
    let layout = capture(&p.layout, text);
    let area = capture(&p.area, text).map(|a| format!("{}㎡", a));
    let floor = capture(&p.floor, text).map(|f| format!("{}階", f));

    let fee_match = p.common_fee.captures(text);
    let common_fee = fee_match
        .as_ref()
        .and_then(|c| c.get(1))
        .map(|m| format!("{}円", m.as_str()));

    let rent = capture(&p.labeled_rent, text)
        .or_else(|| {
            // Unlabeled rent: first yen amount outside the common-fee span
            let span = fee_match.as_ref().and_then(|c| c.get(0)).map(|m| m.range());
            p.any_yen
                .captures_iter(text)
                .filter(|c| match (&span, c.get(0)) {
                    (Some(span), Some(m)) => m.end() <= span.start || m.start() >= span.end,
                    _ => true,
                })
                .find_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        })
        .map(|r| format!("{}円", r));

    if name.is_none() && rent.is_none() {
        return None;
    }

    let id = explicit_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| name.clone())
        .or_else(|| composite_id(&floor, &layout, &area))?;

    let attributes = build_attributes([
        (keys::NAME, name),
        (keys::LAYOUT, layout),
        (keys::FLOORSPACE, area),
        (keys::FLOOR, floor),
        (keys::RENT, rent),
        (keys::COMMON_FEE, common_fee),
    ]);

    RoomRecord::new(id, attributes)
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// `floor/layout/area`, or None if none of them is known
fn composite_id(
    floor: &Option<String>,
    layout: &Option<String>,
    area: &Option<String>,
) -> Option<String> {
    if floor.is_none() && layout.is_none() && area.is_none() {
        return None;
    }
    let part = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    Some(format!("{}/{}/{}", part(floor), part(layout), part(area)))
}

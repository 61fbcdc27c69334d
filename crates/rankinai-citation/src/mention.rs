//! Mention detection, excerpt extraction and list-position extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzer::Listing;

/// Share of a title's significant words that must appear for a fuzzy match.
const FUZZY_MATCH_RATIO: f64 = 0.7;

/// Title words at or below this many characters are ignored by fuzzy matching.
const SIGNIFICANT_WORD_MIN_CHARS: usize = 3;

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.[ \t]+").expect("valid list marker regex"));

/// Which rule recognised the product in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    /// The full title appears verbatim (case-insensitive).
    Title,
    /// Both the vendor and the product type appear.
    BrandAndType,
    /// Enough of the title's significant words appear.
    Fuzzy,
}

fn non_blank_lower(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Decide whether `reply` mentions the listing. Rules are tried in order
/// and the first match wins; `None` means not cited.
#[must_use]
pub fn detect_mention(reply: &str, listing: &Listing<'_>) -> Option<MentionKind> {
    let reply_lower = reply.to_lowercase();
    let title_lower = listing.title.trim().to_lowercase();

    if !title_lower.is_empty() && reply_lower.contains(&title_lower) {
        return Some(MentionKind::Title);
    }

    if let (Some(vendor), Some(product_type)) = (
        non_blank_lower(listing.vendor),
        non_blank_lower(listing.product_type),
    ) {
        if reply_lower.contains(&vendor) && reply_lower.contains(&product_type) {
            return Some(MentionKind::BrandAndType);
        }
    }

    let significant: Vec<String> = title_lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| w.chars().count() > SIGNIFICANT_WORD_MIN_CHARS)
        .collect();
    if significant.is_empty() {
        return None;
    }

    let found = significant
        .iter()
        .filter(|w| reply_lower.contains(w.as_str()))
        .count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = found as f64 / significant.len() as f64;
    (ratio >= FUZZY_MATCH_RATIO).then_some(MentionKind::Fuzzy)
}

/// True when `text` contains the listing's title or vendor (case-insensitive).
fn names_listing(text: &str, title_lower: &str, vendor_lower: Option<&str>) -> bool {
    let lower = text.to_lowercase();
    (!title_lower.is_empty() && lower.contains(title_lower))
        || vendor_lower.is_some_and(|v| lower.contains(v))
}

/// First sentence of `reply` naming the product title or vendor, trimmed.
///
/// Sentences are split on `.`, `!` and `?`. Returns an empty string when no
/// sentence qualifies.
#[must_use]
pub fn extract_excerpt(reply: &str, listing: &Listing<'_>) -> String {
    let title_lower = listing.title.trim().to_lowercase();
    let vendor_lower = non_blank_lower(listing.vendor);

    reply
        .split(['.', '!', '?'])
        .map(str::trim)
        .find(|sentence| {
            !sentence.is_empty() && names_listing(sentence, &title_lower, vendor_lower.as_deref())
        })
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// 1-based index of the first enumerated-list entry naming the product
/// title or vendor. `None` when the reply has no list or no entry matches.
#[must_use]
pub fn extract_position(reply: &str, listing: &Listing<'_>) -> Option<u32> {
    let title_lower = listing.title.trim().to_lowercase();
    let vendor_lower = non_blank_lower(listing.vendor);

    list_entries(reply)
        .into_iter()
        .position(|entry| names_listing(entry, &title_lower, vendor_lower.as_deref()))
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// Enumerated-list entries of `reply` in order.
///
/// A marker such as `2. ` opens an entry when it starts a line, when it is
/// `1. `, or when it continues the previous marker's numbering. Inline lists
/// like `1. BrandX 2. Acme` therefore split, while `costs 20. Acme` does not.
/// An entry runs to the next accepted marker or the end of its line.
fn list_entries(reply: &str) -> Vec<&str> {
    let bytes = reply.as_bytes();
    let mut markers: Vec<(usize, usize)> = Vec::new();
    let mut previous: Option<u32> = None;
    for caps in LIST_MARKER.captures_iter(reply) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start = whole.start();
        if start > 0 && !bytes[start - 1].is_ascii_whitespace() {
            continue;
        }
        let Ok(number) = digits.as_str().parse::<u32>() else {
            continue;
        };
        let starts_line = reply[..start]
            .rsplit('\n')
            .next()
            .is_some_and(|prefix| prefix.trim().is_empty());
        let continues = previous.and_then(|p| p.checked_add(1)) == Some(number);
        if starts_line || number == 1 || continues {
            markers.push((start, whole.end()));
            previous = Some(number);
        }
    }

    markers
        .iter()
        .enumerate()
        .map(|(i, &(_, body))| {
            let line_end = reply[body..].find('\n').map_or(reply.len(), |off| body + off);
            let next = markers.get(i + 1).map_or(reply.len(), |&(marker, _)| marker);
            reply[body..line_end.min(next)].trim()
        })
        .collect()
}

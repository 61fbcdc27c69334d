//! Competitor-name extraction.

use std::sync::LazyLock;

use rankinai_core::CompetitorMode;
use regex::Regex;

use crate::analyzer::Listing;

/// Maximum competitor names kept per reply.
pub const MAX_COMPETITORS: usize = 5;

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z][A-Za-z0-9&]*(?:[ \t]+[A-Z][A-Za-z0-9&]*)+")
        .expect("valid capitalized run regex")
});

/// Sentence-openers and list filler that get capitalized without being
/// part of a name.
const LEADING_STOPWORDS: &[&str] = &[
    "a", "an", "the", "i", "if", "for", "and", "or", "but", "also", "another", "consider",
    "try", "top", "best", "my", "our", "your", "these", "this", "some", "when", "while",
    "overall", "finally", "however", "other", "options", "pick",
];

#[derive(Debug)]
struct Candidate {
    start: usize,
    end: usize,
    name: String,
    from_reference: bool,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// First occurrence of `needle` in `haystack` bounded by non-word bytes on
/// both sides. Both inputs must already be ASCII-lowercased.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let before_ok = i == 0 || !is_word_byte(bytes[i - 1]);
        let end = i + needle.len();
        let after_ok = end >= bytes.len() || !is_word_byte(bytes[end]);
        before_ok && after_ok
    })
}

fn reference_candidates(lower: &str, brands: &[String]) -> Vec<Candidate> {
    brands
        .iter()
        .filter_map(|brand| {
            let needle = brand.trim().to_ascii_lowercase();
            find_word(lower, &needle).map(|start| Candidate {
                start,
                end: start + needle.len(),
                name: brand.trim().to_string(),
                from_reference: true,
            })
        })
        .collect()
}

fn capitalized_candidates(reply: &str) -> Vec<Candidate> {
    CAPITALIZED_RUN
        .find_iter(reply)
        .filter_map(|m| {
            let text = m.as_str();
            let mut offset = 0;
            let mut words: Vec<&str> = text.split_whitespace().collect();
            while let Some(first) = words.first() {
                if !LEADING_STOPWORDS.contains(&first.to_ascii_lowercase().as_str()) {
                    break;
                }
                offset = text[offset..].find(first).map_or(offset, |p| offset + p) + first.len();
                words.remove(0);
            }
            if words.len() < 2 {
                return None;
            }
            let rest = text[offset..].trim_start();
            let start = m.end() - rest.len();
            Some(Candidate {
                start,
                end: m.end(),
                name: words.join(" "),
                from_reference: false,
            })
        })
        .collect()
}

fn is_own_product(candidate: &Candidate, vendor: Option<&str>, title: &str) -> bool {
    let lower = candidate.name.to_lowercase();
    if vendor.is_some_and(|v| find_word(&lower, v).is_some()) {
        return true;
    }
    if title.is_empty() {
        return false;
    }
    lower == title || (!candidate.from_reference && find_word(title, &lower).is_some())
}

/// Names of other brands or products mentioned in `reply`, excluding the
/// listing's own vendor and title.
///
/// Reference brands are matched as whole words, case-insensitively. In
/// [`CompetitorMode::Enriched`] any run of two or more capitalized words is
/// also a candidate. Results keep order of first appearance, drop duplicates
/// and overlapping spans, and are capped at [`MAX_COMPETITORS`].
#[must_use]
pub fn extract_competitors(
    reply: &str,
    listing: &Listing<'_>,
    reference_brands: &[String],
    mode: CompetitorMode,
) -> Vec<String> {
    let lower = reply.to_ascii_lowercase();
    let vendor = listing
        .vendor
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty());
    let title = listing.title.trim().to_lowercase();

    let mut candidates = reference_candidates(&lower, reference_brands);
    if mode == CompetitorMode::Enriched {
        candidates.extend(capitalized_candidates(reply));
    }
    candidates.retain(|c| !is_own_product(c, vendor.as_deref(), &title));
    candidates.sort_by_key(|c| (c.start, !c.from_reference));

    let mut out: Vec<String> = Vec::new();
    let mut covered_until = 0usize;
    for c in candidates {
        if c.start < covered_until {
            continue;
        }
        covered_until = c.end;
        if out.iter().any(|n| n.eq_ignore_ascii_case(&c.name)) {
            continue;
        }
        out.push(c.name);
        if out.len() == MAX_COMPETITORS {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands(list: &[&str]) -> Vec<String> {
        list.iter().map(|b| (*b).to_string()).collect()
    }

    fn acme() -> Listing<'static> {
        Listing {
            title: "Acme UltraMat Pro",
            vendor: Some("Acme"),
            ..Listing::default()
        }
    }

    #[test]
    fn own_vendor_is_excluded() {
        let reply = "Acme is fine but BrandX is more popular.";
        let found = extract_competitors(
            reply,
            &acme(),
            &brands(&["Acme", "BrandX"]),
            CompetitorMode::Reference,
        );
        assert_eq!(found, vec!["BrandX".to_string()]);
    }

    #[test]
    fn short_vendor_only_excludes_whole_words() {
        let listing = Listing {
            title: "Cloudmonster",
            vendor: Some("On"),
            ..Listing::default()
        };
        let reply = "Runners also love Lululemon and Salomon trail shoes.";
        let found = extract_competitors(
            reply,
            &listing,
            &brands(&["Lululemon", "Salomon"]),
            CompetitorMode::Reference,
        );
        assert_eq!(found, brands(&["Lululemon", "Salomon"]));
    }

    #[test]
    fn reference_matches_are_whole_words_and_case_insensitive() {
        let reply = "Try a NIKE shoe. Pumas are not matched, but puma is.";
        let found = extract_competitors(
            reply,
            &acme(),
            &brands(&["Puma", "Nike"]),
            CompetitorMode::Reference,
        );
        assert_eq!(found, vec!["Nike".to_string(), "Puma".to_string()]);
    }

    #[test]
    fn results_follow_first_appearance_and_are_capped() {
        let reply = "Alo, Lululemon, Jade, Manduka, Liforme and Gaiam all make mats. Alo again.";
        let found = extract_competitors(
            reply,
            &acme(),
            &brands(&["Gaiam", "Liforme", "Manduka", "Jade", "Lululemon", "Alo"]),
            CompetitorMode::Reference,
        );
        assert_eq!(
            found,
            brands(&["Alo", "Lululemon", "Jade", "Manduka", "Liforme"])
        );
    }

    #[test]
    fn title_fragments_are_not_competitors() {
        let listing = Listing {
            title: "Cloud Runner Sneaker",
            vendor: Some("Acme"),
            ..Listing::default()
        };
        let reply = "The Cloud Runner is light. Also look at Jade Harmony.";
        let found = extract_competitors(reply, &listing, &[], CompetitorMode::Enriched);
        assert_eq!(found, vec!["Jade Harmony".to_string()]);
    }

    #[test]
    fn enriched_mode_adds_capitalized_runs() {
        let reply = "Consider Jade Harmony mats or the Manduka PRO. The Acme UltraMat Pro is fine.";
        let found = extract_competitors(
            reply,
            &acme(),
            &brands(&["Manduka"]),
            CompetitorMode::Enriched,
        );
        assert_eq!(
            found,
            vec!["Jade Harmony".to_string(), "Manduka".to_string()]
        );
    }

    #[test]
    fn reference_mode_ignores_capitalized_runs() {
        let reply = "Consider Jade Harmony mats.";
        let found =
            extract_competitors(reply, &acme(), &brands(&["Manduka"]), CompetitorMode::Reference);
        assert!(found.is_empty());
    }

    #[test]
    fn reference_brand_wins_over_overlapping_run() {
        let reply = "I like The North Face jackets.";
        let found = extract_competitors(
            reply,
            &acme(),
            &brands(&["The North Face"]),
            CompetitorMode::Enriched,
        );
        assert_eq!(found, vec!["The North Face".to_string()]);
    }
}

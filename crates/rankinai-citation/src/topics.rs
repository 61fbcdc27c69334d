//! Content-gap signals: topics the assistant raised that the listing never
//! covers, and listing features the assistant ignored.

use crate::analyzer::Listing;
use crate::lexicon::{tokens, Topic};

/// Maximum entries returned by either gap list.
pub const MAX_GAP_ENTRIES: usize = 8;

/// Tags this short are too generic to count as features.
const MIN_FEATURE_CHARS: usize = 3;

fn listing_tokens(listing: &Listing<'_>) -> Vec<String> {
    let mut out = tokens(listing.title);
    for text in [listing.description, listing.product_type, listing.category]
        .into_iter()
        .flatten()
    {
        out.extend(tokens(text));
    }
    for tag in listing.tags {
        out.extend(tokens(tag));
    }
    out
}

fn mentions(topic: &Topic, token: &str) -> bool {
    topic.keywords.iter().any(|k| k == token)
}

/// Topics discussed in `reply` that none of the listing's text covers,
/// in order of first appearance in the reply.
#[must_use]
pub fn missing_topics(reply: &str, listing: &Listing<'_>, topics: &[Topic]) -> Vec<String> {
    let covered = listing_tokens(listing);
    let reply_tokens = tokens(reply);
    let mut found: Vec<(usize, &str)> = topics
        .iter()
        .filter(|topic| !covered.iter().any(|t| mentions(topic, t)))
        .filter_map(|topic| {
            reply_tokens
                .iter()
                .position(|t| mentions(topic, t))
                .map(|first| (first, topic.name.as_str()))
        })
        .collect();
    found.sort_by_key(|(first, _)| *first);

    let mut out: Vec<String> = Vec::new();
    for (_, name) in found {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
        if out.len() == MAX_GAP_ENTRIES {
            break;
        }
    }
    out
}

/// Listing tags the reply never mentions (case-insensitive), in tag order.
#[must_use]
pub fn ignored_features(reply: &str, listing: &Listing<'_>) -> Vec<String> {
    let reply_lower = reply.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for tag in listing.tags {
        let tag = tag.trim();
        if tag.chars().count() < MIN_FEATURE_CHARS {
            continue;
        }
        let lower = tag.to_lowercase();
        if reply_lower.contains(&lower) || out.iter().any(|t| t.to_lowercase() == lower) {
            continue;
        }
        out.push(tag.to_string());
        if out.len() == MAX_GAP_ENTRIES {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lexicons;

    fn topic(name: &str, keywords: &[&str]) -> Topic {
        Topic {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    #[test]
    fn reports_uncovered_topics_in_reply_order() {
        let topics = vec![
            topic("price", &["price", "affordable"]),
            topic("grip", &["grip", "non-slip"]),
            topic("warranty", &["warranty"]),
        ];
        let listing = Listing {
            title: "Acme UltraMat Pro",
            description: Some("A thick mat with a lifetime warranty."),
            ..Listing::default()
        };
        let reply = "Look for non-slip grip and an affordable price. Warranty matters too.";
        assert_eq!(
            missing_topics(reply, &listing, &topics),
            vec!["grip".to_string(), "price".to_string()]
        );
    }

    #[test]
    fn tags_cover_topics() {
        let topics = vec![topic("grip", &["grip"])];
        let tags = vec!["Grip".to_string()];
        let listing = Listing {
            title: "Acme UltraMat Pro",
            tags: &tags,
            ..Listing::default()
        };
        assert!(missing_topics("Great grip.", &listing, &topics).is_empty());
    }

    #[test]
    fn missing_topics_are_capped() {
        let lex = Lexicons::default();
        let listing = Listing {
            title: "Thing",
            ..Listing::default()
        };
        let reply = "price quality durable materials size shipping warranty reviews \
                     sustainable comfort grip design";
        assert_eq!(
            missing_topics(reply, &listing, &lex.topics).len(),
            MAX_GAP_ENTRIES
        );
    }

    #[test]
    fn ignored_features_skips_short_and_mentioned_tags() {
        let tags = vec![
            "eco".to_string(),
            "XL".to_string(),
            "Non-Slip".to_string(),
            "Travel".to_string(),
            "travel".to_string(),
        ];
        let listing = Listing {
            title: "Acme UltraMat Pro",
            tags: &tags,
            ..Listing::default()
        };
        let reply = "The Acme mat has a non-slip surface.";
        assert_eq!(
            ignored_features(reply, &listing),
            vec!["eco".to_string(), "Travel".to_string()]
        );
    }
}

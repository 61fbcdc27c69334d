//! Recommendation prompt, reply parsing and the deterministic fallback.

use std::fmt::Write as _;

use rankinai_core::{
    DescriptionSuggestion, Product, RecommendationSource, Scan, SeoSuggestion, Suggestions,
    TagSuggestion, TitleSuggestion,
};
use serde::Deserialize;
use serde_json::Value;

pub const RECOMMENDATION_SYSTEM_PROMPT: &str = "You are an e-commerce consultant who helps \
     product listings get recommended by AI shopping assistants. Reply with a single JSON object \
     and nothing else.";

const LLM_DEFAULT_UPLIFT: f64 = 25.0;
const FALLBACK_UPLIFT: f64 = 15.0;
const MAX_QUICK_WINS: usize = 5;
const MAX_SIGNALS: usize = 3;
const META_TITLE_CHARS: usize = 60;
const META_DESCRIPTION_CHARS: usize = 155;
const THIN_DESCRIPTION_WORDS: usize = 50;
const MIN_TAG_CHARS: usize = 3;

/// A recommendation bundle ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub suggestions: Suggestions,
    pub quick_wins: Vec<String>,
    pub potential_score: f64,
    pub source: RecommendationSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RecommendationPayload {
    title: TitleSuggestion,
    description: DescriptionSuggestion,
    tags: TagSuggestion,
    seo: SeoSuggestion,
    quick_wins: Vec<String>,
    potential_score: Option<Value>,
}

/// Model estimate clamped to `[current, 100]`, or `current + 25` capped at
/// 100 when the model gave none.
#[must_use]
pub fn llm_potential_score(estimate: Option<f64>, current: f64) -> f64 {
    match estimate.filter(|v| v.is_finite()) {
        Some(v) => v.clamp(current, 100.0_f64.max(current)),
        None => (current + LLM_DEFAULT_UPLIFT).min(100.0),
    }
}

#[must_use]
pub fn fallback_potential_score(current: f64) -> f64 {
    (current + FALLBACK_UPLIFT).min(100.0)
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// User prompt describing the product and its latest scan per platform.
#[must_use]
pub fn build_prompt(product: &Product, latest: &[&Scan]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Product title: {}", product.title);
    let _ = writeln!(prompt, "Vendor: {}", product.vendor.as_deref().unwrap_or("unknown"));
    let _ = writeln!(prompt, "Type: {}", product.product_type.as_deref().unwrap_or("unknown"));
    let _ = writeln!(prompt, "Category: {}", product.category.as_deref().unwrap_or("unknown"));
    let _ = writeln!(prompt, "Tags: {}", list_or_none(&product.tags));
    let _ = writeln!(
        prompt,
        "Description: {}",
        product.description.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(prompt, "Current citation rate: {:.1}%", product.citation_rate);

    for scan in latest {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "Latest {} scan", scan.platform);
        let _ = writeln!(prompt, "Question: {}", scan.question);
        let _ = writeln!(prompt, "Cited: {}", if scan.is_cited { "yes" } else { "no" });
        if let Some(position) = scan.citation_position {
            let _ = writeln!(prompt, "List position: {position}");
        }
        let _ = writeln!(prompt, "Competitors named: {}", list_or_none(&scan.competitors));
        let _ = writeln!(prompt, "Topics the listing lacks: {}", list_or_none(&scan.missing_topics));
        let _ = writeln!(
            prompt,
            "Listing features the assistant ignored: {}",
            list_or_none(&scan.ignored_features)
        );
    }

    prompt.push_str(
        "\nRespond with JSON of this shape:\n\
         {\"title\":{\"suggested\":\"\",\"reason\":\"\"},\
         \"description\":{\"keyPoints\":[],\"reason\":\"\"},\
         \"tags\":{\"add\":[],\"remove\":[],\"reason\":\"\"},\
         \"seo\":{\"metaTitle\":\"\",\"metaDescription\":\"\",\"reason\":\"\"},\
         \"quickWins\":[],\"potentialScore\":0}\n",
    );
    prompt
}

/// First balanced `{...}` object in `text`, skipping braces inside strings.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let open = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[open..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[open..=open + idx]);
                }
            }
            _ => {}
        }
    }

    None
}

fn value_as_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a model reply. `None` when the reply holds no usable object or
/// the object carries no quick wins.
#[must_use]
pub fn parse_recommendation(reply: &str, current_score: f64) -> Option<Recommendation> {
    let object = extract_json_object(reply)?;
    let payload: RecommendationPayload = serde_json::from_str(object).ok()?;

    let quick_wins = clean_list(payload.quick_wins);
    if quick_wins.is_empty() {
        return None;
    }
    let estimate = payload.potential_score.as_ref().and_then(value_as_f64);

    Some(Recommendation {
        suggestions: Suggestions {
            title: payload.title,
            description: DescriptionSuggestion {
                key_points: clean_list(payload.description.key_points),
                reason: payload.description.reason,
            },
            tags: TagSuggestion {
                add: clean_list(payload.tags.add),
                remove: clean_list(payload.tags.remove),
                reason: payload.tags.reason,
            },
            seo: payload.seo,
        },
        quick_wins: quick_wins.into_iter().take(MAX_QUICK_WINS).collect(),
        potential_score: llm_potential_score(estimate, current_score),
        source: RecommendationSource::Llm,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// Distinct entries across `lists`, first seen first, case-insensitive.
fn first_seen<'a>(lists: impl Iterator<Item = &'a Vec<String>>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in lists.flatten() {
        if out.len() == limit {
            break;
        }
        if !out.iter().any(|o| o.eq_ignore_ascii_case(item)) {
            out.push(item.clone());
        }
    }
    out
}

/// Template recommendation built only from the product and its scans.
/// Always carries at least one quick win.
#[must_use]
pub fn fallback_recommendation(product: &Product, latest: &[&Scan]) -> Recommendation {
    let title = product.title.trim();
    let vendor = non_blank(product.vendor.as_deref());
    let product_type = non_blank(product.product_type.as_deref());
    let category = non_blank(product.category.as_deref());
    let description = non_blank(product.description.as_deref());

    let missing = first_seen(latest.iter().map(|s| &s.missing_topics), MAX_SIGNALS);
    let ignored = first_seen(latest.iter().map(|s| &s.ignored_features), MAX_SIGNALS);
    let competitors = first_seen(latest.iter().map(|s| &s.competitors), MAX_SIGNALS);

    let mut suggested_title = title.to_string();
    if let Some(v) = vendor.filter(|v| !contains_ci(title, v)) {
        suggested_title = format!("{v} {suggested_title}");
    }
    if let Some(t) = product_type.filter(|t| !contains_ci(title, t)) {
        suggested_title = format!("{suggested_title} {t}");
    }

    let mut key_points: Vec<String> = missing
        .iter()
        .map(|topic| format!("Cover {topic}, which shoppers ask assistants about"))
        .collect();
    key_points.extend(
        ignored
            .iter()
            .map(|feature| format!("Lead with {feature}; assistants did not mention it")),
    );
    if !competitors.is_empty() {
        key_points.push(format!(
            "Explain how it compares with {}",
            competitors.join(", ")
        ));
    }
    if key_points.is_empty() {
        key_points.push("State materials, dimensions and care instructions".to_string());
        key_points.push("Describe who the product is for and when to use it".to_string());
    }

    let mut tags_to_add: Vec<String> = Vec::new();
    for candidate in product_type
        .into_iter()
        .chain(category)
        .map(str::to_lowercase)
        .chain(missing.iter().map(|m| m.to_lowercase()))
    {
        let known = product
            .tags
            .iter()
            .chain(tags_to_add.iter())
            .any(|t| t.eq_ignore_ascii_case(&candidate));
        if !known {
            tags_to_add.push(candidate);
        }
    }
    let tags_to_remove: Vec<String> = product
        .tags
        .iter()
        .filter(|t| t.trim().chars().count() < MIN_TAG_CHARS)
        .cloned()
        .collect();

    let meta_title = truncate_chars(
        &vendor.map_or_else(|| suggested_title.clone(), |v| format!("{suggested_title} | {v}")),
        META_TITLE_CHARS,
    );
    let meta_description = truncate_chars(
        &description.map_or_else(
            || {
                format!(
                    "{title} from {}: a {} worth shortlisting.",
                    vendor.unwrap_or("our store"),
                    product_type.unwrap_or("product").to_lowercase()
                )
            },
            ToString::to_string,
        ),
        META_DESCRIPTION_CHARS,
    );

    let mut quick_wins: Vec<String> = Vec::new();
    if suggested_title != title {
        quick_wins.push(format!("Rename the product to \"{suggested_title}\""));
    }
    if let Some(topic) = missing.first() {
        quick_wins.push(format!("Add a sentence about {topic} to the description"));
    }
    if !tags_to_add.is_empty() {
        quick_wins.push(format!("Add the tags: {}", tags_to_add.join(", ")));
    }
    if description.is_none_or(|d| d.split_whitespace().count() < THIN_DESCRIPTION_WORDS) {
        quick_wins.push(format!(
            "Expand the description to at least {THIN_DESCRIPTION_WORDS} words"
        ));
    }
    quick_wins.push("Answer two or three common shopper questions in the description".to_string());
    quick_wins.truncate(MAX_QUICK_WINS);

    Recommendation {
        suggestions: Suggestions {
            title: TitleSuggestion {
                suggested: suggested_title,
                reason: "Assistants match listings on brand and product type, so the title \
                         should carry both."
                    .to_string(),
            },
            description: DescriptionSuggestion {
                key_points,
                reason: "Assistants quote listings that answer the questions shoppers ask."
                    .to_string(),
            },
            tags: TagSuggestion {
                add: tags_to_add,
                remove: tags_to_remove,
                reason: "Specific tags help assistants place the product in the right category."
                    .to_string(),
            },
            seo: SeoSuggestion {
                meta_title,
                meta_description,
                reason: "Search snippets are a common source for assistant answers.".to_string(),
            },
        },
        quick_wins,
        potential_score: fallback_potential_score(product.citation_rate),
        source: RecommendationSource::Fallback,
    }
}

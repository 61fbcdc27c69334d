//! Shopping-question generation.

use rand::Rng;

/// System instruction sent with every scan question.
pub const SYSTEM_PROMPT: &str = "You are a helpful shopping assistant. Answer the way you \
would for a real customer: recommend specific products and brands by name, and when you \
suggest several options present them as a numbered list ordered from best to worst.";

const TEMPLATES: &[&str] = &[
    "What are the best {type} from {vendor}?",
    "Can you recommend some high-quality {type} in the {category} category?",
    "I'm shopping for {type}. Which brands and products would you suggest, including {vendor}?",
    "What {type} would you recommend for someone looking at {category}?",
    "Which {category} products are worth buying right now, especially {type} from {vendor}?",
    "What are the top-rated {type} I can buy online today?",
];

const DEFAULT_TYPE: &str = "products";
const DEFAULT_VENDOR: &str = "top brands";
const DEFAULT_CATEGORY: &str = "products";

fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
}

/// Pick a question template with `rng` and fill it from the product's
/// type, vendor and category. Missing or blank attributes fall back to
/// generic placeholders.
pub fn generate_question<R: Rng + ?Sized>(
    product_type: Option<&str>,
    vendor: Option<&str>,
    category: Option<&str>,
    rng: &mut R,
) -> String {
    let template = TEMPLATES[rng.random_range(0..TEMPLATES.len())];
    template
        .replace("{type}", or_placeholder(product_type, DEFAULT_TYPE))
        .replace("{vendor}", or_placeholder(vendor, DEFAULT_VENDOR))
        .replace("{category}", or_placeholder(category, DEFAULT_CATEGORY))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn same_seed_yields_same_question() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let qa = generate_question(Some("yoga mats"), Some("Acme"), Some("fitness"), &mut a);
        let qb = generate_question(Some("yoga mats"), Some("Acme"), Some("fitness"), &mut b);
        assert_eq!(qa, qb);
    }

    #[test]
    fn every_question_is_fully_substituted() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let q = generate_question(Some("yoga mats"), Some("Acme"), Some("fitness"), &mut rng);
            assert!(!q.contains('{'), "unsubstituted placeholder in {q}");
            assert!(q.ends_with('?'));
        }
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..64 {
            let q = generate_question(None, Some("  "), None, &mut rng);
            assert!(!q.contains('{'));
            assert!(
                q.contains("products") || q.contains("top brands"),
                "expected a placeholder in {q}"
            );
        }
    }

    #[test]
    fn all_templates_are_reachable() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(generate_question(Some("t"), Some("v"), Some("c"), &mut rng));
        }
        assert_eq!(seen.len(), TEMPLATES.len());
    }
}

use rankinai_core::Sentiment;

use crate::lexicon::tokens;

/// Classify the tone of `reply` by counting lexicon hits.
///
/// Each token matching `positive` adds one, each matching `negative` adds
/// one to the other side. Ties, including zero hits, are neutral.
#[must_use]
pub fn classify_sentiment(reply: &str, positive: &[String], negative: &[String]) -> Sentiment {
    let mut pos = 0usize;
    let mut neg = 0usize;

    for token in tokens(reply) {
        if positive.iter().any(|w| *w == token) {
            pos += 1;
        } else if negative.iter().any(|w| *w == token) {
            neg += 1;
        }
    }

    match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn more_positive_words_is_positive() {
        let s = classify_sentiment(
            "I highly recommend it. Excellent grip!",
            &words(&["recommend", "excellent"]),
            &words(&["avoid"]),
        );
        assert_eq!(s, Sentiment::Positive);
    }

    #[test]
    fn more_negative_words_is_negative() {
        let s = classify_sentiment(
            "Avoid this one, it feels flimsy. Great color though.",
            &words(&["great"]),
            &words(&["avoid", "flimsy"]),
        );
        assert_eq!(s, Sentiment::Negative);
    }

    #[test]
    fn tie_is_neutral() {
        let s = classify_sentiment(
            "Great mat but flimsy.",
            &words(&["great"]),
            &words(&["flimsy"]),
        );
        assert_eq!(s, Sentiment::Neutral);
    }

    #[test]
    fn no_lexicon_hits_is_neutral() {
        let s = classify_sentiment("It is a yoga mat.", &words(&["great"]), &words(&["bad"]));
        assert_eq!(s, Sentiment::Neutral);
    }

    #[test]
    fn repeated_words_are_counted_each_time() {
        let s = classify_sentiment(
            "Best, best, best. Avoid the cheap ones.",
            &words(&["best"]),
            &words(&["avoid", "cheap"]),
        );
        assert_eq!(s, Sentiment::Positive);
    }

    #[test]
    fn default_lexicon_reads_recommendation_as_positive() {
        let lex = crate::Lexicons::default();
        let s = classify_sentiment(
            "I recommend the Acme UltraMat Pro for yoga.",
            &lex.positive,
            &lex.negative,
        );
        assert_eq!(s, Sentiment::Positive);
    }

    #[test]
    fn contrast_words_do_not_count_against_the_product() {
        let lex = crate::Lexicons::default();
        let s = classify_sentiment(
            "The Acme UltraMat Pro is great. However, it runs a little large.",
            &lex.positive,
            &lex.negative,
        );
        assert_eq!(s, Sentiment::Positive);
    }
}

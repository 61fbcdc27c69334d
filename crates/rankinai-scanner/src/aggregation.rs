//! Read-side rollups recomputed from the full scan history.
//!
//! Nothing here is a system of record: every value is derived from `scans`
//! and `products` on demand, so recomputing is idempotent and tolerates scans
//! arriving out of timestamp order.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rankinai_core::{AnalyticsWindow, Platform, Product, ProductStatsUpdate, Scan, Sentiment};
use serde::Serialize;

pub const PRODUCT_TOP_COMPETITORS: usize = 5;
pub const SHOP_TOP_ENTRIES: usize = 10;

/// `100 * cited / total`, or 0 when there is nothing to divide by.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn citation_rate(cited: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * cited as f64 / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlatformBreakdown {
    pub platform: Platform,
    pub scans: usize,
    pub cited: usize,
    pub rate: f64,
}

/// Per-platform counts and rates, one entry per [`Platform::ALL`].
#[must_use]
pub fn platform_breakdown(scans: &[Scan]) -> Vec<PlatformBreakdown> {
    Platform::ALL
        .iter()
        .map(|&platform| {
            let (total, cited) = scans
                .iter()
                .filter(|s| s.platform == platform)
                .fold((0, 0), |(t, c), s| (t + 1, c + usize::from(s.is_cited)));
            PlatformBreakdown {
                platform,
                scans: total,
                cited,
                rate: citation_rate(cited, total),
            }
        })
        .collect()
}

/// Cached product fields for a scan history.
///
/// `last_scan_at` is the newest scan's timestamp so repeated recomputation
/// over the same history writes identical values; `fallback_time` is used
/// only for an empty history.
#[must_use]
pub fn compute_product_stats(scans: &[Scan], fallback_time: DateTime<Utc>) -> ProductStatsUpdate {
    let cited = scans.iter().filter(|s| s.is_cited).count();
    let platforms = platform_breakdown(scans);
    let rate_for = |platform: Platform| {
        platforms
            .iter()
            .find(|b| b.platform == platform)
            .map_or(0.0, |b| b.rate)
    };

    ProductStatsUpdate {
        citation_rate: citation_rate(cited, scans.len()),
        chatgpt_rate: rate_for(Platform::ChatGpt),
        gemini_rate: rate_for(Platform::Gemini),
        total_scans: i32::try_from(scans.len()).unwrap_or(i32::MAX),
        last_scan_at: scans
            .iter()
            .map(|s| s.created_at)
            .max()
            .unwrap_or(fallback_time),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    pub name: String,
    pub count: usize,
}

/// Count case-insensitive occurrences and return the `top_n` most frequent.
/// Ties keep first-seen order; the first spelling seen is reported.
pub fn rank_frequencies<'a, I>(items: I, top_n: usize) -> Vec<RankedCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ranked: Vec<(String, RankedCount)> = Vec::new();
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let key = item.to_lowercase();
        match ranked.iter_mut().find(|(k, _)| *k == key) {
            Some((_, entry)) => entry.count += 1,
            None => ranked.push((
                key,
                RankedCount {
                    name: item.to_string(),
                    count: 1,
                },
            )),
        }
    }
    // Stable sort preserves first-seen order among equal counts.
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    ranked.into_iter().take(top_n).map(|(_, r)| r).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[must_use]
pub fn sentiment_distribution(scans: &[Scan]) -> SentimentDistribution {
    let mut dist = SentimentDistribution::default();
    for sentiment in scans.iter().filter_map(|s| s.sentiment) {
        match sentiment {
            Sentiment::Positive => dist.positive += 1,
            Sentiment::Neutral => dist.neutral += 1,
            Sentiment::Negative => dist.negative += 1,
        }
    }
    dist
}

/// Mean list position over cited scans that have one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_position(scans: &[Scan]) -> Option<f64> {
    let positions: Vec<i32> = scans
        .iter()
        .filter(|s| s.is_cited)
        .filter_map(|s| s.citation_position)
        .collect();
    if positions.is_empty() {
        return None;
    }
    let sum: i64 = positions.iter().map(|&p| i64::from(p)).sum();
    Some(sum as f64 / positions.len() as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub scans: usize,
    pub cited: usize,
    pub rate: f64,
}

/// One point per UTC day that has scans, oldest first.
#[must_use]
pub fn daily_trend(scans: &[Scan]) -> Vec<TrendPoint> {
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for scan in scans {
        let entry = days.entry(scan.created_at.date_naive()).or_default();
        entry.0 += 1;
        entry.1 += usize::from(scan.is_cited);
    }
    days.into_iter()
        .map(|(date, (total, cited))| TrendPoint {
            date,
            scans: total,
            cited,
            rate: citation_rate(cited, total),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizationComparison {
    pub optimized_products: usize,
    pub optimized_average_rate: Option<f64>,
    pub unoptimized_products: usize,
    pub unoptimized_average_rate: Option<f64>,
}

/// Average cached citation rate of products that have applied an
/// optimization against those that have not.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn optimization_comparison(products: &[Product]) -> OptimizationComparison {
    let (optimized, unoptimized): (Vec<&Product>, Vec<&Product>) = products
        .iter()
        .partition(|p| p.last_optimized_at.is_some());
    let average = |group: &[&Product]| {
        (!group.is_empty())
            .then(|| group.iter().map(|p| p.citation_rate).sum::<f64>() / group.len() as f64)
    };

    OptimizationComparison {
        optimized_products: optimized.len(),
        optimized_average_rate: average(&optimized),
        unoptimized_products: unoptimized.len(),
        unoptimized_average_rate: average(&unoptimized),
    }
}

/// Newest scan per platform, in [`Platform::ALL`] order.
#[must_use]
pub fn latest_per_platform(scans: &[Scan]) -> Vec<&Scan> {
    Platform::ALL
        .iter()
        .filter_map(|&platform| {
            scans
                .iter()
                .filter(|s| s.platform == platform)
                .max_by_key(|s| (s.created_at, s.id))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    pub product_id: i64,
    pub citation_rate: f64,
    pub chatgpt_rate: f64,
    pub gemini_rate: f64,
    pub total_scans: i32,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub last_optimized_at: Option<DateTime<Utc>>,
    pub platforms: Vec<PlatformBreakdown>,
    pub latest_scans: Vec<Scan>,
    pub top_competitors: Vec<RankedCount>,
    pub sentiment: SentimentDistribution,
    pub average_position: Option<f64>,
}

/// Rates come from the product's cached fields; everything else from `scans`.
#[must_use]
pub fn product_stats(product: &Product, scans: &[Scan]) -> ProductStats {
    ProductStats {
        product_id: product.id,
        citation_rate: product.citation_rate,
        chatgpt_rate: product.chatgpt_rate,
        gemini_rate: product.gemini_rate,
        total_scans: product.total_scans,
        last_scan_at: product.last_scan_at,
        last_optimized_at: product.last_optimized_at,
        platforms: platform_breakdown(scans),
        latest_scans: latest_per_platform(scans).into_iter().cloned().collect(),
        top_competitors: rank_frequencies(
            scans.iter().flat_map(|s| s.competitors.iter().map(String::as_str)),
            PRODUCT_TOP_COMPETITORS,
        ),
        sentiment: sentiment_distribution(scans),
        average_position: average_position(scans),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopAnalytics {
    pub shop_id: i64,
    pub window: AnalyticsWindow,
    pub since: Option<DateTime<Utc>>,
    pub product_count: usize,
    pub total_scans: usize,
    pub cited_scans: usize,
    pub citation_rate: f64,
    pub platforms: Vec<PlatformBreakdown>,
    pub trend: Vec<TrendPoint>,
    pub top_competitors: Vec<RankedCount>,
    pub top_missing_topics: Vec<RankedCount>,
    pub top_ignored_features: Vec<RankedCount>,
    pub sentiment: SentimentDistribution,
    pub average_position: Option<f64>,
    pub optimization_impact: OptimizationComparison,
}

/// Shop rollup over `scans`, which the caller has already limited to the
/// window. The optimization comparison uses all-time cached product rates.
#[must_use]
pub fn shop_analytics(
    shop_id: i64,
    window: AnalyticsWindow,
    since: Option<DateTime<Utc>>,
    products: &[Product],
    scans: &[Scan],
) -> ShopAnalytics {
    let cited = scans.iter().filter(|s| s.is_cited).count();
    let ranked = |pick: fn(&Scan) -> &[String]| {
        rank_frequencies(
            scans.iter().flat_map(|s| pick(s).iter().map(String::as_str)),
            SHOP_TOP_ENTRIES,
        )
    };

    ShopAnalytics {
        shop_id,
        window,
        since,
        product_count: products.len(),
        total_scans: scans.len(),
        cited_scans: cited,
        citation_rate: citation_rate(cited, scans.len()),
        platforms: platform_breakdown(scans),
        trend: daily_trend(scans),
        top_competitors: ranked(|s| s.competitors.as_slice()),
        top_missing_topics: ranked(|s| s.missing_topics.as_slice()),
        top_ignored_features: ranked(|s| s.ignored_features.as_slice()),
        sentiment: sentiment_distribution(scans),
        average_position: average_position(scans),
        optimization_impact: optimization_comparison(products),
    }
}


#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::fixtures::{product, scan};
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn rate_of_empty_history_is_zero() {
        assert!(citation_rate(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_partition_by_platform() {
        let t = Utc::now();
        let scans = vec![
            scan(1, Platform::ChatGpt, true, t),
            scan(2, Platform::ChatGpt, true, t),
            scan(3, Platform::ChatGpt, false, t),
            scan(4, Platform::Gemini, false, t),
            scan(5, Platform::Gemini, false, t),
        ];
        let stats = compute_product_stats(&scans, t);
        assert!(approx(stats.chatgpt_rate, 66.7));
        assert!(stats.gemini_rate.abs() < f64::EPSILON);
        assert!(approx(stats.citation_rate, 40.0));
        assert_eq!(stats.total_scans, 5);
    }

    #[test]
    fn stats_do_not_depend_on_arrival_order() {
        let t = Utc::now();
        let mut scans = vec![
            scan(1, Platform::Gemini, true, t - Duration::minutes(5)),
            scan(2, Platform::ChatGpt, false, t),
            scan(3, Platform::ChatGpt, true, t - Duration::minutes(9)),
        ];
        let forward = compute_product_stats(&scans, t);
        scans.reverse();
        assert_eq!(compute_product_stats(&scans, t), forward);
        assert_eq!(forward.last_scan_at, t);
    }

    #[test]
    fn empty_history_uses_fallback_time() {
        let t = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let stats = compute_product_stats(&[], t);
        assert_eq!(stats.total_scans, 0);
        assert_eq!(stats.last_scan_at, t);
    }

    #[test]
    fn frequency_ties_keep_first_seen_order() {
        let ranked = rank_frequencies(
            ["Manduka", "Gaiam", "gaiam", "Liforme", "Manduka", "Jade"],
            3,
        );
        assert_eq!(
            ranked,
            vec![
                RankedCount {
                    name: "Manduka".to_string(),
                    count: 2
                },
                RankedCount {
                    name: "Gaiam".to_string(),
                    count: 2
                },
                RankedCount {
                    name: "Liforme".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn average_position_ignores_uncited_and_unlisted() {
        let t = Utc::now();
        let mut a = scan(1, Platform::ChatGpt, true, t);
        a.citation_position = Some(1);
        let mut b = scan(2, Platform::ChatGpt, true, t);
        b.citation_position = Some(4);
        let c = scan(3, Platform::ChatGpt, true, t);
        let mut d = scan(4, Platform::ChatGpt, false, t);
        d.citation_position = Some(9);
        let avg = average_position(&[a, b, c, d]).unwrap();
        assert!((avg - 2.5).abs() < f64::EPSILON);
        assert_eq!(average_position(&[]), None);
    }

    #[test]
    fn trend_groups_by_utc_day() {
        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 0).unwrap();
        let trend = daily_trend(&[
            scan(1, Platform::ChatGpt, true, day2),
            scan(2, Platform::ChatGpt, true, day1),
            scan(3, Platform::Gemini, false, day1),
        ]);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, day1.date_naive());
        assert_eq!(trend[0].scans, 2);
        assert!(approx(trend[0].rate, 50.0));
        assert!(approx(trend[1].rate, 100.0));
    }

    #[test]
    fn comparison_splits_on_last_optimized_at() {
        let products = vec![
            product(1, 60.0, true),
            product(2, 20.0, false),
            product(3, 40.0, false),
        ];
        let cmp = optimization_comparison(&products);
        assert_eq!(cmp.optimized_products, 1);
        assert!(approx(cmp.optimized_average_rate.unwrap(), 60.0));
        assert!(approx(cmp.unoptimized_average_rate.unwrap(), 30.0));
        assert_eq!(optimization_comparison(&[]).optimized_average_rate, None);
    }

    #[test]
    fn latest_per_platform_picks_newest_each() {
        let t = Utc::now();
        let scans = vec![
            scan(1, Platform::ChatGpt, true, t - Duration::hours(2)),
            scan(2, Platform::ChatGpt, false, t),
            scan(3, Platform::Gemini, true, t - Duration::hours(1)),
        ];
        let ids: Vec<i64> = latest_per_platform(&scans).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn shop_rollup_counts_gap_lists() {
        let t = Utc::now();
        let mut a = scan(1, Platform::ChatGpt, true, t);
        a.missing_topics = vec!["grip".to_string(), "price".to_string()];
        a.sentiment = Some(Sentiment::Positive);
        let mut b = scan(2, Platform::Gemini, false, t);
        b.missing_topics = vec!["price".to_string()];
        b.ignored_features = vec!["eco-friendly".to_string()];

        let analytics = shop_analytics(
            1,
            AnalyticsWindow::AllTime,
            None,
            &[product(1, 50.0, false)],
            &[a, b],
        );
        assert_eq!(analytics.total_scans, 2);
        assert_eq!(analytics.cited_scans, 1);
        assert_eq!(analytics.top_missing_topics[0].name, "price");
        assert_eq!(analytics.top_missing_topics[0].count, 2);
        assert_eq!(analytics.top_ignored_features.len(), 1);
        assert_eq!(analytics.sentiment.positive, 1);
        assert_eq!(analytics.product_count, 1);
    }
}

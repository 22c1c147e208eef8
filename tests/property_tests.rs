//! Property-based tests for aria-store
//!
//! - Identifier formatting and parsing agree
//! - Date-range filtering is inclusive and order-consistent
//! - Run with ProptestConfig::with_cases(100)

use aria_store::experiment::{Category, ExperimentFilters, ExperimentLog};
use aria_store::id::{experiment_id, parse_experiment_id, short_id, KNOWLEDGE_PREFIX};
use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Generate a calendar date between 1970 and 2199
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2200, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-c]", 0..4)
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Identifier Properties
    // ========================================================================

    /// Property: formatted experiment ids parse back to their parts
    #[test]
    fn prop_experiment_id_parses_back(date in arb_date(), seq in 1u32..=999) {
        let id = experiment_id(date, seq);
        let key = parse_experiment_id(&id).unwrap();
        prop_assert_eq!(key.sequence, seq);
        prop_assert_eq!(key.date(), ymd(date));
    }

    /// Property: anything that is not exactly EXP-YYYY-MM-DD-NNN is rejected
    #[test]
    fn prop_parse_rejects_wrong_digit_counts(
        date in arb_date(),
        seq in 1000u32..100_000
    ) {
        let id = experiment_id(date, seq);
        prop_assert!(parse_experiment_id(&id).is_err());
        prop_assert!(parse_experiment_id(&id.to_lowercase()).is_err());
    }

    /// Property: short ids are prefix + 8 hex chars
    #[test]
    fn prop_short_id_shape(_n in 0u8..10) {
        let id = short_id(KNOWLEDGE_PREFIX);
        prop_assert_eq!(id.len(), 11);
        prop_assert!(id.starts_with("KN-"));
        prop_assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    // ========================================================================
    // Filter Properties
    // ========================================================================

    /// Property: a date range includes exactly the dates between its bounds
    #[test]
    fn prop_date_range_inclusive(a in arb_date(), b in arb_date(), probe in arb_date()) {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let filters = ExperimentFilters {
            date_from: Some(ymd(from)),
            date_to: Some(ymd(to)),
            ..ExperimentFilters::default()
        };
        prop_assert!(filters.includes_date(&ymd(from)));
        prop_assert!(filters.includes_date(&ymd(to)));
        prop_assert_eq!(filters.includes_date(&ymd(probe)), from <= probe && probe <= to);
    }

    /// Property: tag filtering requires every requested tag
    #[test]
    fn prop_experiment_tags_all(log_tags in arb_tags(), wanted in arb_tags()) {
        let log = ExperimentLog::create(
            ExperimentLog::builder("t", Category::Other).tags(log_tags.clone()),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            1,
        );
        let filters = ExperimentFilters {
            tags: Some(wanted.clone()),
            ..ExperimentFilters::default()
        };
        prop_assert_eq!(filters.matches(&log), wanted.iter().all(|t| log_tags.contains(t)));
    }
}

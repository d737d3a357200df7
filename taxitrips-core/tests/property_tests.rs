//! Property tests for manifest invariants.
//!
//! Uses proptest to verify:
//! 1. Count — one identifier per month in the inclusive range
//! 2. Order — identifiers are strictly chronological and unique
//! 3. Inversion — start after end is always a config error
//! 4. Naming — every identifier parses back to its own month

use proptest::prelude::*;
use std::collections::HashSet;
use taxitrips_core::manifest::{generate_range, FileNaming};
use taxitrips_core::{ConfigError, YearMonth};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_month() -> impl Strategy<Value = YearMonth> {
    (1990u16..2100, 1u8..=12).prop_map(|(y, m)| YearMonth::new(y, m).unwrap())
}

fn arb_range() -> impl Strategy<Value = (YearMonth, YearMonth)> {
    (arb_month(), arb_month()).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

fn expected_len(start: YearMonth, end: YearMonth) -> usize {
    let ordinal = |ym: YearMonth| ym.year() as i64 * 12 + ym.month() as i64;
    (ordinal(end) - ordinal(start) + 1) as usize
}

// ── 1. Count ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn manifest_has_one_entry_per_month((start, end) in arb_range()) {
        let ids = generate_range(start, end, &FileNaming::default()).unwrap();
        prop_assert_eq!(ids.len(), expected_len(start, end));
        prop_assert_eq!(ids.first().map(|id| id.month()), Some(start));
        prop_assert_eq!(ids.last().map(|id| id.month()), Some(end));
    }
}

// ── 2. Order and uniqueness ──────────────────────────────────────────

proptest! {
    #[test]
    fn manifest_is_strictly_chronological((start, end) in arb_range()) {
        let ids = generate_range(start, end, &FileNaming::default()).unwrap();
        for pair in ids.windows(2) {
            prop_assert!(pair[0].month() < pair[1].month());
            prop_assert_eq!(pair[0].month().ordinal() + 1, pair[1].month().ordinal());
        }
        let unique: HashSet<&str> = ids.iter().map(|id| id.name()).collect();
        prop_assert_eq!(unique.len(), ids.len());
    }
}

// ── 3. Inversion ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn inverted_range_is_rejected(a in arb_month(), b in arb_month()) {
        prop_assume!(a != b);
        let (early, late) = if a < b { (a, b) } else { (b, a) };
        let result = generate_range(late, early, &FileNaming::default());
        let is_inverted = matches!(result, Err(ConfigError::InvertedRange { .. }));
        prop_assert!(is_inverted);
    }
}

// ── 4. Naming round trip ─────────────────────────────────────────────

proptest! {
    #[test]
    fn identifiers_parse_back(month in arb_month()) {
        let naming = FileNaming::default();
        let id = naming.identifier(month);
        prop_assert_eq!(naming.parse(id.name()), Some(id.clone()));
        prop_assert_eq!(month.to_string().parse::<YearMonth>().unwrap(), month);
    }
}

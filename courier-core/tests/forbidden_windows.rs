//! Property-based tests for forbidden-window computation.
//!
//! # Invariants tested
//!
//! - **Disjointness:** no minute is both allowed and forbidden.
//! - **Coverage:** every minute of the day is either allowed or forbidden.
//! - **Ordering:** forbidden periods are sorted and never overlap.

use courier_core::{DAY_END, DAY_START, TimeWindow, forbidden_windows};
use proptest::prelude::*;

fn window_strategy() -> impl Strategy<Value = TimeWindow> {
    (-100_i64..1600, 0_i64..400).prop_map(|(start, length)| TimeWindow::new(start, start + length))
}

fn allowed(windows: &[TimeWindow], minute: i64) -> bool {
    windows.iter().any(|w| w.contains(minute))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: allowed and forbidden minutes partition the day.
    #[test]
    fn forbidden_periods_complement_allowed_windows(
        windows in prop::collection::vec(window_strategy(), 1..5),
    ) {
        let forbidden = forbidden_windows(&windows);
        for minute in DAY_START..=DAY_END {
            prop_assert_ne!(
                allowed(&windows, minute),
                forbidden.forbids(minute),
                "minute {} misclassified for {:?}",
                minute,
                windows
            );
        }
    }

    /// Property: periods are closed, sorted and separated by allowed time.
    #[test]
    fn forbidden_periods_are_sorted_and_disjoint(
        windows in prop::collection::vec(window_strategy(), 1..5),
    ) {
        let forbidden = forbidden_windows(&windows);
        prop_assert_eq!(forbidden.starts.len(), forbidden.ends.len());
        let periods: Vec<(i64, i64)> = forbidden.iter().collect();
        for (start, end) in &periods {
            prop_assert!(start <= end);
            prop_assert!(*start >= DAY_START && *end <= DAY_END);
        }
        for pair in periods.windows(2) {
            if let [(_, earlier_end), (later_start, _)] = pair {
                prop_assert!(earlier_end + 1 < *later_start);
            }
        }
    }
}

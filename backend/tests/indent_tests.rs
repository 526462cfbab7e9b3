//! Indent (material request) tests
//!
//! Covers MRN formatting and uniqueness, and the indent status machine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use shared::{format_mrn, indent_transition_allowed, IndentStatus};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// MRN layout: MRN-<YYYYMM>-<5-digit sequence>
    #[test]
    fn test_mrn_format() {
        let at = Utc.with_ymd_and_hms(2025, 7, 14, 10, 0, 0).unwrap();
        assert_eq!(format_mrn(at, 1), "MRN-202507-00001");
        assert_eq!(format_mrn(at, 99_999), "MRN-202507-99999");
    }

    /// Single-digit months are zero-padded
    #[test]
    fn test_mrn_month_padding() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(format_mrn(at, 12), "MRN-202601-00012");
    }

    /// New indents start Submitted; both forward transitions are open
    #[test]
    fn test_initial_status_transitions() {
        assert!(indent_transition_allowed(
            IndentStatus::Submitted,
            IndentStatus::Processing
        ));
        assert!(indent_transition_allowed(
            IndentStatus::Submitted,
            IndentStatus::Cancelled
        ));
    }

    /// Completed and Cancelled are terminal
    #[test]
    fn test_terminal_statuses() {
        for terminal in [IndentStatus::Completed, IndentStatus::Cancelled] {
            for target in [
                IndentStatus::Submitted,
                IndentStatus::Processing,
                IndentStatus::Completed,
                IndentStatus::Cancelled,
            ] {
                assert!(!indent_transition_allowed(terminal, target));
            }
        }
    }

    /// Going backwards is never allowed
    #[test]
    fn test_no_backward_transitions() {
        assert!(!indent_transition_allowed(
            IndentStatus::Processing,
            IndentStatus::Submitted
        ));
    }

    /// Stored status strings round-trip through the parser
    #[test]
    fn test_status_round_trip() {
        for status in [
            IndentStatus::Submitted,
            IndentStatus::Processing,
            IndentStatus::Completed,
            IndentStatus::Cancelled,
        ] {
            assert_eq!(IndentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(IndentStatus::parse("Rejected"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Distinct sequence values always produce distinct MRNs, whatever
        /// the timestamps; uniqueness rides entirely on the sequence
        #[test]
        fn prop_mrn_unique_per_sequence(
            a in 1i64..=9_000_000,
            b in 1i64..=9_000_000,
            month_a in 1u32..=12,
            month_b in 1u32..=12
        ) {
            prop_assume!(a != b);
            let at_a = Utc.with_ymd_and_hms(2025, month_a, 1, 0, 0, 0).unwrap();
            let at_b = Utc.with_ymd_and_hms(2025, month_b, 1, 0, 0, 0).unwrap();
            prop_assert_ne!(format_mrn(at_a, a), format_mrn(at_b, b));
        }

        /// MRNs from a monotonic sequence sort with the sequence inside a
        /// month (5-digit zero padding keeps string order aligned)
        #[test]
        fn prop_mrn_sorts_with_sequence(a in 1i64..=99_998) {
            let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
            prop_assert!(format_mrn(at, a) < format_mrn(at, a + 1));
        }

        /// The status machine admits no transition out of a terminal state
        #[test]
        fn prop_terminal_is_terminal(
            from in prop_oneof![Just(IndentStatus::Completed), Just(IndentStatus::Cancelled)],
            to in prop_oneof![
                Just(IndentStatus::Submitted),
                Just(IndentStatus::Processing),
                Just(IndentStatus::Completed),
                Just(IndentStatus::Cancelled)
            ]
        ) {
            prop_assert!(!indent_transition_allowed(from, to));
        }
    }
}

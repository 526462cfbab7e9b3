//! Document reference formatting for generated business numbers

use chrono::{DateTime, Datelike, Utc};

/// Format a Material Request Number from a sequence value.
///
/// Layout: `MRN-<YYYYMM>-<5-digit zero-padded sequence>`. The sequence comes
/// from a database-owned monotonic counter, so uniqueness holds across
/// concurrent requests and server processes.
pub fn format_mrn(at: DateTime<Utc>, sequence: i64) -> String {
    format!("MRN-{:04}{:02}-{:05}", at.year(), at.month(), sequence)
}

/// Format a Goods Received Note number from a sequence value.
///
/// Layout: `GRN-<YYYYMM>-<4-digit zero-padded sequence>`.
pub fn format_grn_number(at: DateTime<Utc>, sequence: i64) -> String {
    format!("GRN-{:04}{:02}-{:04}", at.year(), at.month(), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mrn_is_zero_padded() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(format_mrn(at, 42), "MRN-202503-00042");
    }

    #[test]
    fn mrn_keeps_wide_sequences() {
        let at = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        assert_eq!(format_mrn(at, 123_456), "MRN-202511-123456");
    }

    #[test]
    fn grn_number_is_zero_padded() {
        let at = Utc.with_ymd_and_hms(2024, 12, 23, 8, 30, 0).unwrap();
        assert_eq!(format_grn_number(at, 7), "GRN-202412-0007");
    }
}

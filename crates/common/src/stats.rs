//! Roll-up counters over a set of findings.

use crate::{MatchRecord, Severity};
use serde::Serialize;

/// Strong/weak counters for one scanned root, or for a whole scan.
///
/// The presentation layer bases its pass/fail decision on these three
/// numbers; `total` is always the sum of the other two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStatistics {
    pub strong: usize,
    pub weak: usize,
}

impl ScanStatistics {
    /// Counts one finding.
    pub fn tally(&mut self, severity: Severity) {
        match severity {
            Severity::Strong => self.strong += 1,
            Severity::Weak => self.weak += 1,
        }
    }

    /// Adds another counter set into this one.
    pub fn merge(&mut self, other: ScanStatistics) {
        self.strong += other.strong;
        self.weak += other.weak;
    }

    /// Total number of findings.
    pub fn total(&self) -> usize {
        self.strong + self.weak
    }

    /// Tallies every record in a slice.
    pub fn from_records(records: &[MatchRecord]) -> Self {
        let mut stats = ScanStatistics::default();
        for record in records {
            stats.tally(record.severity);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(severity: Severity) -> MatchRecord {
        MatchRecord {
            relative_path: "a.php".into(),
            absolute_path: "/p/a.php".into(),
            line: 1,
            severity,
            message: "m".into(),
            rule_id: "ConstantMatcher".into(),
            docs: vec![],
        }
    }

    #[test]
    fn test_total_is_sum() {
        let mut stats = ScanStatistics::default();
        stats.tally(Severity::Strong);
        stats.tally(Severity::Strong);
        stats.tally(Severity::Weak);
        assert_eq!(stats.strong, 2);
        assert_eq!(stats.weak, 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_merge() {
        let mut a = ScanStatistics { strong: 1, weak: 2 };
        a.merge(ScanStatistics { strong: 3, weak: 4 });
        assert_eq!(a, ScanStatistics { strong: 4, weak: 6 });
        assert_eq!(a.total(), 10);
    }

    #[test]
    fn test_from_records_matches_severities() {
        let records = vec![
            make_record(Severity::Strong),
            make_record(Severity::Weak),
            make_record(Severity::Strong),
        ];
        let stats = ScanStatistics::from_records(&records);
        assert_eq!(stats.strong, 2);
        assert_eq!(stats.weak, 1);
        assert_eq!(stats.total(), records.len());
    }

    #[test]
    fn test_empty() {
        let stats = ScanStatistics::from_records(&[]);
        assert_eq!(stats.total(), 0);
    }
}

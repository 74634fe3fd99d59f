//! Folding listing pages into the running report
//!
//! Aggregation is pure over the page records and commutative per record, so
//! pages may fold in any order. Each record lands in exactly one
//! classification (issue vs. pull request) and exactly one age bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper-bound age thresholds, in seconds, for the distribution histogram.
///
/// An age belongs to the first bucket whose threshold is strictly greater
/// than it; the last threshold doubles as the catch-all for anything older.
pub const DISTRIBUTION_THRESHOLDS: [u64; 11] = [
    3_600,
    10_800,
    32_400,
    97_200,
    291_600,
    874_800,
    2_624_400,
    7_873_200,
    23_619_600,
    70_858_800,
    212_576_400,
];

/// One record from the issues listing.
///
/// Pull requests appear in the same listing with a `pull_request` key
/// attached; its presence is the discriminator. Fields this crate does not
/// aggregate are ignored on deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueRecord {
    /// Lifecycle state, `"open"` or `"closed"`.
    pub state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Closing timestamp, absent while the record is open.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    /// Present (with link metadata this crate ignores) when the record is a
    /// pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRecord {
    /// Whether this record is a pull request rather than a plain issue.
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// How long the record has been open (or was open before closing), in
    /// whole seconds. `now` stands in for the closing time of open records.
    #[must_use]
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.closed_at.unwrap_or(now) - self.created_at).num_seconds()
    }
}

/// Age histogram keyed by bucket threshold, pre-zeroed for every bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    buckets: BTreeMap<u64, u64>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            buckets: DISTRIBUTION_THRESHOLDS
                .iter()
                .map(|&threshold| (threshold, 0))
                .collect(),
        }
    }
}

impl Distribution {
    /// Count a record of age `age_secs`.
    ///
    /// An age exactly equal to a threshold falls into the next bucket (the
    /// match requires strictly-less-than); ages at or beyond the largest
    /// threshold land in the final catch-all bucket.
    pub fn record(&mut self, age_secs: i64) {
        let threshold = DISTRIBUTION_THRESHOLDS
            .iter()
            .copied()
            .find(|&threshold| age_secs < threshold as i64)
            .unwrap_or(DISTRIBUTION_THRESHOLDS[DISTRIBUTION_THRESHOLDS.len() - 1]);

        if let Some(slot) = self.buckets.get_mut(&threshold) {
            *slot += 1;
        }
    }

    /// Count held by the bucket keyed by `threshold`.
    #[must_use]
    pub fn get(&self, threshold: u64) -> u64 {
        self.buckets.get(&threshold).copied().unwrap_or(0)
    }

    /// Sum over every bucket. Always equals the owning aggregate's count.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }
}

/// Aggregate for one record classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueStats {
    /// Total records seen.
    pub count: u64,
    /// Records still open.
    pub open_count: u64,
    /// Age histogram over all records.
    pub distribution: Distribution,
}

/// Combined report: issues and pull requests aggregated separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    /// Aggregate over plain issues.
    pub issues: IssueStats,
    /// Aggregate over pull requests.
    pub pull_requests: IssueStats,
}

/// Fold one page of records into the report.
pub fn aggregate_page(records: &[IssueRecord], report: &mut StatsReport, now: DateTime<Utc>) {
    for record in records {
        let stats = if record.is_pull_request() {
            &mut report.pull_requests
        } else {
            &mut report.issues
        };

        stats.count += 1;
        if record.state == "open" {
            stats.open_count += 1;
        }
        stats.distribution.record(record.age_secs(now));
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn record(is_pr: bool, state: &str, created_secs_ago: i64, closed_secs_ago: Option<i64>) -> IssueRecord {
        let now = Utc::now();
        IssueRecord {
            state: state.to_owned(),
            created_at: now - TimeDelta::seconds(created_secs_ago),
            closed_at: closed_secs_ago.map(|ago| now - TimeDelta::seconds(ago)),
            pull_request: is_pr.then(|| serde_json::json!({})),
        }
    }

    fn aged(age_secs: i64) -> IssueRecord {
        let created = Utc::now() - TimeDelta::seconds(age_secs);
        IssueRecord {
            state: "closed".to_owned(),
            created_at: created,
            closed_at: Some(created + TimeDelta::seconds(age_secs)),
            pull_request: None,
        }
    }

    #[test]
    fn records_split_by_classification() {
        let mut report = StatsReport::default();
        let records = vec![
            record(false, "open", 100, None),
            record(true, "open", 100, None),
            record(false, "closed", 100, Some(50)),
        ];

        aggregate_page(&records, &mut report, Utc::now());

        assert_eq!(report.issues.count, 2);
        assert_eq!(report.issues.open_count, 1);
        assert_eq!(report.pull_requests.count, 1);
        assert_eq!(report.pull_requests.open_count, 1);
    }

    #[test]
    fn bucket_sums_equal_counts() {
        let mut report = StatsReport::default();
        let records: Vec<_> = [0, 59, 3_600, 90_000, 300_000_000]
            .into_iter()
            .map(aged)
            .collect();

        aggregate_page(&records, &mut report, Utc::now());

        assert_eq!(report.issues.distribution.total(), report.issues.count);
        assert_eq!(
            report.pull_requests.distribution.total(),
            report.pull_requests.count
        );
    }

    #[test]
    fn zero_age_lands_in_first_bucket() {
        let mut distribution = Distribution::default();
        distribution.record(0);
        assert_eq!(distribution.get(3_600), 1);
    }

    #[test]
    fn age_equal_to_threshold_falls_into_next_bucket() {
        let mut distribution = Distribution::default();
        distribution.record(3_600);
        assert_eq!(distribution.get(3_600), 0);
        assert_eq!(distribution.get(10_800), 1);
    }

    #[test]
    fn age_beyond_largest_threshold_lands_in_catch_all() {
        let mut distribution = Distribution::default();
        distribution.record(212_576_400);
        distribution.record(1_000_000_000);
        assert_eq!(distribution.get(212_576_400), 2);
    }

    #[test]
    fn negative_age_lands_in_first_bucket() {
        let mut distribution = Distribution::default();
        distribution.record(-5);
        assert_eq!(distribution.get(3_600), 1);
    }

    #[test]
    fn all_buckets_start_at_zero() {
        let distribution = Distribution::default();
        assert_eq!(distribution.total(), 0);
        for threshold in DISTRIBUTION_THRESHOLDS {
            assert_eq!(distribution.get(threshold), 0);
        }
    }

    #[test]
    fn closed_records_age_by_closing_time_not_now() {
        // Created 10 days ago, closed 30 minutes later: the age is 30
        // minutes, regardless of when the aggregation runs.
        let day = 86_400;
        let records = vec![record(false, "closed", 10 * day, Some(10 * day - 1_800))];
        let mut report = StatsReport::default();

        aggregate_page(&records, &mut report, Utc::now());

        assert_eq!(report.issues.distribution.get(3_600), 1);
    }

    #[test]
    fn open_records_age_against_the_supplied_now() {
        let now = Utc::now();
        let records = vec![IssueRecord {
            state: "open".to_owned(),
            created_at: now - TimeDelta::seconds(10),
            closed_at: None,
            pull_request: Some(serde_json::json!({})),
        }];
        let mut report = StatsReport::default();

        aggregate_page(&records, &mut report, now);

        assert_eq!(report.pull_requests.count, 1);
        assert_eq!(report.pull_requests.open_count, 1);
        assert_eq!(report.pull_requests.distribution.get(3_600), 1);
        assert_eq!(report.issues, IssueStats::default());
    }

    #[test]
    fn aggregation_is_order_independent() {
        let now = Utc::now();
        let page_a: Vec<_> = [10, 4_000, 100_000].into_iter().map(aged).collect();
        let page_b: Vec<_> = [50_000, 500, 300_000_000].into_iter().map(aged).collect();

        let mut forward = StatsReport::default();
        aggregate_page(&page_a, &mut forward, now);
        aggregate_page(&page_b, &mut forward, now);

        let mut reverse = StatsReport::default();
        aggregate_page(&page_b, &mut reverse, now);
        aggregate_page(&page_a, &mut reverse, now);

        assert_eq!(forward, reverse);
    }

    #[test]
    fn open_count_never_exceeds_count() {
        let mut report = StatsReport::default();
        let records = vec![
            record(false, "open", 10, None),
            record(false, "closed", 10, Some(5)),
            record(false, "open", 10, None),
        ];

        aggregate_page(&records, &mut report, Utc::now());

        assert!(report.issues.open_count <= report.issues.count);
        assert_eq!(report.issues.open_count, 2);
    }

    #[test]
    fn listing_body_deserializes_with_extra_fields() {
        let body = r#"[{
            "id": 1,
            "number": 42,
            "title": "Something broke",
            "state": "open",
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "user": {"login": "octocat"}
        }]"#;

        let records: Vec<IssueRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_pull_request());
        assert_eq!(records[0].state, "open");
    }
}

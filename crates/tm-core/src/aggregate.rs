//! Category totals derived from the entry collection.
//!
//! Totals are always recomputed from scratch. Nothing here is maintained
//! incrementally, so a read after any mutation reflects the current log.

use chrono::TimeDelta;
use serde::Serialize;

use crate::entry::TimeEntry;

/// Catch-all bucket for categories outside the recognized set.
pub const OTHER_BUCKET: &str = "Other";

/// Recognized categories when none are configured.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Work", "Rest", "Social Media", "Exercise"];

/// Maps entries to buckets and sums their durations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    recognized: Vec<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

impl Aggregator {
    /// Creates an aggregator for the given recognized categories.
    ///
    /// Blank names, duplicates and `Other` itself are dropped; the `Other`
    /// bucket is always present and always last.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut recognized: Vec<String> = Vec::new();
        for category in categories {
            let category = category.into().trim().to_string();
            if category.is_empty() || category == OTHER_BUCKET {
                continue;
            }
            if !recognized.contains(&category) {
                recognized.push(category);
            }
        }
        Self { recognized }
    }

    /// Recognized categories, in configured order, without `Other`.
    pub fn categories(&self) -> &[String] {
        &self.recognized
    }

    /// Returns the bucket an entry with `category` contributes to.
    pub fn bucket_for<'a>(&'a self, category: &str) -> &'a str {
        self.recognized
            .iter()
            .find(|known| known.as_str() == category)
            .map_or(OTHER_BUCKET, String::as_str)
    }

    /// Sums entry durations per bucket.
    pub fn totals(&self, entries: &[TimeEntry]) -> CategoryTotals {
        let mut buckets: Vec<BucketTotal> = self
            .recognized
            .iter()
            .map(|name| BucketTotal::empty(name))
            .chain(std::iter::once(BucketTotal::empty(OTHER_BUCKET)))
            .collect();

        for entry in entries {
            let name = self.bucket_for(entry.category());
            if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.name == name) {
                bucket.total += entry.duration();
                bucket.entries += 1;
            }
        }

        CategoryTotals { buckets }
    }
}

/// Total time and entry count for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketTotal {
    pub name: String,
    #[serde(rename = "seconds", serialize_with = "serialize_seconds")]
    pub total: TimeDelta,
    pub entries: usize,
}

impl BucketTotal {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            total: TimeDelta::zero(),
            entries: 0,
        }
    }
}

fn serialize_seconds<S: serde::Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.num_seconds())
}

/// Per-bucket totals, recognized buckets first and `Other` last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    buckets: Vec<BucketTotal>,
}

impl CategoryTotals {
    pub fn buckets(&self) -> &[BucketTotal] {
        &self.buckets
    }

    /// Total for a bucket; zero for names that are not buckets.
    pub fn get(&self, bucket: &str) -> TimeDelta {
        self.buckets
            .iter()
            .find(|b| b.name == bucket)
            .map_or_else(TimeDelta::zero, |b| b.total)
    }

    /// Sum across every bucket.
    pub fn overall(&self) -> TimeDelta {
        self.buckets
            .iter()
            .fold(TimeDelta::zero(), |acc, bucket| acc + bucket.total)
    }

    /// Number of entries across every bucket.
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.entries).sum()
    }

    /// Buckets with a positive total, in bucket order.
    pub fn non_empty(&self) -> impl Iterator<Item = &BucketTotal> {
        self.buckets
            .iter()
            .filter(|bucket| bucket.total > TimeDelta::zero())
    }
}

/// Renders a duration as `Xh Ym`, dropping leftover seconds.
pub fn format_hours_minutes(duration: TimeDelta) -> String {
    let total_minutes = duration.num_minutes();
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

/// Renders a duration as `Xm Ys`.
pub fn format_minutes_seconds(duration: TimeDelta) -> String {
    let total_seconds = duration.num_seconds();
    format!("{}m {}s", total_seconds / 60, total_seconds % 60)
}

//! Rating-bucketed vote counts.
//!
//! The backend reports per-editorial scores keyed by rating range strings of
//! the form `"<low>-<high>"` (e.g. `"2700-2799"`). Clients fold those into
//! eight fixed buckets: seven 400-wide bands starting at 0 and one open-ended
//! band for ratings of 2800 and above.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

pub const RATING_BUCKETS: usize = 8;
pub const BUCKET_WIDTH: i64 = 400;
pub const TOP_BUCKET_FLOOR: i64 = 2800;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingHistogram([i64; RATING_BUCKETS]);

impl RatingHistogram {
    pub fn new(buckets: [i64; RATING_BUCKETS]) -> Self {
        Self(buckets)
    }

    /// Fold a backend `scores_by_rating` map into buckets.
    ///
    /// Keys that cannot be interpreted are skipped and returned alongside the
    /// histogram so the caller can report them.
    pub fn from_scores_by_rating<'a, I>(entries: I) -> (Self, Vec<ProtocolError>)
    where
        I: IntoIterator<Item = (&'a String, &'a i64)>,
    {
        let mut histogram = Self::default();
        let mut rejected = Vec::new();
        for (key, count) in entries {
            if let Err(err) = histogram.add_range(key, *count) {
                rejected.push(err);
            }
        }
        (histogram, rejected)
    }

    /// Bucket index for a rating range starting at `low`.
    pub fn bucket_for(low: i64) -> usize {
        if low < TOP_BUCKET_FLOOR {
            (low / BUCKET_WIDTH) as usize
        } else {
            RATING_BUCKETS - 1
        }
    }

    /// Add `count` to the bucket covering the range key; returns the bucket index.
    pub fn add_range(&mut self, key: &str, count: i64) -> Result<usize, ProtocolError> {
        let low = key
            .split_once('-')
            .map(|(low, _)| low)
            .unwrap_or(key)
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|low| *low >= 0)
            .ok_or_else(|| ProtocolError::InvalidRatingRange(key.to_string()))?;
        let bucket = Self::bucket_for(low);
        self.0[bucket] = self.0[bucket].saturating_add(count);
        Ok(bucket)
    }

    pub fn buckets(&self) -> &[i64; RATING_BUCKETS] {
        &self.0
    }

    pub fn get(&self, bucket: usize) -> i64 {
        self.0.get(bucket).copied().unwrap_or_default()
    }

    pub fn total(&self) -> i64 {
        self.0.iter().fold(0i64, |total, n| total.saturating_add(*n))
    }

    /// Human label for a bucket, e.g. `"1200-1599"` or `"2800+"`.
    pub fn bucket_label(bucket: usize) -> String {
        if bucket >= RATING_BUCKETS - 1 {
            return format!("{TOP_BUCKET_FLOOR}+");
        }
        let low = bucket as i64 * BUCKET_WIDTH;
        format!("{}-{}", low, low + BUCKET_WIDTH - 1)
    }
}

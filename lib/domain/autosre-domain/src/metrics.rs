use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::MetricId;

/// Current value per metric id.
pub type MetricState = BTreeMap<MetricId, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: i64,
    pub values: MetricState,
}

/// Trailing window of metric samples. Appends at the tail and evicts the head.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl HistoryBuffer {
    pub const DEFAULT_CAPACITY: usize = 30;

    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild from persisted samples, keeping only the newest `capacity`.
    pub fn from_samples(samples: Vec<HistorySample>, capacity: usize) -> Self {
        let mut buffer = Self::new(capacity);
        for sample in samples {
            buffer.push(sample);
        }
        buffer
    }

    pub fn push(&mut self, sample: HistorySample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<HistorySample> {
        self.samples.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64) -> HistorySample {
        HistorySample {
            timestamp,
            values: MetricState::from([("cpu".to_string(), timestamp as f64)]),
        }
    }

    #[test]
    fn evicts_oldest_after_capacity() {
        let mut buffer = HistoryBuffer::default();
        for ts in 0..31 {
            buffer.push(sample(ts));
        }
        assert_eq!(buffer.len(), 30);
        assert_eq!(buffer.iter().next().map(|s| s.timestamp), Some(1));
        assert_eq!(buffer.latest().map(|s| s.timestamp), Some(30));
    }

    #[test]
    fn from_samples_truncates_to_newest() {
        let samples = (0..10).map(sample).collect();
        let buffer = HistoryBuffer::from_samples(samples, 4);
        let stamps: Vec<i64> = buffer.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![6, 7, 8, 9]);
    }
}

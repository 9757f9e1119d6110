//! Historical store port - read path for baseline and trend data.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait supplying recent composite quality scores.
///
/// The engine only reads: the aggregator pulls the last K scores for
/// baseline and trend computation. Who writes scores (and how they are
/// retained) is the host's concern.
pub trait HistoryProvider: Send + Sync {
    /// The most recent scores, oldest first, at most `limit` entries.
    fn recent_scores(&self, limit: usize) -> Vec<f64>;
}

/// In-process score history with a bounded window.
///
/// Handy for tests and for hosts without durable storage.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    scores: Mutex<VecDeque<f64>>,
    capacity: usize,
}

impl InMemoryHistory {
    /// Create a history retaining at most `capacity` scores.
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Append a score, dropping the oldest past capacity.
    pub fn push(&self, score: f64) {
        let mut scores = self.scores.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if scores.len() == self.capacity {
            scores.pop_front();
        }
        scores.push_back(score);
    }
}

impl HistoryProvider for InMemoryHistory {
    fn recent_scores(&self, limit: usize) -> Vec<f64> {
        let scores = self.scores.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let skip = scores.len().saturating_sub(limit);
        scores.iter().skip(skip).copied().collect()
    }
}

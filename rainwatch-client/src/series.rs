//! Bounded rolling series backing the rain chart.
//!
//! Fixed-capacity FIFO of `(time label, 0|1)` pairs. Once the capacity is
//! reached the single oldest entry is evicted before a new one is
//! appended. No other mutation is exposed; the renderer only reads
//! projections.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingSeries {
    capacity: usize,
    entries: VecDeque<(String, u8)>,
}

impl RollingSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a sample, evicting the oldest entry first when full.
    pub fn push(&mut self, label: String, value: u8) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((label, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time labels in arrival order, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// Rain values in arrival order, oldest first.
    pub fn values(&self) -> Vec<u8> {
        self.entries.iter().map(|&(_, value)| value).collect()
    }
}

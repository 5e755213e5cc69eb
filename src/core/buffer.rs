//! Fixed-capacity sliding window of classified frames.
//!
//! Frames live in a ring indexed by insertion count modulo capacity, so a
//! push that evicts the oldest frame is O(1) and never shifts memory.

use crate::collector::types::{ExpressionSample, SampleError};
use crate::core::emotion::ExpressionLabel;

/// Default window capacity (about two seconds at 60Hz).
pub const DEFAULT_WINDOW_CAPACITY: usize = 120;

/// A validated sample with its dominant label resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionFrame {
    /// Insertion sequence number, assigned by the window
    pub seq: u64,
    /// Dominant classifier label
    pub label: ExpressionLabel,
    /// Confidence of the dominant label
    pub confidence: f64,
    /// The underlying sample
    pub sample: ExpressionSample,
}

impl ExpressionFrame {
    /// Validate a sample and resolve its dominant label.
    pub fn new(sample: ExpressionSample) -> Result<Self, SampleError> {
        sample.validate()?;
        let (label, confidence) = sample.dominant().ok_or(SampleError::EmptyDistribution)?;
        Ok(Self {
            seq: 0,
            label,
            confidence,
            sample,
        })
    }

    pub fn timestamp(&self) -> i64 {
        self.sample.timestamp
    }
}

/// Ring buffer of the most recent frames, oldest first.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    slots: Vec<ExpressionFrame>,
    capacity: usize,
    pushed: u64,
}

impl SlidingWindow {
    /// Create an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            pushed: 0,
        }
    }

    /// Append a frame, evicting the oldest one once the window is full.
    /// Returns the sequence number assigned to the frame.
    pub fn push(&mut self, mut frame: ExpressionFrame) -> u64 {
        let seq = self.pushed;
        frame.seq = seq;

        if self.slots.len() < self.capacity {
            self.slots.push(frame);
        } else {
            let slot = (self.pushed % self.capacity as u64) as usize;
            self.slots[slot] = frame;
        }

        self.pushed += 1;
        seq
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total frames ever pushed, including evicted ones.
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    /// Ring slot holding the oldest frame.
    fn head(&self) -> usize {
        if self.slots.len() < self.capacity {
            0
        } else {
            (self.pushed % self.capacity as u64) as usize
        }
    }

    /// Frame at logical position `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&ExpressionFrame> {
        if index >= self.slots.len() {
            return None;
        }
        self.slots.get((self.head() + index) % self.capacity)
    }

    /// The most recently pushed frame.
    pub fn newest(&self) -> Option<&ExpressionFrame> {
        self.slots.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate frames oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ExpressionFrame> + '_ {
        (0..self.slots.len()).filter_map(move |i| self.get(i))
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

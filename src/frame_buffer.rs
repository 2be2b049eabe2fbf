use crate::landmark::Frame;
use std::collections::VecDeque;
use tracing::trace;

/// Default number of frames retained per session
pub const DEFAULT_BUFFER_CAPACITY: usize = 60;

/// Bounded ring of frames with a parallel visibility flag per frame.
///
/// Pushing into a full buffer evicts the oldest frame. Frames are always kept
/// in arrival order, oldest first.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
    visibility: VecDeque<bool>,
    capacity: usize,
    stats: FrameBufferStats,
}

/// Counters for buffer activity since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameBufferStats {
    /// Total frames pushed
    pub frames_pushed: u64,
    /// Frames dropped to make room for newer ones
    pub frames_evicted: u64,
}

impl FrameBuffer {
    /// Create a buffer holding at most `capacity` frames (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            visibility: VecDeque::with_capacity(capacity),
            capacity,
            stats: FrameBufferStats::default(),
        }
    }

    /// Append a frame, evicting the oldest when full
    pub fn push(&mut self, frame: Frame, visible: bool) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.visibility.pop_front();
            self.stats.frames_evicted += 1;
            trace!("Frame buffer full, evicted oldest frame");
        }

        self.frames.push_back(frame);
        self.visibility.push_back(visible);
        self.stats.frames_pushed += 1;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn latest(&self) -> Option<&Frame> {
        self.frames.back()
    }

    /// The most recent `count` frames, oldest first
    pub fn recent(&self, count: usize) -> Vec<Frame> {
        let skip = self.frames.len().saturating_sub(count);
        self.frames.iter().skip(skip).cloned().collect()
    }

    /// Fraction of the most recent `count` frames flagged visible
    pub fn recent_visibility_ratio(&self, count: usize) -> f64 {
        let skip = self.visibility.len().saturating_sub(count);
        let window = self.visibility.len() - skip;
        if window == 0 {
            return 0.0;
        }
        let visible = self.visibility.iter().skip(skip).filter(|v| **v).count();
        visible as f64 / window as f64
    }

    /// Drop all frames; counters are kept
    pub fn clear(&mut self) {
        self.frames.clear();
        self.visibility.clear();
    }

    pub fn stats(&self) -> FrameBufferStats {
        self.stats
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

//! Per-player history of client orientation reports.
//!
//! Orientation packets arrive on the network path and are appended here
//! independently of interaction processing. An interaction event reads the
//! queue through an [`OrientationQueueHandle`], which takes its view of the
//! queue once and tolerates entries being evicted underneath it.
//!
//! Reads are monotonic per queue: once a sample has been handed out, no
//! older sample is ever returned again.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

use crate::geometry::Orientation;

// ---------------------------------------------------------------------------
// OrientationSample
// ---------------------------------------------------------------------------

/// One decoded orientation report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientationSample {
    sequence: u64,
    pitch: f32,
    yaw: f32,
}

impl OrientationSample {
    /// Creates a sample.
    pub const fn new(sequence: u64, pitch: f32, yaw: f32) -> Self {
        Self {
            sequence,
            pitch,
            yaw,
        }
    }

    /// Monotonic sequence id.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Yaw in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// The sample as an [`Orientation`].
    pub fn orientation(&self) -> Orientation {
        Orientation::new(self.yaw, self.pitch)
    }
}

// ---------------------------------------------------------------------------
// OrientationHistoryQueue
// ---------------------------------------------------------------------------

struct QueueInner {
    samples: VecDeque<OrientationSample>,
    /// Next sequence id handed out by [`OrientationHistoryQueue::push`]; every
    /// recorded sample must be at least this.
    next_sequence: u64,
    /// Lowest sequence id still readable.
    read_floor: u64,
}

/// Bounded FIFO of recent orientation samples with strictly increasing ids.
///
/// Safe to append from one thread while another reads.
pub struct OrientationHistoryQueue {
    inner: Mutex<QueueInner>,
    capacity: usize,
}

impl OrientationHistoryQueue {
    /// Creates an empty queue holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(QueueInner {
                samples: VecDeque::with_capacity(capacity),
                next_sequence: 0,
                read_floor: 0,
            }),
            capacity,
        }
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().samples.is_empty()
    }

    /// Appends a new sample with the next sequence id and returns that id.
    ///
    /// Non-finite angles are dropped and `None` is returned.
    pub fn push(&self, pitch: f32, yaw: f32) -> Option<u64> {
        if !pitch.is_finite() || !yaw.is_finite() {
            return None;
        }
        let mut inner = self.inner.lock();
        let sequence = inner.next_sequence;
        Self::append(&mut inner, self.capacity, OrientationSample::new(sequence, pitch, yaw));
        Some(sequence)
    }

    /// Appends an already-sequenced sample.
    ///
    /// Samples whose id does not increase on the last one, or whose angles
    /// are not finite, are dropped and `false` is returned.
    pub fn record(&self, sample: OrientationSample) -> bool {
        if !sample.orientation().is_finite() {
            return false;
        }
        let mut inner = self.inner.lock();
        if sample.sequence < inner.next_sequence {
            return false;
        }
        Self::append(&mut inner, self.capacity, sample);
        true
    }

    fn append(inner: &mut QueueInner, capacity: usize, sample: OrientationSample) {
        inner.next_sequence = sample.sequence.saturating_add(1);
        inner.samples.push_back(sample);
        while inner.samples.len() > capacity {
            inner.samples.pop_front();
        }
    }

    /// Sequence ids currently readable, oldest first.
    pub fn readable_sequences(&self) -> Vec<u64> {
        let inner = self.inner.lock();
        let floor = inner.read_floor;
        inner
            .samples
            .iter()
            .map(OrientationSample::sequence)
            .filter(|&seq| seq >= floor)
            .collect()
    }

    /// Reads the sample with the given id, or `None` if it was evicted or
    /// lies below an already-returned sample.
    pub fn read(&self, sequence: u64) -> Option<OrientationSample> {
        let mut inner = self.inner.lock();
        if sequence < inner.read_floor {
            return None;
        }
        let pos = inner
            .samples
            .binary_search_by_key(&sequence, OrientationSample::sequence)
            .ok()?;
        inner.read_floor = sequence;
        Some(inner.samples[pos])
    }

    /// Drops every buffered sample. Ids handed out later keep increasing and
    /// nothing recorded before the clear becomes readable again.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.samples.clear();
        inner.read_floor = inner.next_sequence;
    }
}

// ---------------------------------------------------------------------------
// OrientationQueueHandle
// ---------------------------------------------------------------------------

/// Which orientation a check ended up judging the event with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LookSource {
    /// The orientation reported alongside the event.
    Current,
    /// A buffered sample at the given index of this event's view.
    Queued {
        /// Index within the handle's view.
        index: usize,
        /// The sample used.
        sample: OrientationSample,
    },
}

/// One interaction event's view of an [`OrientationHistoryQueue`].
///
/// The view is fetched lazily on first use and then fixed for the event, so
/// every check in the event indexes the same entries.
pub struct OrientationQueueHandle<'a> {
    queue: &'a OrientationHistoryQueue,
    view: Option<Vec<u64>>,
    first_usable: usize,
    used: Option<(usize, OrientationSample)>,
}

impl<'a> OrientationQueueHandle<'a> {
    /// Creates an unfetched handle.
    pub fn new(queue: &'a OrientationHistoryQueue) -> Self {
        Self {
            queue,
            view: None,
            first_usable: 0,
            used: None,
        }
    }

    /// Whether any check has looked at the queue during this event.
    pub fn is_fetched(&self) -> bool {
        self.view.is_some()
    }

    /// Takes the view if not done yet and returns its length.
    pub fn fetch(&mut self) -> usize {
        self.view
            .get_or_insert_with(|| self.queue.readable_sequences())
            .len()
    }

    /// Index of the oldest entry not yet consumed during this event, or
    /// `None` while the queue has not been fetched.
    pub fn first_usable_index(&self) -> Option<usize> {
        self.view.as_ref().map(|_| self.first_usable)
    }

    /// Number of entries in the fetched view.
    pub fn view_len(&self) -> usize {
        self.view.as_ref().map_or(0, Vec::len)
    }

    /// Sample at `index` of the view, or `None` if out of range, unfetched,
    /// or evicted since the view was taken.
    pub fn sample_at(&self, index: usize) -> Option<OrientationSample> {
        let sequence = *self.view.as_ref()?.get(index)?;
        self.queue.read(sequence)
    }

    /// Marks every entry up to and including `index` as consumed.
    pub fn consume_through(&mut self, index: usize) {
        self.first_usable = self.first_usable.max(index + 1);
    }

    /// Records that the sample at `index` was the one a check accepted.
    pub fn mark_used(&mut self, index: usize, sample: OrientationSample) {
        self.used = Some((index, sample));
    }

    /// The accepted sample, if one was found.
    pub fn used(&self) -> Option<(usize, OrientationSample)> {
        self.used
    }

    /// Best orientation available for later checks: the accepted sample or
    /// the event's own orientation.
    pub fn best_orientation(&self, current: Orientation) -> Orientation {
        self.used.map_or(current, |(_, sample)| sample.orientation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_evicts_oldest() {
        let queue = OrientationHistoryQueue::new(3);
        for i in 0..5 {
            queue.push(i as f32, 0.0);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.readable_sequences(), vec![2, 3, 4]);
    }

    #[test]
    fn test_record_rejects_stale_sequence() {
        let queue = OrientationHistoryQueue::new(4);
        assert!(queue.record(OrientationSample::new(10, 0.0, 0.0)));
        assert!(!queue.record(OrientationSample::new(10, 1.0, 0.0)));
        assert!(!queue.record(OrientationSample::new(3, 1.0, 0.0)));
        // Gaps are fine.
        assert!(queue.record(OrientationSample::new(42, 1.0, 0.0)));
        assert_eq!(queue.push(0.0, 0.0), Some(43));
    }

    #[test]
    fn test_non_finite_angles_are_dropped() {
        let queue = OrientationHistoryQueue::new(4);
        assert_eq!(queue.push(f32::NAN, 0.0), None);
        assert_eq!(queue.push(0.0, f32::INFINITY), None);
        assert!(!queue.record(OrientationSample::new(7, f32::NAN, f32::NAN)));
        assert!(queue.is_empty());

        // Rejected reports do not use up sequence ids.
        assert_eq!(queue.push(5.0, 5.0), Some(0));
    }

    #[test]
    fn test_handle_is_lazy_and_stable() {
        let queue = OrientationHistoryQueue::new(4);
        queue.push(10.0, 20.0);
        queue.push(11.0, 21.0);

        let mut handle = OrientationQueueHandle::new(&queue);
        assert!(!handle.is_fetched());
        assert_eq!(handle.first_usable_index(), None);

        assert_eq!(handle.fetch(), 2);
        assert_eq!(handle.first_usable_index(), Some(0));

        // New samples after the fetch are not part of this event's view.
        queue.push(12.0, 22.0);
        assert_eq!(handle.view_len(), 2);
        assert_eq!(handle.sample_at(1).map(|s| s.pitch()), Some(11.0));
        assert_eq!(handle.sample_at(2), None);
    }

    #[test]
    fn test_evicted_entry_reads_as_absent() {
        let queue = OrientationHistoryQueue::new(2);
        queue.push(1.0, 0.0);
        queue.push(2.0, 0.0);

        let mut handle = OrientationQueueHandle::new(&queue);
        handle.fetch();

        // Network path overflows the queue between fetch and read.
        queue.push(3.0, 0.0);
        queue.push(4.0, 0.0);

        assert_eq!(handle.sample_at(0), None);
        assert_eq!(handle.sample_at(1), None);
    }

    #[test]
    fn test_consume_advances_first_usable() {
        let queue = OrientationHistoryQueue::new(4);
        queue.push(0.0, 0.0);
        queue.push(0.0, 0.0);
        let mut handle = OrientationQueueHandle::new(&queue);
        handle.fetch();
        handle.consume_through(0);
        assert_eq!(handle.first_usable_index(), Some(1));
        handle.consume_through(0);
        assert_eq!(handle.first_usable_index(), Some(1));
    }

    #[test]
    fn test_clear_hides_old_samples() {
        let queue = OrientationHistoryQueue::new(4);
        let old = queue.push(0.0, 0.0).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.read(old), None);
        assert!(queue.push(0.0, 0.0).unwrap() > old);
    }

    #[test]
    fn test_best_orientation_prefers_used_sample() {
        let queue = OrientationHistoryQueue::new(2);
        queue.push(15.0, 90.0);
        let mut handle = OrientationQueueHandle::new(&queue);
        let current = Orientation::new(0.0, 0.0);
        assert_eq!(handle.best_orientation(current), current);

        handle.fetch();
        let sample = handle.sample_at(0).unwrap();
        handle.mark_used(0, sample);
        assert_eq!(handle.best_orientation(current), Orientation::new(90.0, 15.0));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push,
        NewEvent,
        Read(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Push),
            Just(Op::NewEvent),
            (0usize..6).prop_map(Op::Read),
        ]
    }

    proptest! {
        #[test]
        fn prop_reads_never_go_backwards(ops in proptest::collection::vec(op(), 1..80)) {
            let queue = OrientationHistoryQueue::new(4);
            let mut view: Option<Vec<u64>> = None;
            let mut last_seen: Option<u64> = None;

            for op in ops {
                match op {
                    Op::Push => { queue.push(0.0, 0.0); }
                    Op::NewEvent => view = Some(queue.readable_sequences()),
                    Op::Read(index) => {
                        let sequence = view.as_ref().and_then(|v| v.get(index)).copied();
                        let Some(sequence) = sequence else {
                            continue;
                        };
                        if let Some(sample) = queue.read(sequence) {
                            if let Some(prev) = last_seen {
                                prop_assert!(sample.sequence() >= prev);
                            }
                            last_seen = Some(sample.sequence());
                        }
                    }
                }
            }
        }
    }
}

//! Single-slot handoff implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use crate::SlotError;

struct Inner<T> {
    pending: Option<T>,
    closed: bool,
}

/// Frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    /// Frames published by the producer
    pub published: u64,
    /// Frames overwritten before the consumer took them
    pub dropped: u64,
    /// Frames handed to the consumer
    pub taken: u64,
}

/// Capacity-one handoff between one producer and one consumer
pub struct FrameSlot<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
    drained: Condvar,
    published: AtomicU64,
    dropped: AtomicU64,
    taken: AtomicU64,
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
            drained: Condvar::new(),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            taken: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // A panicking peer cannot leave `Inner` half-updated
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish a frame, replacing any frame not yet taken.
    ///
    /// Returns `false` if the slot is closed and the frame was discarded.
    pub fn publish(&self, frame: T) -> bool {
        let mut inner = self.lock();
        if !self.put(&mut inner, frame) {
            return false;
        }
        drop(inner);
        self.ready.notify_one();
        true
    }

    /// Publish an item that must not be overwritten and block until the
    /// consumer has taken it.
    ///
    /// A pending frame is still replaced. Returns `false` if the slot was
    /// closed before the item was taken.
    pub fn publish_and_wait(&self, item: T) -> bool {
        let mut inner = self.lock();
        if !self.put(&mut inner, item) {
            return false;
        }
        self.ready.notify_one();

        let inner = self
            .drained
            .wait_while(inner, |i| i.pending.is_some() && !i.closed)
            .unwrap_or_else(|e| e.into_inner());
        inner.pending.is_none()
    }

    fn put(&self, inner: &mut Inner<T>, frame: T) -> bool {
        if inner.closed {
            return false;
        }
        if inner.pending.replace(frame).is_some() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Stale frame overwritten ({} dropped so far)", dropped);
        }
        self.published.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Take the pending frame without waiting
    pub fn try_take(&self) -> Option<T> {
        let frame = self.lock().pending.take();
        if frame.is_some() {
            self.taken.fetch_add(1, Ordering::Relaxed);
            self.drained.notify_one();
        }
        frame
    }

    /// Wait up to `timeout` for a frame.
    ///
    /// Returns `Ok(None)` on timeout and `Err(SlotError::Closed)` once the
    /// slot is closed and drained.
    pub fn take_timeout(&self, timeout: Duration) -> Result<Option<T>, SlotError> {
        let inner = self.lock();
        let (mut inner, _) = self
            .ready
            .wait_timeout_while(inner, timeout, |i| i.pending.is_none() && !i.closed)
            .unwrap_or_else(|e| e.into_inner());

        let frame = inner.pending.take();
        let closed = inner.closed;
        drop(inner);

        match frame {
            Some(frame) => {
                self.taken.fetch_add(1, Ordering::Relaxed);
                self.drained.notify_one();
                Ok(Some(frame))
            }
            None if closed => Err(SlotError::Closed),
            None => Ok(None),
        }
    }

    /// Stop accepting frames; a pending frame can still be taken
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        drop(inner);
        self.ready.notify_all();
        self.drained.notify_all();

        let stats = self.stats();
        if stats.dropped > 0 {
            warn!(
                "Frame slot closed: {} of {} frames dropped as stale",
                stats.dropped, stats.published
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn stats(&self) -> SlotStats {
        SlotStats {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            taken: self.taken.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_publish_and_take() {
        let slot = FrameSlot::new();
        assert!(slot.try_take().is_none());

        slot.publish(1);
        assert_eq!(slot.try_take(), Some(1));
        assert!(slot.try_take().is_none());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let slot = FrameSlot::new();
        for i in 0..5 {
            slot.publish(i);
        }

        assert_eq!(slot.try_take(), Some(4));
        assert_eq!(
            slot.stats(),
            SlotStats {
                published: 5,
                dropped: 4,
                taken: 1
            }
        );
    }

    #[test]
    fn test_close_drains_then_errors() {
        let slot = FrameSlot::new();
        slot.publish("last");
        slot.close();

        assert!(slot.is_closed());
        assert!(!slot.publish("late"));
        assert_eq!(slot.take_timeout(Duration::from_millis(1)), Ok(Some("last")));
        assert_eq!(slot.take_timeout(Duration::from_millis(1)), Err(SlotError::Closed));
    }

    #[test]
    fn test_take_timeout_expires() {
        let slot: FrameSlot<u32> = FrameSlot::new();
        assert_eq!(slot.take_timeout(Duration::from_millis(5)), Ok(None));
    }

    #[test]
    fn test_cross_thread_handoff() {
        let slot = Arc::new(FrameSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    slot.publish(i);
                }
                slot.close();
            })
        };

        let mut last = None;
        loop {
            match slot.take_timeout(Duration::from_millis(100)) {
                Ok(Some(frame)) => {
                    // Frames arrive in publish order, possibly with gaps
                    assert!(last.map_or(true, |l| frame > l));
                    last = Some(frame);
                }
                Ok(None) => continue,
                Err(SlotError::Closed) => break,
            }
        }
        producer.join().unwrap();

        assert_eq!(last, Some(999));
        let stats = slot.stats();
        assert_eq!(stats.published, 1000);
        assert_eq!(stats.taken + stats.dropped, stats.published);
    }

    #[test]
    fn test_waited_item_survives_following_frames() {
        let slot = Arc::new(FrameSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                slot.publish(0u32);
                assert!(slot.publish_and_wait(u32::MAX));
                for i in 1..200u32 {
                    slot.publish(i);
                }
                slot.close();
            })
        };

        let mut seen = Vec::new();
        loop {
            match slot.take_timeout(Duration::from_millis(100)) {
                Ok(Some(frame)) => seen.push(frame),
                Ok(None) => continue,
                Err(SlotError::Closed) => break,
            }
        }
        producer.join().unwrap();

        assert!(seen.contains(&u32::MAX));
        assert_eq!(seen.last(), Some(&199));
    }

    #[test]
    fn test_publish_and_wait_on_closed_slot() {
        let slot = FrameSlot::new();
        slot.close();
        assert!(!slot.publish_and_wait(1));
        assert_eq!(slot.stats().published, 0);
    }

    proptest! {
        #[test]
        fn prop_counters_balance(ops in prop::collection::vec(any::<bool>(), 0..200)) {
            let slot = FrameSlot::new();
            for (i, publish) in ops.iter().enumerate() {
                if *publish {
                    slot.publish(i);
                } else {
                    slot.try_take();
                }
            }
            let pending = u64::from(slot.try_take().is_some());
            let stats = slot.stats();
            prop_assert_eq!(stats.taken + stats.dropped, stats.published);
            prop_assert!(pending <= 1);
        }
    }
}

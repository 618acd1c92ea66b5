//! Latest-Frame Handoff
//!
//! Serializes frames from a capture thread into a single consumer. The slot
//! holds at most one frame: publishing over an unconsumed frame replaces it,
//! so the consumer always sees the freshest frame and never a backlog.
//! Items that must not be lost (session controls) go through
//! [`FrameSlot::publish_and_wait`], which holds the producer until they are
//! taken.

mod slot;

pub use slot::{FrameSlot, SlotStats};

use thiserror::Error;

/// Slot errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The producer closed the slot and no frame is pending
    #[error("Frame slot closed")]
    Closed,
}

//! Fatigue Replay
//!
//! Host glue around the monitoring core: reads a recorded landmark stream
//! (one JSON record per line), drives a [`fatigue_monitor::SessionEngine`]
//! through it and stores periodic and final checkpoints.

pub mod record;
pub mod replay;
pub mod settings;

pub use record::{Control, RecordReader, ReplayRecord};
pub use replay::{replay, replay_threaded, ReplayOutcome, ReplayStats, Replayer};
pub use settings::{init_logging, load_config};

use fatigue_monitor::MonitorError;
use storage::StorageError;
use thiserror::Error;

/// Replay errors
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("Checkpoint storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Record reader thread panicked")]
    ReaderPanicked,

    #[error("Input contained no records")]
    EmptyInput,
}

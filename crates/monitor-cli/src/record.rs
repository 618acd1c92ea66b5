//! Recorded stream format
//!
//! Each non-blank line is one record:
//!
//! ```text
//! {"t": 12.033, "face": {"points": [[0.41, 0.38], ...], "width": 640, "height": 480}}
//! {"t": 12.066, "face": null}
//! {"t": 30.000, "control": "pause"}
//! ```
//!
//! A record is either a frame tick (`face` present or null) or a control
//! event. Lines starting with `#` are comments.

use std::io::{BufRead, Lines};

use face_landmarks::LandmarkFrame;
use serde::{Deserialize, Serialize};

use crate::ReplayError;

/// Host-side session controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// External monitoring start (finalizes calibration)
    BeginMonitoring,
    Pause,
    Resume,
    /// Pull a summary now (external checkpoint policy)
    Checkpoint,
}

/// One line of a recorded stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Host timestamp in seconds
    pub t: f64,
    /// Landmarks, or `None` when no face was detected
    #[serde(default)]
    pub face: Option<LandmarkFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Control>,
}

impl ReplayRecord {
    pub fn frame(t: f64, face: Option<LandmarkFrame>) -> Self {
        Self {
            t,
            face,
            control: None,
        }
    }

    pub fn control(t: f64, control: Control) -> Self {
        Self {
            t,
            face: None,
            control: Some(control),
        }
    }
}

/// Iterates the records of a JSON-lines stream
pub struct RecordReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<ReplayRecord, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return Some(
                serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
                    line: self.line_no,
                    source,
                }),
            );
        }
    }
}

//! Session replay driver

use std::io::BufRead;
use std::thread;
use std::time::{Duration, Instant};

use fatigue_monitor::{
    CheckpointPolicy, FatigueEvent, LiveMetrics, MonitorConfig, SessionEngine, SessionSummary,
};
use frame_slot::{FrameSlot, SlotError};
use storage::{CheckpointKind, SummaryRecord, SummarySink};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::record::{Control, RecordReader, ReplayRecord};
use crate::ReplayError;

/// Counters collected while replaying
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayStats {
    /// Frame ticks handed to the engine
    pub frames: u64,
    /// Ticks without a detected face
    pub no_face: u64,
    pub checkpoints: u64,
    /// Control records applied
    pub controls: u64,
    /// Frames overwritten before the engine saw them (threaded replay)
    pub dropped: u64,
    pub alerts: Vec<FatigueEvent>,
}

/// Result of a completed replay
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub session_id: Uuid,
    pub summary: SessionSummary,
    pub stats: ReplayStats,
}

/// Drives one monitoring session from recorded records
pub struct Replayer<'a> {
    engine: SessionEngine,
    sink: &'a dyn SummarySink,
    session_id: Uuid,
    last_t: Option<f64>,
    stats: ReplayStats,
}

impl<'a> Replayer<'a> {
    pub fn new(config: MonitorConfig, sink: &'a dyn SummarySink) -> Result<Self, ReplayError> {
        Ok(Self {
            engine: SessionEngine::new(config)?,
            sink,
            session_id: Uuid::new_v4(),
            last_t: None,
            stats: ReplayStats::default(),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Apply one record. The session starts at the first record's timestamp.
    ///
    /// Returns the live update for frame ticks the engine processed.
    pub fn feed(&mut self, record: &ReplayRecord) -> Result<Option<LiveMetrics>, ReplayError> {
        match self.last_t {
            None => {
                self.engine.start(record.t);
                info!("Session {} started at t={:.3}", self.session_id, record.t);
            }
            Some(last) if record.t < last => {
                warn!("Timestamp went backwards ({:.3} after {:.3})", record.t, last);
            }
            Some(_) => {}
        }
        self.last_t = Some(record.t);

        if let Some(control) = record.control {
            self.apply_control(control, record.t)?;
            return Ok(None);
        }

        self.stats.frames += 1;
        if record.face.is_none() {
            self.stats.no_face += 1;
        }

        let Some(update) = self.engine.process(record.t, record.face.as_ref())? else {
            return Ok(None);
        };

        if let Some(baseline) = update.baseline {
            info!(
                "Baseline EAR {:.4}, MAR {:.4} (close < {:.4}, open > {:.4}, yawn > {:.4})",
                baseline.baseline_ear,
                baseline.baseline_mar,
                baseline.thres_close,
                baseline.thres_open,
                baseline.thres_yawn
            );
        }
        if let Some(event) = update.live.alert {
            info!(
                "{} at {}s",
                event.severity.reason(),
                event.elapsed_seconds
            );
            self.stats.alerts.push(event);
        }
        if let Some(summary) = update.checkpoint {
            self.store(CheckpointKind::Periodic, &summary)?;
        }

        Ok(Some(update.live))
    }

    fn apply_control(&mut self, control: Control, t: f64) -> Result<(), ReplayError> {
        debug!("Control {:?} at t={:.3}", control, t);
        self.stats.controls += 1;
        match control {
            Control::BeginMonitoring => {
                self.engine.begin_monitoring(t)?;
            }
            Control::Pause => {
                self.engine.pause(t);
            }
            Control::Resume => {
                self.engine.resume(t);
            }
            Control::Checkpoint => {
                if self.engine.config().checkpoint != CheckpointPolicy::External {
                    debug!("Checkpoint control with automatic checkpoints enabled");
                }
                if let Some(summary) = self.engine.summary() {
                    self.store(CheckpointKind::Periodic, &summary)?;
                }
            }
        }
        Ok(())
    }

    fn store(&mut self, kind: CheckpointKind, summary: &SessionSummary) -> Result<(), ReplayError> {
        self.sink
            .save(SummaryRecord::new(self.session_id, kind, summary.to_report()))?;
        self.stats.checkpoints += 1;
        Ok(())
    }

    /// Stop the session at the last seen timestamp and store the final summary
    pub fn finish(mut self, sleepiness: Option<u8>) -> Result<ReplayOutcome, ReplayError> {
        let last_t = self.last_t.ok_or(ReplayError::EmptyInput)?;
        let summary = self
            .engine
            .stop(last_t, sleepiness)
            .ok_or(ReplayError::EmptyInput)?;
        self.store(CheckpointKind::Final, &summary)?;

        Ok(ReplayOutcome {
            session_id: self.session_id,
            summary,
            stats: self.stats,
        })
    }
}

/// Replay records one after another on the calling thread
pub fn replay<R: BufRead>(
    reader: R,
    mut replayer: Replayer<'_>,
    sleepiness: Option<u8>,
    mut on_live: impl FnMut(&LiveMetrics),
) -> Result<ReplayOutcome, ReplayError> {
    for record in RecordReader::new(reader) {
        if let Some(live) = replayer.feed(&record?)? {
            on_live(&live);
        }
    }
    replayer.finish(sleepiness)
}

/// Replay at recorded speed with a separate reader thread.
///
/// The reader publishes each record when its timestamp comes due; the engine
/// takes the freshest one. Frames the engine falls behind on are dropped, as
/// they would be from a live camera. Control records are never dropped: the
/// reader waits until the engine has taken each one.
pub fn replay_threaded<R: BufRead + Send>(
    reader: R,
    mut replayer: Replayer<'_>,
    sleepiness: Option<u8>,
    mut on_live: impl FnMut(&LiveMetrics),
) -> Result<ReplayOutcome, ReplayError> {
    let slot = FrameSlot::new();

    let read_result = thread::scope(|scope| -> Result<(), ReplayError> {
        let producer = scope.spawn(|| {
            let result = publish_paced(reader, &slot);
            slot.close();
            result
        });

        let consumed = loop {
            match slot.take_timeout(Duration::from_millis(100)) {
                Ok(Some(record)) => match replayer.feed(&record) {
                    Ok(Some(live)) => on_live(&live),
                    Ok(None) => {}
                    Err(e) => {
                        slot.close();
                        break Err(e);
                    }
                },
                Ok(None) => continue,
                Err(SlotError::Closed) => break Ok(()),
            }
        };

        let produced = producer
            .join()
            .unwrap_or_else(|_| Err(ReplayError::ReaderPanicked));
        consumed.and(produced)
    });
    read_result?;

    let stats = slot.stats();
    replayer.stats.dropped = stats.dropped;
    if stats.dropped > 0 {
        warn!(
            "{} of {} frames dropped while the engine was busy",
            stats.dropped, stats.published
        );
    }

    replayer.finish(sleepiness)
}

fn publish_paced<R: BufRead>(reader: R, slot: &FrameSlot<ReplayRecord>) -> Result<(), ReplayError> {
    let wall_start = Instant::now();
    let mut first_t = None;

    for record in RecordReader::new(reader) {
        let record = record?;
        let offset = record.t - *first_t.get_or_insert(record.t);
        if offset > 0.0 {
            let due = Duration::from_secs_f64(offset);
            if let Some(wait) = due.checked_sub(wall_start.elapsed()) {
                thread::sleep(wait);
            }
        }
        let delivered = if record.control.is_some() {
            slot.publish_and_wait(record)
        } else {
            slot.publish(record)
        };
        if !delivered {
            // Consumer gave up
            break;
        }
    }
    Ok(())
}

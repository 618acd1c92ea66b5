//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use fatigue_monitor::FatigueReport;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// When a checkpoint was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    /// Mid-session snapshot
    Periodic,
    /// Taken at `stop()`
    Final,
}

/// One stored checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub session_id: Uuid,
    pub kind: CheckpointKind,
    pub recorded_at: DateTime<Utc>,
    pub report: FatigueReport,
}

impl SummaryRecord {
    pub fn new(session_id: Uuid, kind: CheckpointKind, report: FatigueReport) -> Self {
        Self {
            session_id,
            kind,
            recorded_at: Utc::now(),
            report,
        }
    }
}

/// Destination for session checkpoints.
///
/// Failures are reported to the caller; the monitoring core never sees them.
pub trait SummarySink: Send + Sync {
    fn save(&self, record: SummaryRecord) -> Result<(), StorageError>;
}

/// In-memory checkpoint store with bounded retention
pub struct SummaryRepository {
    records: Mutex<VecDeque<SummaryRecord>>,
    max_records: usize,
}

impl SummaryRepository {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(max_records: usize) -> Self {
        info!("Creating in-memory summary repository (max {} records)", max_records);
        Self {
            records: Mutex::new(VecDeque::new()),
            max_records: max_records.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<SummaryRecord>>, StorageError> {
        self.records.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// All checkpoints of one session, oldest first
    pub fn session(&self, session_id: Uuid) -> Result<Vec<SummaryRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    /// Final checkpoint of a session
    pub fn final_record(&self, session_id: Uuid) -> Result<SummaryRecord, StorageError> {
        let records = self.lock()?;
        records
            .iter()
            .rev()
            .find(|r| r.session_id == session_id && r.kind == CheckpointKind::Final)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Most recent checkpoints across sessions, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<SummaryRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    /// Export as pretty-printed JSON
    pub fn export_json(&self) -> Result<String, StorageError> {
        let records = self.lock()?;
        Ok(serde_json::to_string_pretty(&*records)?)
    }

    /// Export as a postcard blob
    pub fn export_postcard(&self) -> Result<Vec<u8>, StorageError> {
        let records = self.lock()?;
        let records: Vec<&SummaryRecord> = records.iter().collect();
        Ok(postcard::to_allocvec(&records)?)
    }

    /// Append records from a postcard blob
    pub fn import_postcard(&self, bytes: &[u8]) -> Result<usize, StorageError> {
        let imported: Vec<SummaryRecord> = postcard::from_bytes(bytes)?;
        let count = imported.len();
        for record in imported {
            self.save(record)?;
        }
        Ok(count)
    }
}

impl SummarySink for SummaryRepository {
    fn save(&self, record: SummaryRecord) -> Result<(), StorageError> {
        let mut records = self.lock()?;

        // Enforce retention
        while records.len() >= self.max_records {
            records.pop_front();
        }

        debug!(
            "Stored {:?} checkpoint for session {} ({} s)",
            record.kind, record.session_id, record.report.elapsed_seconds
        );
        records.push_back(record);
        Ok(())
    }
}

impl Default for SummaryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fatigue_monitor::SessionSummary;

    fn report(elapsed: f64) -> FatigueReport {
        let mut summary = SessionSummary::empty(None, false);
        summary.elapsed_secs = elapsed;
        summary.blink_count = 12;
        summary.perclos = 4.256;
        summary.to_report()
    }

    #[test]
    fn test_save_and_query_session() {
        let repo = SummaryRepository::new();
        let session = Uuid::new_v4();
        let other = Uuid::new_v4();

        repo.save(SummaryRecord::new(session, CheckpointKind::Periodic, report(60.0)))
            .unwrap();
        repo.save(SummaryRecord::new(other, CheckpointKind::Final, report(30.0)))
            .unwrap();
        repo.save(SummaryRecord::new(session, CheckpointKind::Final, report(95.4)))
            .unwrap();

        let records = repo.session(session).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, CheckpointKind::Periodic);

        let last = repo.final_record(session).unwrap();
        assert_eq!(last.report.elapsed_seconds, 95);
        assert_eq!(last.report.perclos, 4.26);
    }

    #[test]
    fn test_missing_final_record() {
        let repo = SummaryRepository::new();
        let session = Uuid::new_v4();
        repo.save(SummaryRecord::new(session, CheckpointKind::Periodic, report(60.0)))
            .unwrap();

        assert!(matches!(
            repo.final_record(session),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn test_retention_limit() {
        let repo = SummaryRepository::with_capacity(5);
        let session = Uuid::new_v4();

        for i in 0..10 {
            repo.save(SummaryRecord::new(
                session,
                CheckpointKind::Periodic,
                report(f64::from(i) * 60.0),
            ))
            .unwrap();
        }

        assert_eq!(repo.len(), 5);
        let newest = repo.recent(1).unwrap();
        assert_eq!(newest[0].report.elapsed_seconds, 540);
    }

    #[test]
    fn test_postcard_export_import() {
        let source = SummaryRepository::new();
        let session = Uuid::new_v4();
        source
            .save(SummaryRecord::new(session, CheckpointKind::Final, report(61.0)))
            .unwrap();

        let blob = source.export_postcard().unwrap();
        let target = SummaryRepository::new();
        assert_eq!(target.import_postcard(&blob).unwrap(), 1);
        assert_eq!(target.final_record(session).unwrap(), source.final_record(session).unwrap());
    }

    #[test]
    fn test_json_export_shape() {
        let repo = SummaryRepository::new();
        repo.save(SummaryRecord::new(Uuid::new_v4(), CheckpointKind::Final, report(10.0)))
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&repo.export_json().unwrap()).unwrap();
        assert_eq!(json[0]["kind"], "final");
        assert_eq!(json[0]["report"]["blink_count"], 12);
    }

    #[test]
    fn test_clear() {
        let repo = SummaryRepository::new();
        repo.save(SummaryRecord::new(Uuid::new_v4(), CheckpointKind::Final, report(1.0)))
            .unwrap();
        repo.clear();
        assert!(repo.is_empty());
    }
}

//! Alerting System
//!
//! Turns per-frame fatigue scores into discrete alerts: score threshold,
//! cooldown debounce, severity mapping, and an append-only log of fatigue
//! moments.

mod manager;

pub use manager::{AlertConfig, AlertManager, FatigueEvent, Severity};

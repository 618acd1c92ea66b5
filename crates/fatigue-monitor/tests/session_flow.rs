//! End-to-end session scenarios on synthetic landmark frames

use face_landmarks::synthetic::FrameBuilder;
use face_landmarks::LandmarkFrame;
use fatigue_monitor::{
    CheckpointPolicy, MonitorConfig, MonitorError, SessionEngine, SessionState, Severity,
};
use proptest::prelude::*;

const FPS: f64 = 30.0;

fn frame(ear: f64, mar: f64) -> LandmarkFrame {
    FrameBuilder::new().ear(ear).mar(mar).build()
}

/// Run calibration at 30 fps from t=0 until monitoring begins; returns the
/// index of the first monitoring frame
fn calibrate(engine: &mut SessionEngine, ear: f64, mar: f64) -> u32 {
    assert!(engine.start(0.0));
    let calibration_frame = frame(ear, mar);
    let mut k = 0;
    while engine.state() == SessionState::Calibrating {
        engine
            .process(k as f64 / FPS, Some(&calibration_frame))
            .expect("calibration should succeed");
        k += 1;
    }
    k
}

#[test]
fn ten_blinks_in_one_minute() {
    let mut engine = SessionEngine::new(MonitorConfig::default()).unwrap();
    let first = calibrate(&mut engine, 0.32, 0.20);

    let baseline = *engine.baseline().unwrap();
    assert!((baseline.baseline_ear - 0.32).abs() < 1e-9);
    assert!((baseline.thres_close - 0.176).abs() < 1e-9);
    assert!((baseline.thres_open - 0.272).abs() < 1e-9);
    assert!((baseline.thres_yawn - 0.50).abs() < 1e-9);

    let open = frame(0.32, 0.20);
    let closed = frame(0.05, 0.20);
    let mut checkpoints = Vec::new();

    // Monitoring runs from t=10 to t=70; one blink every 6 s
    for k in first..=2100 {
        let t = k as f64 / FPS;
        let rel = t - 10.0;
        let blinking = (0..10).any(|i| {
            let start = 3.0 + 6.0 * i as f64;
            rel >= start && rel < start + 0.1
        });
        let update = engine
            .process(t, Some(if blinking { &closed } else { &open }))
            .unwrap()
            .unwrap();
        if let Some(checkpoint) = update.checkpoint {
            checkpoints.push(checkpoint);
        }
    }

    let summary = engine.stop(70.0, None).unwrap();
    assert_eq!(summary.blink_count, 10);
    assert_eq!(summary.incomplete_blink_count, 0);
    assert!((summary.elapsed_secs - 60.0).abs() < 1e-9);
    assert!((summary.blink_rate_per_min - 10.0).abs() < 1e-9);
    assert_eq!(summary.yawn_count, 0);
    assert!(summary.perclos < 15.0);
    assert!(summary.alert_count < 2);
    assert!(!summary.is_fatigued);
    assert!(summary.closed_time_secs <= summary.elapsed_secs);
    assert!((summary.average_ear - 0.30).abs() < 0.02);

    // One periodic checkpoint at the 60 s mark
    assert_eq!(checkpoints.len(), 1);
    assert_eq!(engine.state(), SessionState::Idle);
}

#[test]
fn sustained_yawn_counts_short_one_does_not() {
    let mut engine = SessionEngine::new(MonitorConfig::default()).unwrap();
    let first = calibrate(&mut engine, 0.30, 0.20);

    let quiet = frame(0.30, 0.20);
    let yawning = frame(0.30, 0.80);

    // 2.0 s yawn starting 1 s into monitoring, then a 1.0 s mouth opening at 6 s
    for k in first..first + 300 {
        let rel = (k - first) as f64 / FPS;
        let open = (1.0..3.0).contains(&rel) || (6.0..7.0).contains(&rel);
        engine
            .process(k as f64 / FPS, Some(if open { &yawning } else { &quiet }))
            .unwrap();
    }

    let summary = engine.summary().unwrap();
    assert_eq!(summary.yawn_count, 1);
}

#[test]
fn drowsy_subject_raises_cooldown_gated_alerts() {
    let config = MonitorConfig {
        checkpoint: CheckpointPolicy::FinalOnly,
        ..Default::default()
    };
    let mut engine = SessionEngine::new(config).unwrap();
    let first = calibrate(&mut engine, 0.30, 0.20);

    // Eyes closed for 1.5 s out of every 3 s: high PERCLOS, few blinks
    let open = frame(0.30, 0.20);
    let closed = frame(0.02, 0.20);
    let mut alerts = Vec::new();
    for k in first..first + (95.0 * FPS) as u32 {
        let rel = (k - first) as f64 / FPS;
        let shut = rel % 3.0 < 1.5;
        let update = engine
            .process(k as f64 / FPS, Some(if shut { &closed } else { &open }))
            .unwrap()
            .unwrap();
        if let Some(alert) = update.live.alert {
            alerts.push(alert);
        }
    }

    // Alerts at least 30 s apart: first frame, then roughly every 30 s
    assert!(alerts.len() >= 3 && alerts.len() <= 4, "{:?}", alerts);
    for pair in alerts.windows(2) {
        assert!(pair[1].elapsed_seconds >= pair[0].elapsed_seconds + 30);
    }
    assert!(alerts.iter().any(|a| a.severity == Severity::Severe));

    let summary = engine.stop(10.0 + 95.0, Some(3)).unwrap();
    assert_eq!(summary.alert_count, alerts.len());
    assert_eq!(summary.fatigue_events, alerts);
    assert!(summary.perclos >= 28.0);
    assert!(summary.is_fatigued);

    let report = summary.to_report();
    assert_eq!(report.fatigue_moments.len(), alerts.len());
    assert_eq!(report.sleepiness_score, Some(3));
}

#[test]
fn calibration_without_face_aborts_session() {
    let mut engine = SessionEngine::new(MonitorConfig::default()).unwrap();
    engine.start(0.0);
    let mut result = Ok(None);
    for k in 0..=300 {
        result = engine.process(k as f64 / FPS, None);
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(result, Err(MonitorError::CalibrationFailed { .. })));
    assert_eq!(engine.state(), SessionState::Idle);

    // A fresh session can be started afterwards
    assert!(engine.start(20.0));
}

#[test]
fn stop_is_a_no_op_when_idle() {
    let mut engine = SessionEngine::new(MonitorConfig::default()).unwrap();
    calibrate(&mut engine, 0.30, 0.20);
    assert!(engine.stop(11.0, None).is_some());
    assert!(engine.stop(12.0, None).is_none());
    assert!(engine
        .process(13.0, Some(&frame(0.30, 0.20)))
        .unwrap()
        .is_none());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn aggregates_hold_invariants(
        ears in prop::collection::vec(0.0f64..0.45, 1..600),
        mars in prop::collection::vec(0.0f64..1.0, 1..600),
    ) {
        let mut engine = SessionEngine::new(MonitorConfig::default()).unwrap();
        let first = calibrate(&mut engine, 0.30, 0.20);

        let mut previous = engine.summary().unwrap();
        for (i, ear) in ears.iter().enumerate() {
            let mar = mars[i % mars.len()];
            let t = (first as usize + i) as f64 / FPS;
            engine.process(t, Some(&frame(*ear, mar))).unwrap();

            let summary = engine.summary().unwrap();
            prop_assert!(summary.incomplete_blink_count <= summary.blink_count);
            prop_assert!(summary.blink_count >= previous.blink_count);
            prop_assert!(summary.yawn_count >= previous.yawn_count);
            prop_assert!(summary.closed_time_secs <= summary.elapsed_secs + 1e-9);
            prop_assert!(summary.perclos >= 0.0 && summary.perclos <= 100.0);
            previous = summary;
        }
    }
}

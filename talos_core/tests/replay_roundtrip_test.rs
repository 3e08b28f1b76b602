//! Full-scheduler round-trip tests for the record/replay system:
//! recording N ticks of signal values and playing them back must reproduce
//! exactly those values on successive ticks, with the player ending on
//! tick N.

use std::sync::Arc;

use parking_lot::Mutex;
use talos_core::{PlaybackCommand, RecordCommand, ReplayBuffer, RunCommand, Scheduler};

const SIGNAL: &str = "drive/forward";

/// Record `values` (one per tick) through a live scheduler and return the
/// frozen buffer.
fn record(values: &[f64]) -> ReplayBuffer {
    let mut scheduler = Scheduler::new();
    let recorder = RecordCommand::new([SIGNAL]).with_name("test_recorder");
    let output = recorder.output();
    let id = scheduler.schedule(Box::new(recorder)).unwrap();

    for value in values {
        scheduler.signals_mut().write(SIGNAL, *value);
        scheduler.tick();
    }
    scheduler.cancel(id);

    let buffer = output.lock().take().expect("recorder must freeze a buffer");
    buffer
}

#[test]
fn test_record_then_playback_reproduces_values() {
    let values = [0.1, 0.5, -0.25, 0.0, 1.0];
    let buffer = record(&values);
    assert_eq!(buffer.len(), values.len());

    // Play the buffer back into a fresh scheduler; a consumer command reads
    // the signal each tick, after the player has written it.
    let mut scheduler = Scheduler::new();
    let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));

    let player = scheduler
        .schedule(Box::new(
            PlaybackCommand::new(buffer).with_name("test_playback"),
        ))
        .unwrap();
    let sink = seen.clone();
    scheduler
        .schedule(Box::new(RunCommand::new(move |ctx| {
            sink.lock().push(ctx.signal(SIGNAL));
        })))
        .unwrap();

    for _ in 0..values.len() {
        scheduler.tick();
        assert!(scheduler.is_scheduled(player));
    }
    // Tick N: the cursor has passed the last sample; the player ends
    // without writing anything further
    scheduler.tick();
    assert!(!scheduler.is_scheduled(player));

    assert_eq!(*seen.lock(), values);
}

#[test]
fn test_recorded_ticks_are_relative_and_strictly_increasing() {
    let buffer = record(&[0.3, 0.6, 0.9]);
    let ticks: Vec<u64> = buffer.samples.iter().map(|s| s.tick).collect();
    assert_eq!(ticks, vec![0, 1, 2]);
}

#[test]
fn test_interrupted_recorder_still_freezes() {
    let mut scheduler = Scheduler::new();

    let recorder = RecordCommand::new([SIGNAL]);
    let output = recorder.output();
    scheduler.schedule(Box::new(recorder)).unwrap();
    scheduler.signals_mut().write(SIGNAL, 0.7);
    scheduler.tick();

    // Interrupt the recording the way a mode change would
    scheduler.cancel_all();

    let buffer = output.lock().take().expect("buffer must freeze on interrupt");
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.samples[0].values[SIGNAL], 0.7);
}

#[test]
fn test_empty_buffer_playback_finishes_first_tick() {
    let mut scheduler = Scheduler::new();
    let player = scheduler
        .schedule(Box::new(PlaybackCommand::new(ReplayBuffer::default())))
        .unwrap();

    scheduler.tick();
    assert!(!scheduler.is_scheduled(player));
    assert!(scheduler.signals().is_empty());
}

#[test]
fn test_playback_through_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routine.talos");

    let buffer = record(&[0.2, 0.4]);
    buffer.save(&path).unwrap();

    let mut scheduler = Scheduler::new();
    let player = scheduler
        .schedule(Box::new(PlaybackCommand::from_file(&path).unwrap()))
        .unwrap();

    scheduler.tick();
    assert_eq!(scheduler.signals().read(SIGNAL), 0.2);
    scheduler.tick();
    assert_eq!(scheduler.signals().read(SIGNAL), 0.4);
    scheduler.tick();
    assert!(!scheduler.is_scheduled(player));
}

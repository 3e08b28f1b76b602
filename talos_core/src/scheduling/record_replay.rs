//! Record/Replay system for TALOS
//!
//! Two commands for building autonomous routines without hand-written
//! sequencing logic:
//!
//! - [`RecordCommand`] samples a fixed list of named signals once per tick
//!   into a [`ReplayBuffer`], frozen when the command ends.
//! - [`PlaybackCommand`] replays a frozen buffer by writing the recorded
//!   values back to the same signal paths, one sample per tick, so consuming
//!   commands cannot distinguish replayed input from live input.
//!
//! Playback advances the cursor by exactly one per tick: replay speed is
//! tied 1:1 to the original recording's tick rate, never to wall-clock time,
//! so system load cannot desynchronize a routine.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::Local;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::config::RecordingSettings;
use crate::command::{Command, TickContext};
use crate::error::{TalosError, TalosResult};
use crate::scheduling::SubsystemId;

/// Directory for storing recordings, under the user's home
const RECORDINGS_DIR: &str = ".talos/recordings";

/// Recording file extension
const RECORDING_EXT: &str = "talos";

/// Where recorded buffers are persisted and how sessions are named
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Base directory for recordings
    pub base_dir: PathBuf,
    /// Prefix for timestamped session file names
    pub session_prefix: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(RECORDINGS_DIR);
        Self {
            base_dir,
            session_prefix: "session".to_string(),
        }
    }
}

impl RecordingConfig {
    /// Create a config with a custom session prefix
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            session_prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    /// Build a config from scheduler configuration settings
    pub fn from_settings(settings: &RecordingSettings) -> Self {
        let mut config = Self::default();
        if let Some(base_dir) = &settings.base_dir {
            config.base_dir = base_dir.clone();
        }
        config.session_prefix = settings.session_prefix.clone();
        config
    }

    /// Timestamped path for a new session file, like the hand-driven
    /// recordings this replaces: `<base>/<prefix>_2026-03-14-16-02-11.talos`
    pub fn session_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
        self.base_dir
            .join(format!("{}_{}.{}", self.session_prefix, stamp, RECORDING_EXT))
    }
}

/// One tick's worth of sampled signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySample {
    /// Tick index relative to recording start
    pub tick: u64,
    /// Signal path -> sampled value
    pub values: BTreeMap<String, f64>,
}

/// An ordered, tick-indexed recording of signal samples.
///
/// Tick indices are strictly increasing and start at 0 relative to the
/// recording's first sample. The buffer is frozen once its recorder ends and
/// consumed read-only by playback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayBuffer {
    /// The signal paths this buffer was configured to sample
    pub signals: Vec<String>,
    /// Samples in tick order
    pub samples: Vec<ReplaySample>,
    /// When recording started (microseconds since epoch)
    pub recorded_at_us: u64,
}

impl ReplayBuffer {
    pub fn new(signals: Vec<String>) -> Self {
        Self {
            signals,
            samples: Vec::new(),
            recorded_at_us: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_micros() as u64,
        }
    }

    /// Append one sample. The first sample must land on tick 0 and every
    /// subsequent tick index must be strictly greater than the last.
    pub fn push(&mut self, tick: u64, values: BTreeMap<String, f64>) -> TalosResult<()> {
        match self.samples.last() {
            None if tick != 0 => {
                return Err(TalosError::replay(format!(
                    "first sample must be tick 0, got {}",
                    tick
                )));
            }
            Some(last) if tick <= last.tick => {
                return Err(TalosError::replay(format!(
                    "tick indices must be strictly increasing: {} after {}",
                    tick, last.tick
                )));
            }
            _ => {}
        }
        self.samples.push(ReplaySample { tick, values });
        Ok(())
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sample at a position, if recorded
    pub fn sample(&self, index: usize) -> Option<&ReplaySample> {
        self.samples.get(index)
    }

    /// Tick index of the final sample
    pub fn last_tick(&self) -> Option<u64> {
        self.samples.last().map(|s| s.tick)
    }

    /// Save to file with bincode
    pub fn save(&self, path: &Path) -> TalosResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Load from file
    pub fn load(path: &Path) -> TalosResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let buffer = bincode::deserialize_from(reader)?;
        Ok(buffer)
    }

    /// Save to a timestamped session file with a human-readable JSON
    /// metadata sidecar, returning the recording path
    pub fn save_session(&self, config: &RecordingConfig) -> TalosResult<PathBuf> {
        let path = config.session_path();
        self.save(&path)?;

        let metadata = serde_json::json!({
            "signals": self.signals,
            "samples": self.samples.len(),
            "recorded_at_us": self.recorded_at_us,
        });
        fs::write(path.with_extension("json"), metadata.to_string())?;
        Ok(path)
    }
}

/// Shared slot a recorder freezes its finished buffer into
pub type BufferSlot = Arc<Mutex<Option<ReplayBuffer>>>;

/// Samples a fixed list of signals once per tick into a replay buffer.
///
/// Runs until externally interrupted unless a stop condition is supplied.
/// Ending - naturally or interrupted - freezes the buffer into the output
/// slot and optionally persists it to a session file.
pub struct RecordCommand {
    name: String,
    signals: Vec<String>,
    buffer: ReplayBuffer,
    output: BufferSlot,
    started_at: u64,
    stop: Option<Box<dyn Fn(&TickContext) -> bool + Send>>,
    save_config: Option<RecordingConfig>,
}

impl RecordCommand {
    pub fn new<I, S>(signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let signals: Vec<String> = signals.into_iter().map(Into::into).collect();
        Self {
            name: "record".to_string(),
            buffer: ReplayBuffer::default(),
            output: Arc::new(Mutex::new(None)),
            started_at: 0,
            stop: None,
            save_config: None,
            signals,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Finish recording once the condition becomes true
    pub fn with_stop_when<F: Fn(&TickContext) -> bool + Send + 'static>(mut self, stop: F) -> Self {
        self.stop = Some(Box::new(stop));
        self
    }

    /// Also persist the frozen buffer to a timestamped session file on end
    pub fn with_save(mut self, config: RecordingConfig) -> Self {
        self.save_config = Some(config);
        self
    }

    /// Handle to the slot the frozen buffer will appear in once the
    /// recording ends. Clone before scheduling the command.
    pub fn output(&self) -> BufferSlot {
        self.output.clone()
    }
}

impl Command for RecordCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.buffer = ReplayBuffer::new(self.signals.clone());
        self.started_at = ctx.tick_index();
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        let tick = ctx.tick_index() - self.started_at;
        let values: BTreeMap<String, f64> = self
            .signals
            .iter()
            .map(|path| (path.clone(), ctx.signal(path)))
            .collect();
        if let Err(e) = self.buffer.push(tick, values) {
            log::error!("recorder '{}' dropped a sample: {}", self.name, e);
        }
    }

    fn is_finished(&self, ctx: &TickContext) -> bool {
        self.stop.as_ref().is_some_and(|stop| stop(ctx))
    }

    fn end(&mut self, _ctx: &mut TickContext, _interrupted: bool) {
        // Freeze the buffer regardless of how the recording ended
        let buffer = mem::take(&mut self.buffer);
        if let Some(config) = &self.save_config {
            match buffer.save_session(config) {
                Ok(path) => log::info!("recording saved to {}", path.display()),
                Err(e) => log::error!("failed to save recording: {}", e),
            }
        }
        *self.output.lock() = Some(buffer);
    }
}

/// Replays a frozen buffer by writing each sample's values back to the
/// recorded signal paths, one sample per tick.
///
/// Finishes once the cursor passes the last sample; an empty buffer finishes
/// on its first tick without writing anything (a short buffer is an early
/// finish, not an error).
pub struct PlaybackCommand {
    name: String,
    buffer: ReplayBuffer,
    cursor: usize,
    requirements: Vec<SubsystemId>,
}

impl PlaybackCommand {
    pub fn new(buffer: ReplayBuffer) -> Self {
        Self {
            name: "playback".to_string(),
            buffer,
            cursor: 0,
            requirements: Vec::new(),
        }
    }

    /// Load a previously saved recording
    pub fn from_file(path: &Path) -> TalosResult<Self> {
        Ok(Self::new(ReplayBuffer::load(path)?))
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Declare the subsystems driven by the signals this playback injects
    pub fn with_requirements(mut self, requirements: Vec<SubsystemId>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Number of samples left to play
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }
}

impl Command for PlaybackCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self, _ctx: &mut TickContext) {
        self.cursor = 0;
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        if let Some(sample) = self.buffer.sample(self.cursor) {
            for (path, value) in &sample.values {
                ctx.signals_mut().write(path.clone(), *value);
            }
        }
        self.cursor += 1;
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.cursor >= self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalBus;

    fn values_of(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    // ========================================================================
    // Buffer invariants
    // ========================================================================

    #[test]
    fn test_buffer_requires_first_tick_zero() {
        let mut buffer = ReplayBuffer::new(vec!["drive/forward".to_string()]);
        let err = buffer.push(3, values_of(&[("drive/forward", 0.5)]));
        assert!(err.is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_rejects_non_increasing_ticks() {
        let mut buffer = ReplayBuffer::new(vec!["drive/forward".to_string()]);
        buffer.push(0, values_of(&[("drive/forward", 0.1)])).unwrap();
        buffer.push(1, values_of(&[("drive/forward", 0.2)])).unwrap();

        assert!(buffer.push(1, values_of(&[("drive/forward", 0.3)])).is_err());
        assert!(buffer.push(0, values_of(&[("drive/forward", 0.3)])).is_err());
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.last_tick(), Some(1));
    }

    #[test]
    fn test_buffer_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.talos");

        let mut buffer = ReplayBuffer::new(vec!["arm/power".to_string()]);
        buffer.push(0, values_of(&[("arm/power", 0.9)])).unwrap();
        buffer.push(1, values_of(&[("arm/power", 0.4)])).unwrap();
        buffer.save(&path).unwrap();

        let loaded = ReplayBuffer::load(&path).unwrap();
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReplayBuffer::load(&dir.path().join("missing.talos")).unwrap_err();
        assert!(matches!(err, TalosError::Io(_)));
    }

    #[test]
    fn test_save_session_writes_metadata_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecordingConfig {
            base_dir: dir.path().to_path_buf(),
            session_prefix: "one_ball".to_string(),
        };

        let mut buffer = ReplayBuffer::new(vec!["arm/power".to_string()]);
        buffer.push(0, values_of(&[("arm/power", 0.9)])).unwrap();
        let path = buffer.save_session(&config).unwrap();

        assert!(path.exists());
        assert!(path.with_extension("json").exists());
        let metadata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path.with_extension("json")).unwrap())
                .unwrap();
        assert_eq!(metadata["samples"], 1);
    }

    // ========================================================================
    // Commands (context-level; full scheduler round-trip is in tests/)
    // ========================================================================

    #[test]
    fn test_recorder_samples_configured_signals() {
        let mut recorder = RecordCommand::new(["drive/forward", "drive/turn"]);
        let output = recorder.output();
        let mut bus = SignalBus::new();
        bus.write("drive/forward", 0.25);
        bus.write("drive/unrelated", 9.0);

        {
            let mut ctx = TickContext::new(5, &mut bus);
            recorder.initialize(&mut ctx);
            recorder.execute(&mut ctx);
        }
        bus.write("drive/forward", 0.5);
        {
            let mut ctx = TickContext::new(6, &mut bus);
            recorder.execute(&mut ctx);
            recorder.end(&mut ctx, true);
        }

        let frozen = output.lock().take().unwrap();
        assert_eq!(frozen.len(), 2);
        // Ticks are relative to recording start
        assert_eq!(frozen.samples[0].tick, 0);
        assert_eq!(frozen.samples[1].tick, 1);
        assert_eq!(frozen.samples[0].values["drive/forward"], 0.25);
        assert_eq!(frozen.samples[0].values["drive/turn"], 0.0);
        assert_eq!(frozen.samples[1].values["drive/forward"], 0.5);
        assert!(!frozen.samples[0].values.contains_key("drive/unrelated"));
    }

    #[test]
    fn test_recorder_stop_condition() {
        let recorder =
            RecordCommand::new(["drive/forward"]).with_stop_when(|ctx| ctx.signal_bool("stop"));
        let mut bus = SignalBus::new();
        {
            let ctx = TickContext::new(0, &mut bus);
            assert!(!recorder.is_finished(&ctx));
        }
        bus.write_bool("stop", true);
        let ctx = TickContext::new(1, &mut bus);
        assert!(recorder.is_finished(&ctx));
    }

    #[test]
    fn test_playback_writes_samples_and_finishes() {
        let mut buffer = ReplayBuffer::new(vec!["arm/power".to_string()]);
        buffer.push(0, values_of(&[("arm/power", 0.9)])).unwrap();
        buffer.push(1, values_of(&[("arm/power", 0.4)])).unwrap();

        let mut playback = PlaybackCommand::new(buffer);
        let mut bus = SignalBus::new();

        {
            let mut ctx = TickContext::new(0, &mut bus);
            playback.initialize(&mut ctx);
            assert!(!playback.is_finished(&ctx));
            playback.execute(&mut ctx);
        }
        assert_eq!(bus.read("arm/power"), 0.9);

        {
            let mut ctx = TickContext::new(1, &mut bus);
            assert!(!playback.is_finished(&ctx));
            playback.execute(&mut ctx);
        }
        assert_eq!(bus.read("arm/power"), 0.4);

        let ctx = TickContext::new(2, &mut bus);
        assert!(playback.is_finished(&ctx));
        assert_eq!(playback.remaining(), 0);
    }

    #[test]
    fn test_empty_playback_finishes_without_writing() {
        let mut playback = PlaybackCommand::new(ReplayBuffer::default());
        let mut bus = SignalBus::new();
        let mut ctx = TickContext::new(0, &mut bus);
        playback.initialize(&mut ctx);
        assert!(playback.is_finished(&ctx));
        assert!(ctx.signals().is_empty());
    }
}

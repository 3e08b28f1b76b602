//! Simulation gamepad driver
//!
//! Always-available driver holding axis and button state. Tests and demos
//! set inputs directly; an optional synthetic pattern sweeps the left stick
//! through a smooth circle for hands-off runs.

use std::collections::HashMap;

use talos_core::driver::DriverStatus;
use talos_core::error::TalosResult;

use super::{axes, GamepadConfig};

/// Simulated gamepad
#[derive(Debug)]
pub struct SimulationGamepadDriver {
    config: GamepadConfig,
    status: DriverStatus,
    axis_values: HashMap<String, f64>,
    button_values: HashMap<String, bool>,
    connected: bool,
    axis_pattern: bool,
    pattern_phase: f64,
}

impl SimulationGamepadDriver {
    /// Create a new simulation gamepad driver with default configuration
    pub fn new() -> Self {
        Self::with_config(GamepadConfig::default())
    }

    /// Create a new simulation driver with custom configuration
    pub fn with_config(config: GamepadConfig) -> Self {
        Self {
            config,
            status: DriverStatus::Uninitialized,
            axis_values: HashMap::new(),
            button_values: HashMap::new(),
            connected: true,
            axis_pattern: false,
            pattern_phase: 0.0,
        }
    }

    /// Initialize the driver
    pub fn init(&mut self) -> TalosResult<()> {
        self.axis_values.clear();
        self.button_values.clear();
        self.pattern_phase = 0.0;
        self.status = DriverStatus::Ready;
        Ok(())
    }

    /// Shutdown the driver
    pub fn shutdown(&mut self) -> TalosResult<()> {
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    /// Get driver status
    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    /// Gamepad configuration
    pub fn config(&self) -> &GamepadConfig {
        &self.config
    }

    /// Whether a controller is simulated as connected
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Set whether a controller is simulated as connected
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Simulate an axis position, clamped to [-1, 1]
    pub fn set_axis(&mut self, axis: &str, value: f64) {
        self.axis_values
            .insert(axis.to_string(), value.clamp(-1.0, 1.0));
    }

    /// Simulate a button press or release
    pub fn set_button(&mut self, button: &str, pressed: bool) {
        self.button_values.insert(button.to_string(), pressed);
    }

    /// Read an axis position (0.0 when centred or disconnected)
    pub fn axis(&self, axis: &str) -> f64 {
        if !self.connected {
            return 0.0;
        }
        let value = self.axis_values.get(axis).copied().unwrap_or(0.0);
        if self.config.invert_y && (axis == axes::LEFT_STICK_Y || axis == axes::RIGHT_STICK_Y) {
            -value
        } else {
            value
        }
    }

    /// Read a button state (false when disconnected)
    pub fn button(&self, button: &str) -> bool {
        self.connected && self.button_values.get(button).copied().unwrap_or(false)
    }

    /// Enable the synthetic left-stick pattern
    pub fn enable_axis_pattern(&mut self) {
        self.axis_pattern = true;
    }

    /// Advance the synthetic pattern by one tick, if enabled
    pub fn tick_pattern(&mut self) {
        if !self.axis_pattern {
            return;
        }
        self.pattern_phase += 0.1;
        if self.pattern_phase > std::f64::consts::TAU {
            self.pattern_phase -= std::f64::consts::TAU;
        }
        let x = self.pattern_phase.cos() * 0.5;
        let y = self.pattern_phase.sin() * 0.5;
        self.set_axis(axes::LEFT_STICK_X, x);
        self.set_axis(axes::LEFT_STICK_Y, y);
    }
}

impl Default for SimulationGamepadDriver {
    fn default() -> Self {
        Self::new()
    }
}

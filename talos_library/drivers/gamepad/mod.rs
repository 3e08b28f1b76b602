//! Gamepad/joystick drivers
//!
//! # Available Drivers
//!
//! - `SimulationGamepadDriver` - Always available, holds axis and button
//!   state set by tests or a synthetic input pattern

mod simulation;

pub use simulation::SimulationGamepadDriver;

/// Gamepad configuration shared across backends
#[derive(Debug, Clone, Copy)]
pub struct GamepadConfig {
    /// Device ID for multi-controller setups
    pub device_id: u32,
    /// Global deadzone for all axes (0.0 to 1.0)
    pub deadzone: f64,
    /// Invert the Y axes (stick-forward reads positive)
    pub invert_y: bool,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            deadzone: 0.1,
            invert_y: false,
        }
    }
}

/// Canonical axis names used by the control schemes
pub mod axes {
    pub const LEFT_STICK_X: &str = "LeftStickX";
    pub const LEFT_STICK_Y: &str = "LeftStickY";
    pub const RIGHT_STICK_X: &str = "RightStickX";
    pub const RIGHT_STICK_Y: &str = "RightStickY";
}

/// Canonical button names used by the control schemes
pub mod buttons {
    pub const LEFT_BUMPER: &str = "LeftBumper";
    pub const RIGHT_BUMPER: &str = "RightBumper";
    pub const DPAD_UP: &str = "DPadUp";
    pub const DPAD_DOWN: &str = "DPadDown";
}

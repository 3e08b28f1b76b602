//! Operator input: action sets and control schemes
//!
//! An *action set* names the inputs a role needs - the driver needs
//! forward/turn/slow, the operator needs arm power and winch buttons. A
//! *control scheme* binds those actions to physical controls and publishes
//! them onto well-known signal paths once per tick, before the scheduler
//! runs. Commands read the signal paths and never touch controllers
//! directly, which is exactly what lets the record/replay system substitute
//! recorded values for live ones.

use talos_core::signal::SignalBus;

use crate::drivers::gamepad::{axes, buttons, SimulationGamepadDriver};

/// Signal paths published by the control schemes
pub mod signals {
    /// Movement along the Y axis, -1 to 1
    pub const DRIVE_FORWARD: &str = "drive/forward";
    /// Rotation around the Z axis, -1 (counter-clockwise) to 1 (clockwise)
    pub const DRIVE_TURN: &str = "drive/turn";
    /// Whether the robot's speed should be slowed down
    pub const DRIVE_SLOW: &str = "drive/slow";
    /// Power for the arm motors, -1 to 1
    pub const ARM_POWER: &str = "arm/input";
    /// Winch winding held
    pub const WINCH_WIND: &str = "winch/wind";
    /// Winch unwinding held
    pub const WINCH_UNWIND: &str = "winch/unwind";
}

/// Scaled deadband: inputs inside the threshold read as zero, and the
/// remaining range is stretched back to [-1, 1] so there is no jump at the
/// threshold edge.
pub fn deadband(value: f64, threshold: f64) -> f64 {
    if value.abs() < threshold {
        0.0
    } else {
        (value - threshold.copysign(value)) / (1.0 - threshold)
    }
}

/// Drive the robot with an Xbox controller: left stick up/down for
/// forward/backward, right stick left/right to turn, either bumper to slow
/// down.
pub struct XboxDriver {
    pad: SimulationGamepadDriver,
    deadband: f64,
}

impl XboxDriver {
    pub fn new(pad: SimulationGamepadDriver) -> Self {
        let deadband = pad.config().deadzone;
        Self { pad, deadband }
    }

    /// Access the underlying gamepad (for simulation input)
    pub fn pad_mut(&mut self) -> &mut SimulationGamepadDriver {
        &mut self.pad
    }

    /// Movement along the Y axis; pushing the stick forward is positive
    pub fn forward(&self) -> f64 {
        deadband(-self.pad.axis(axes::LEFT_STICK_Y), self.deadband)
    }

    /// Rotation around the Z axis
    pub fn turn(&self) -> f64 {
        deadband(self.pad.axis(axes::RIGHT_STICK_X), self.deadband)
    }

    /// Whether the robot's speed should be slowed down
    pub fn slow(&self) -> bool {
        self.pad.button(buttons::LEFT_BUMPER) || self.pad.button(buttons::RIGHT_BUMPER)
    }

    /// Publish this tick's inputs onto the signal bus
    pub fn publish(&mut self, bus: &mut SignalBus) {
        self.pad.tick_pattern();
        bus.write(signals::DRIVE_FORWARD, self.forward());
        bus.write(signals::DRIVE_TURN, self.turn());
        bus.write_bool(signals::DRIVE_SLOW, self.slow());
    }
}

/// Operate the arm and winch with an Xbox controller: left stick for arm
/// power, d-pad up/down to wind/unwind the winch.
pub struct XboxOperator {
    pad: SimulationGamepadDriver,
    deadband: f64,
}

impl XboxOperator {
    pub fn new(pad: SimulationGamepadDriver) -> Self {
        let deadband = pad.config().deadzone;
        Self { pad, deadband }
    }

    /// Access the underlying gamepad (for simulation input)
    pub fn pad_mut(&mut self) -> &mut SimulationGamepadDriver {
        &mut self.pad
    }

    /// Power for the arm motors; pushing the stick forward is positive
    pub fn arm(&self) -> f64 {
        deadband(-self.pad.axis(axes::LEFT_STICK_Y), self.deadband)
    }

    /// Wind the winch while holding up on the d-pad
    pub fn wind_winch(&self) -> bool {
        self.pad.button(buttons::DPAD_UP)
    }

    /// Unwind the winch while holding down on the d-pad
    pub fn unwind_winch(&self) -> bool {
        self.pad.button(buttons::DPAD_DOWN)
    }

    /// Publish this tick's inputs onto the signal bus
    pub fn publish(&mut self, bus: &mut SignalBus) {
        bus.write(signals::ARM_POWER, self.arm());
        bus.write_bool(signals::WINCH_WIND, self.wind_winch());
        bus.write_bool(signals::WINCH_UNWIND, self.unwind_winch());
    }
}

//! Motor controller drivers
//!
//! # Available Drivers
//!
//! - `SimulationMotorDriver` - Always available, models a PWM motor
//!   controller with inversion and battery-voltage output

mod simulation;

pub use simulation::SimulationMotorDriver;

/// Motor configuration shared across backends
#[derive(Debug, Clone, Copy)]
pub struct MotorConfig {
    /// Invert the direction the motor turns when positive power is applied
    pub inverted: bool,
    /// Nominal battery voltage used to convert power into volts
    pub nominal_voltage: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            inverted: false,
            nominal_voltage: 12.0,
        }
    }
}

impl MotorConfig {
    pub fn inverted() -> Self {
        Self {
            inverted: true,
            ..Default::default()
        }
    }
}

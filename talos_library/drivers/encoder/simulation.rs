//! Simulation encoder driver
//!
//! Integrates wheel distance from the commanded motor power: one update per
//! tick, full power covering `metres_per_tick`. Crude but deterministic,
//! which is what routine tests want from a simulated drivetrain.

use talos_core::driver::DriverStatus;
use talos_core::error::TalosResult;

use super::EncoderConfig;

/// Simulated wheel encoder
#[derive(Debug)]
pub struct SimulationEncoderDriver {
    config: EncoderConfig,
    status: DriverStatus,
    position: f64,
    velocity: f64,
}

impl SimulationEncoderDriver {
    /// Create a new simulation encoder driver with default configuration
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    /// Create a new simulation driver with custom configuration
    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            config,
            status: DriverStatus::Uninitialized,
            position: 0.0,
            velocity: 0.0,
        }
    }

    /// Initialize the driver
    pub fn init(&mut self) -> TalosResult<()> {
        self.position = 0.0;
        self.velocity = 0.0;
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

    /// Advance the simulation by one tick of motion at the given motor power
    pub fn update(&mut self, power: f64) {
        self.status = DriverStatus::Running;
        let direction = if self.config.inverted { -1.0 } else { 1.0 };
        let delta = power.clamp(-1.0, 1.0) * self.config.metres_per_tick * direction;
        self.position += delta;
        self.velocity = delta;
    }

    /// Reset the recorded position to zero
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.velocity = 0.0;
    }

    /// Distance travelled since the last reset, in metres
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Distance covered in the most recent tick, in metres per tick
    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}

impl Default for SimulationEncoderDriver {
    fn default() -> Self {
        Self::new()
    }
}

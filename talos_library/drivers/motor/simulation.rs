//! Simulation motor driver
//!
//! Always-available driver that models a PWM motor controller: commanded
//! power is clamped to [-1, 1], inversion is applied at the output, and the
//! output voltage scales with the configured nominal battery voltage.

use talos_core::driver::DriverStatus;
use talos_core::error::{TalosError, TalosResult};

use super::MotorConfig;

/// Simulated PWM motor controller
#[derive(Debug)]
pub struct SimulationMotorDriver {
    config: MotorConfig,
    status: DriverStatus,
    power: f64,
}

impl SimulationMotorDriver {
    /// Create a new simulation motor driver with default configuration
    pub fn new() -> Self {
        Self::with_config(MotorConfig::default())
    }

    /// Create a new simulation driver with custom configuration
    pub fn with_config(config: MotorConfig) -> Self {
        Self {
            config,
            status: DriverStatus::Uninitialized,
            power: 0.0,
        }
    }

    /// Initialize the driver
    pub fn init(&mut self) -> TalosResult<()> {
        self.power = 0.0;
        self.status = DriverStatus::Ready;
        Ok(())
    }

    /// Shutdown the driver, stopping the motor
    pub fn shutdown(&mut self) -> TalosResult<()> {
        self.power = 0.0;
        self.status = DriverStatus::Shutdown;
        Ok(())
    }

    /// Get driver status
    pub fn status(&self) -> DriverStatus {
        self.status.clone()
    }

    /// Command motor power, from -1 to 1 (clamped)
    pub fn set_power(&mut self, power: f64) -> TalosResult<()> {
        if self.status != DriverStatus::Ready && self.status != DriverStatus::Running {
            return Err(TalosError::driver("Motor driver not initialized"));
        }
        self.status = DriverStatus::Running;
        self.power = power.clamp(-1.0, 1.0);
        Ok(())
    }

    /// Stop the motor
    pub fn stop(&mut self) {
        self.power = 0.0;
    }

    /// The last commanded power, before inversion
    pub fn power(&self) -> f64 {
        self.power
    }

    /// Effective output power after inversion, from -1 to 1
    pub fn output(&self) -> f64 {
        if self.config.inverted {
            -self.power
        } else {
            self.power
        }
    }

    /// Output expressed in volts at the nominal battery voltage: a power of
    /// 0.5 at 12 V nominal is 6 V
    pub fn output_voltage(&self) -> f64 {
        self.output() * self.config.nominal_voltage
    }
}

impl Default for SimulationMotorDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_motor_lifecycle() {
        let mut motor = SimulationMotorDriver::new();
        assert_eq!(motor.status(), DriverStatus::Uninitialized);
        assert!(motor.set_power(0.5).is_err());

        motor.init().unwrap();
        motor.set_power(0.5).unwrap();
        assert_eq!(motor.status(), DriverStatus::Running);
        assert_relative_eq!(motor.output(), 0.5);

        motor.shutdown().unwrap();
        assert_relative_eq!(motor.output(), 0.0);
    }

    #[test]
    fn test_power_clamped() {
        let mut motor = SimulationMotorDriver::new();
        motor.init().unwrap();
        motor.set_power(2.5).unwrap();
        assert_relative_eq!(motor.output(), 1.0);
        motor.set_power(-1.5).unwrap();
        assert_relative_eq!(motor.output(), -1.0);
    }

    #[test]
    fn test_inversion_applies_to_output() {
        let mut motor = SimulationMotorDriver::with_config(MotorConfig::inverted());
        motor.init().unwrap();
        motor.set_power(0.75).unwrap();
        assert_relative_eq!(motor.power(), 0.75);
        assert_relative_eq!(motor.output(), -0.75);
    }

    #[test]
    fn test_output_voltage_scales_with_nominal() {
        let mut motor = SimulationMotorDriver::with_config(MotorConfig {
            inverted: false,
            nominal_voltage: 9.0,
        });
        motor.init().unwrap();
        motor.set_power(0.5).unwrap();
        assert_relative_eq!(motor.output_voltage(), 4.5);
    }
}

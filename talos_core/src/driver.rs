//! Driver utilities for TALOS
//!
//! Common types for the hardware capability layer that leaf commands call
//! into. Drivers are standalone structs with direct methods - no trait
//! hierarchy required. The scheduler treats every driver call as an opaque
//! synchronous operation that fits within one tick.

use std::fmt;

/// Driver status for lifecycle tracking
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DriverStatus {
    /// Driver has not been initialized yet
    #[default]
    Uninitialized,
    /// Driver is ready to operate
    Ready,
    /// Driver is actively running
    Running,
    /// Driver encountered an error
    Error(String),
    /// Driver has been shut down
    Shutdown,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Ready => write!(f, "Ready"),
            Self::Running => write!(f, "Running"),
            Self::Error(msg) => write!(f, "Error: {}", msg),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Driver category for classification (informational only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCategory {
    /// Sensors (encoders, gyros, limit switches, etc.)
    Sensor,
    /// Actuators (motors, servos, solenoids, etc.)
    Actuator,
    /// Input devices (gamepad, keyboard, etc.)
    Input,
    /// Simulation backends
    Simulation,
}

impl fmt::Display for DriverCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor => write!(f, "Sensor"),
            Self::Actuator => write!(f, "Actuator"),
            Self::Input => write!(f, "Input"),
            Self::Simulation => write!(f, "Simulation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_status_display() {
        assert_eq!(DriverStatus::Ready.to_string(), "Ready");
        assert_eq!(
            DriverStatus::Error("test".to_string()).to_string(),
            "Error: test"
        );
    }

    #[test]
    fn test_driver_status_default() {
        assert_eq!(DriverStatus::default(), DriverStatus::Uninitialized);
    }

    #[test]
    fn test_driver_category_display() {
        assert_eq!(DriverCategory::Actuator.to_string(), "Actuator");
        assert_eq!(DriverCategory::Simulation.to_string(), "Simulation");
    }
}

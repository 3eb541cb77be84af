//! Robot configuration
//!
//! Everything calibratable about the simulated robot, loadable from TOML.
//! Every section and field falls back to its default, so a partial file only
//! needs the values it overrides:
//!
//! ```toml
//! [physics]
//! max_speed = 4.5
//!
//! [calibration]
//! polarity = "light_is_high"
//!
//! [[sensors]]
//! id = 2
//! angular_offset = 0.0
//! radial_offset = 12.0
//! ```

use crate::interpreter::bindings::ChannelConstants;
use crate::interpreter::constants::CHANNEL_COUNT;
use crate::interpreter::engine::RuntimeLimits;
use crate::sim::physics::PhysicsConfig;
use crate::sim::sensors::{Calibration, SensorChannel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse robot config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize robot config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Sensor channel id {id} is outside 0..{}", CHANNEL_COUNT)]
    SensorIdOutOfRange { id: usize },

    #[error("Channel constant '{name}' = {id} is outside 0..{}", CHANNEL_COUNT)]
    ChannelConstantOutOfRange { name: &'static str, id: usize },

    #[error("Wheel base must be positive and finite, got {0}")]
    InvalidWheelBase(f64),

    #[error("Maximum speed must be finite, got {0}")]
    InvalidMaxSpeed(f64),

    #[error("Tape tolerance {0} exceeds 255")]
    TapeToleranceTooLarge(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub physics: PhysicsConfig,
    pub sensors: Vec<SensorChannel>,
    pub calibration: Calibration,
    pub channels: ChannelConstants,
    pub limits: RuntimeLimits,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            sensors: SensorChannel::default_layout(),
            calibration: Calibration::default(),
            channels: ChannelConstants::default(),
            limits: RuntimeLimits::default(),
        }
    }
}

impl RobotConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for sensor in &self.sensors {
            if sensor.id >= CHANNEL_COUNT {
                return Err(ConfigError::SensorIdOutOfRange { id: sensor.id });
            }
        }

        let constants = [
            ("center", self.channels.center),
            ("left", self.channels.left),
            ("right", self.channels.right),
        ];
        for (name, id) in constants {
            if id >= CHANNEL_COUNT {
                return Err(ConfigError::ChannelConstantOutOfRange { name, id });
            }
        }

        let wheel_base = self.physics.wheel_base;
        if !(wheel_base > 0.0 && wheel_base.is_finite()) {
            return Err(ConfigError::InvalidWheelBase(wheel_base));
        }
        if !self.physics.max_speed.is_finite() {
            return Err(ConfigError::InvalidMaxSpeed(self.physics.max_speed));
        }
        if self.calibration.tape_tolerance > 255 {
            return Err(ConfigError::TapeToleranceTooLarge(
                self.calibration.tape_tolerance,
            ));
        }
        Ok(())
    }
}

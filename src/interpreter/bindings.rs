//! Runtime bindings
//!
//! Everything a program instance can touch outside its own locals: the two
//! fixed-size arrays, the actuator sink and the constants. The bindings are
//! owned by the instance; the host reaches them through the scheduler.
//!
//! Write access is split by role. Programs write only `gV` and call only the
//! actuator; the host writes only the sensor channels.

use crate::interpreter::constants::{CHANNEL_COUNT, SLOT_COUNT};
use serde::{Deserialize, Serialize};

/// Sink for `motor(first, second)` calls
pub trait Actuator {
    fn actuate(&mut self, first: f64, second: f64);
}

impl<F: FnMut(f64, f64)> Actuator for F {
    fn actuate(&mut self, first: f64, second: f64) {
        self(first, second)
    }
}

/// Channel ids bound to `CN2`, `CN5` and `CN6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConstants {
    pub center: usize,
    pub left: usize,
    pub right: usize,
}

impl Default for ChannelConstants {
    fn default() -> Self {
        Self {
            center: 2,
            left: 5,
            right: 6,
        }
    }
}

/// Runtime bindings handed to a program instance
#[derive(Debug, Clone)]
pub struct RuntimeBindings<A> {
    sensor_channels: [f64; CHANNEL_COUNT],
    variable_slots: [f64; SLOT_COUNT],
    actuator: A,
    channel_constants: ChannelConstants,
    boolean_true: f64,
}

impl<A: Actuator> RuntimeBindings<A> {
    /// Positional constructor in the fixed binding order
    pub fn new(
        sensor_channels: [f64; CHANNEL_COUNT],
        variable_slots: [f64; SLOT_COUNT],
        actuator: A,
        channel_constants: ChannelConstants,
        boolean_true: f64,
    ) -> Self {
        Self {
            sensor_channels,
            variable_slots,
            actuator,
            channel_constants,
            boolean_true,
        }
    }

    /// Zeroed arrays, default channel ids and `TRUE` = 1
    pub fn with_actuator(actuator: A) -> Self {
        Self::new(
            [0.0; CHANNEL_COUNT],
            [0.0; SLOT_COUNT],
            actuator,
            ChannelConstants::default(),
            1.0,
        )
    }

    pub fn sensor_channels(&self) -> &[f64; CHANNEL_COUNT] {
        &self.sensor_channels
    }

    /// Host-side write access to the sensor channels
    pub fn sensor_channels_mut(&mut self) -> &mut [f64; CHANNEL_COUNT] {
        &mut self.sensor_channels
    }

    pub fn variable_slots(&self) -> &[f64; SLOT_COUNT] {
        &self.variable_slots
    }

    pub(crate) fn variable_slots_mut(&mut self) -> &mut [f64; SLOT_COUNT] {
        &mut self.variable_slots
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub(crate) fn actuate(&mut self, first: f64, second: f64) {
        self.actuator.actuate(first, second);
    }

    pub fn channel_constants(&self) -> ChannelConstants {
        self.channel_constants
    }

    pub fn boolean_true(&self) -> f64 {
        self.boolean_true
    }
}

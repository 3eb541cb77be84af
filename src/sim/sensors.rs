//! Reflectance sensor model
//!
//! Each [`SensorChannel`] sits at a fixed angle and distance from the robot
//! center. Its reading is derived from the surface color under that point:
//! - off the surface: `0`
//! - the tape marker color (per-channel tolerance, inclusive): a fixed
//!   calibrated value
//! - anything else: average gray level mapped linearly onto
//!   `0..=max_reading`, darker reading higher by default

use crate::interpreter::constants::CHANNEL_COUNT;
use crate::sim::physics::RobotPose;
use serde::{Deserialize, Serialize};

/// One sensor's mounting geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorChannel {
    /// Index into the sensor channel array
    pub id: usize,
    /// Radians relative to the robot heading
    pub angular_offset: f64,
    /// Distance from the robot center
    pub radial_offset: f64,
}

impl SensorChannel {
    pub fn new(id: usize, angular_offset: f64, radial_offset: f64) -> Self {
        Self {
            id,
            angular_offset,
            radial_offset,
        }
    }

    /// Center sensor ahead, left and right sensors 60° to either side
    pub fn default_layout() -> Vec<SensorChannel> {
        let sixty = 60f64.to_radians();
        vec![
            SensorChannel::new(2, 0.0, 10.0),
            SensorChannel::new(5, -sixty, 15.0),
            SensorChannel::new(6, sixty, 15.0),
        ]
    }

    /// World coordinates this sensor looks at
    pub fn sample_point(&self, pose: &RobotPose) -> (f64, f64) {
        let theta = pose.heading + self.angular_offset;
        (
            pose.x + theta.cos() * self.radial_offset,
            pose.y + theta.sin() * self.radial_offset,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Mean of the three channels
    pub fn intensity(&self) -> f64 {
        (f64::from(self.r) + f64::from(self.g) + f64::from(self.b)) / 3.0
    }
}

/// Color lookup in world coordinates; `None` when off the surface
pub trait Surface {
    fn sample(&self, x: f64, y: f64) -> Option<Rgb>;
}

impl<F: Fn(f64, f64) -> Option<Rgb>> Surface for F {
    fn sample(&self, x: f64, y: f64) -> Option<Rgb> {
        self(x, y)
    }
}

/// Which end of the gray scale reads high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    DarkIsHigh,
    LightIsHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub max_reading: f64,
    pub polarity: Polarity,
    pub tape_reading: f64,
    /// Allowed difference per color channel, inclusive
    pub tape_tolerance: u32,
    pub tape_color: Rgb,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            max_reading: 1023.0,
            polarity: Polarity::DarkIsHigh,
            tape_reading: 818.0,
            tape_tolerance: 10,
            tape_color: Rgb::gray(192),
        }
    }
}

impl Calibration {
    pub fn is_tape(&self, color: Rgb) -> bool {
        let near = |a: u8, b: u8| u32::from(a.abs_diff(b)) <= self.tape_tolerance;
        near(color.r, self.tape_color.r)
            && near(color.g, self.tape_color.g)
            && near(color.b, self.tape_color.b)
    }

    /// Channel reading for a sampled color
    pub fn reading(&self, sample: Option<Rgb>) -> f64 {
        let Some(color) = sample else {
            return 0.0;
        };
        if self.is_tape(color) {
            return self.tape_reading;
        }

        let intensity = color.intensity();
        let level = match self.polarity {
            Polarity::DarkIsHigh => 255.0 - intensity,
            Polarity::LightIsHigh => intensity,
        };
        (level / 255.0 * self.max_reading).floor()
    }
}

/// Refresh `channels` from the surface under each sensor.
///
/// Channels without a sensor keep their value; ids past the array are ignored.
pub fn read_channels<S: Surface + ?Sized>(
    pose: &RobotPose,
    sensors: &[SensorChannel],
    calibration: &Calibration,
    surface: &S,
    channels: &mut [f64; CHANNEL_COUNT],
) {
    for sensor in sensors {
        let Some(slot) = channels.get_mut(sensor.id) else {
            continue;
        };
        let (x, y) = sensor.sample_point(pose);
        *slot = calibration.reading(surface.sample(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = SensorChannel::default_layout();
        let ids: Vec<_> = layout.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 5, 6]);
        assert!(layout[1].angular_offset < 0.0);
    }

    #[test]
    fn test_sample_point_rotates_with_heading() {
        let sensor = SensorChannel::new(2, 0.0, 10.0);
        let (x, y) = sensor.sample_point(&RobotPose::at(100.0, 50.0, std::f64::consts::PI));
        assert!((x - 90.0).abs() < 1e-9);
        assert!((y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_readings() {
        let calibration = Calibration::default();

        assert_eq!(calibration.reading(None), 0.0);
        assert_eq!(calibration.reading(Some(Rgb::BLACK)), 1023.0);
        assert_eq!(calibration.reading(Some(Rgb::WHITE)), 0.0);
        assert_eq!(calibration.reading(Some(Rgb::new(200, 185, 192))), 818.0);
        assert_eq!(calibration.reading(Some(Rgb::gray(128))), 509.0);
        // one channel just outside the tolerance window
        assert_eq!(calibration.reading(Some(Rgb::new(203, 192, 192))), 238.0);
    }

    #[test]
    fn test_light_is_high() {
        let calibration = Calibration {
            polarity: Polarity::LightIsHigh,
            ..Calibration::default()
        };
        assert_eq!(calibration.reading(Some(Rgb::WHITE)), 1023.0);
        assert_eq!(calibration.reading(Some(Rgb::BLACK)), 0.0);
    }

    #[test]
    fn test_read_channels_only_touches_mounted_sensors() {
        let surface = |x: f64, _y: f64| if x < 0.0 { None } else { Some(Rgb::BLACK) };
        let mut channels = [7.0; CHANNEL_COUNT];

        read_channels(
            &RobotPose::at(5.0, 0.0, 0.0),
            &SensorChannel::default_layout(),
            &Calibration::default(),
            &surface,
            &mut channels,
        );

        assert_eq!(channels[2], 1023.0);
        assert_eq!(channels[5], 1023.0);
        assert_eq!(channels[0], 7.0);
    }

    #[test]
    fn test_off_surface_reads_zero() {
        let surface = |_: f64, _: f64| -> Option<Rgb> { None };
        let mut channels = [7.0; CHANNEL_COUNT];

        read_channels(
            &RobotPose::default(),
            &SensorChannel::default_layout(),
            &Calibration::default(),
            &surface,
            &mut channels,
        );

        assert_eq!(channels[6], 0.0);
    }
}

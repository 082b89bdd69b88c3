//! Configuration primitives for the RM3100 driver.

use crate::registers::rm3100::{CYCLE_COUNT_MAX, CYCLE_COUNT_MIN};

/// Source axis of a measurement, in the device's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Device X axis.
    X = 0,
    /// Device Y axis.
    Y = 1,
    /// Device Z axis.
    Z = 2,
}

/// Sign applied when remapping an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sign {
    /// Keep the sign.
    Positive,
    /// Negate.
    Negative,
}

/// One output axis: which device axis feeds it, and with which sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisTransform {
    /// Device axis read for this output.
    pub source: Axis,
    /// Sign applied to the source value.
    pub sign: Sign,
}

impl AxisTransform {
    /// Creates a transform.
    pub const fn new(source: Axis, sign: Sign) -> Self {
        Self { source, sign }
    }

    /// Applies the transform to a device-frame triplet. Negation saturates at `i32::MAX`.
    pub fn apply(self, raw: [i32; 3]) -> i32 {
        let value = raw[self.source as usize];
        match self.sign {
            Sign::Positive => value,
            Sign::Negative => value.saturating_neg(),
        }
    }
}

/// Output frame `(y, x, -z)` of the reference board mounting.
pub const BOARD_AXIS_MAP: [AxisTransform; 3] = [
    AxisTransform::new(Axis::Y, Sign::Positive),
    AxisTransform::new(Axis::X, Sign::Positive),
    AxisTransform::new(Axis::Z, Sign::Negative),
];

/// Sensitivity at 200 cycles, in counts per microtesla.
pub const DEFAULT_COUNTS_PER_UT: f32 = 75.0;
/// Cycle count used on every axis by default.
pub const DEFAULT_CYCLE_COUNT: u16 = 200;

/// User-facing configuration for the RM3100 magnetometer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagConfig {
    /// Cycle counts for X, Y and Z.
    pub cycle_counts: [u16; 3],
    /// Divisor converting counts to microtesla.
    pub counts_per_ut: f32,
    /// Output axes, in output order.
    pub axis_map: [AxisTransform; 3],
}

impl MagConfig {
    /// Begins building a [`MagConfig`] using the builder pattern.
    pub fn new() -> MagConfigBuilder {
        MagConfigBuilder::new()
    }

    /// Checks whether this configuration is usable.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self
            .cycle_counts
            .iter()
            .any(|&count| !(CYCLE_COUNT_MIN..=CYCLE_COUNT_MAX).contains(&count))
        {
            return Err(ConfigError::CycleCount);
        }

        if !self.counts_per_ut.is_finite() || self.counts_per_ut <= 0.0 {
            return Err(ConfigError::Sensitivity);
        }

        // Every device axis must feed exactly one output.
        let mut seen = [false; 3];
        for transform in self.axis_map {
            if core::mem::replace(&mut seen[transform.source as usize], true) {
                return Err(ConfigError::AxisMap);
            }
        }

        Ok(())
    }

    /// Remaps a device-frame triplet into output order.
    pub fn remap(&self, raw: [i32; 3]) -> [i32; 3] {
        self.axis_map.map(|transform| transform.apply(raw))
    }
}

impl Default for MagConfig {
    fn default() -> Self {
        Self {
            cycle_counts: [DEFAULT_CYCLE_COUNT; 3],
            counts_per_ut: DEFAULT_COUNTS_PER_UT,
            axis_map: BOARD_AXIS_MAP,
        }
    }
}

/// Builder for [`MagConfig`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct MagConfigBuilder {
    config: MagConfig,
}

impl MagConfigBuilder {
    /// Creates a new builder seeded with [`MagConfig::default()`].
    pub fn new() -> Self {
        Self {
            config: MagConfig::default(),
        }
    }

    /// Overrides the cycle counts.
    pub fn cycle_counts(mut self, x: u16, y: u16, z: u16) -> Self {
        self.config.cycle_counts = [x, y, z];
        self
    }

    /// Overrides the sensitivity divisor.
    pub fn counts_per_ut(mut self, counts_per_ut: f32) -> Self {
        self.config.counts_per_ut = counts_per_ut;
        self
    }

    /// Overrides the output axis mapping.
    pub fn axis_map(mut self, axis_map: [AxisTransform; 3]) -> Self {
        self.config.axis_map = axis_map;
        self
    }

    /// Finalizes the builder and returns the [`MagConfig`].
    pub fn build(self) -> MagConfig {
        self.config
    }
}

impl Default for MagConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation errors generated while verifying a [`MagConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A cycle count lies outside the supported range.
    CycleCount,
    /// The sensitivity divisor is not a positive finite number.
    Sensitivity,
    /// The axis map does not use every device axis exactly once.
    AxisMap,
}

//! Configuration for a polygonization run.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Paired fine/coarse grid sizes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Fine grid cells per axis.
    pub grid_size: u64,
    /// Coarse super-voxel cells per axis.
    pub sv_size: u64,
}

impl Resolution {
    pub const LOW: Resolution = Resolution {
        grid_size: 32,
        sv_size: 8,
    };
    pub const MID: Resolution = Resolution {
        grid_size: 512,
        sv_size: 128,
    };
    pub const HIGH: Resolution = Resolution {
        grid_size: 2048,
        sv_size: 512,
    };
}

/// Configuration for the surface tracker.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Fine grid cells per axis.
    pub grid_size: u64,
    /// Coarse super-voxel cells per axis.
    pub sv_size: u64,
    /// Target iso-value of the extracted surface.
    pub iso_value: f32,
    /// Hard cap on the seed gradient walk; `None` derives one from the grid.
    pub max_walk_steps: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            grid_size: Resolution::LOW.grid_size,
            sv_size: Resolution::LOW.sv_size,
            iso_value: 0.5,
            max_walk_steps: None,
        }
    }
}

impl TrackerConfig {
    /// Creates a configuration at the given resolution.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            grid_size: resolution.grid_size,
            sv_size: resolution.sv_size,
            ..Default::default()
        }
    }

    /// Sets the target iso-value.
    pub fn with_iso_value(mut self, iso_value: f32) -> Self {
        self.iso_value = iso_value;
        self
    }

    /// Sets an explicit cap on the seed gradient walk.
    pub fn with_max_walk_steps(mut self, max_walk_steps: u64) -> Self {
        self.max_walk_steps = Some(max_walk_steps);
        self
    }

    /// Sets both grid sizes from a resolution preset.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.grid_size = resolution.grid_size;
        self.sv_size = resolution.sv_size;
        self
    }

    /// The effective walk cap: explicit value or four sweeps of the grid.
    pub fn walk_cap(&self) -> u64 {
        self.max_walk_steps.unwrap_or(4 * self.grid_size)
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.sv_size == 0 {
            return Err(Error::InvalidConfig("sv_size must be > 0".into()));
        }
        if self.grid_size < self.sv_size {
            return Err(Error::InvalidConfig(
                "grid_size must be >= sv_size (the fine grid subdivides the coarse one)".into(),
            ));
        }
        if !self.iso_value.is_finite() {
            return Err(Error::InvalidConfig("iso_value must be finite".into()));
        }
        if self.max_walk_steps == Some(0) {
            return Err(Error::InvalidConfig("max_walk_steps must be > 0".into()));
        }
        Ok(())
    }
}

use std::time::Duration;

/// Tunables of the 1D viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Redraws are spaced at least this far apart; updates arriving
    /// sooner are coalesced into one deferred redraw.
    pub min_redraw_interval: Duration,
    /// Fraction of the visible window width added on each side before
    /// culling.
    pub padding_fraction: f64,
    /// Hard cap on primitives emitted by a single redraw.
    pub max_primitives: usize,
    /// Features narrower than this (in pixels) are not drawn.
    pub min_feature_px: f64,

    /// Extents at least this long (in bp) get the deeper zoom limit.
    pub large_region_threshold: u64,
    pub large_region_max_scale: f64,
    pub small_region_max_scale: f64,
    /// Exponent per wheel delta unit; the scale changes by
    /// `2^(-delta * wheel_sensitivity)`.
    pub wheel_sensitivity: f64,

    pub lane_height: f32,
    pub rows_per_lane: usize,
    pub lane_gap: f32,
    /// Extra pixels around each primitive that still count as a hit.
    pub hit_slop: f32,
}

impl std::default::Default for Config {
    fn default() -> Self {
        Self {
            min_redraw_interval: Duration::from_millis(16),
            padding_fraction: 0.1,
            max_primitives: 20_000,
            min_feature_px: 1.0,

            large_region_threshold: 1_000_000,
            large_region_max_scale: 50_000.0,
            small_region_max_scale: 1_000.0,
            wheel_sensitivity: 0.002,

            lane_height: 36.0,
            rows_per_lane: 3,
            lane_gap: 4.0,
            hit_slop: 3.0,
        }
    }
}

impl Config {
    pub fn max_scale(&self, region_len: u64) -> f64 {
        if region_len >= self.large_region_threshold {
            self.large_region_max_scale
        } else {
            self.small_region_max_scale
        }
    }

    pub fn row_height(&self) -> f32 {
        self.lane_height / self.rows_per_lane.max(1) as f32
    }
}

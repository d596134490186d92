//! Update configuration.

use crate::solver::SINGULAR_PIVOT_TOLERANCE;

/// Default minimum number of grid points before a sweep runs in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Configuration for the per-point update engines.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Run grid sweeps on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
    /// Grids smaller than this are always swept serially.
    pub parallel_threshold: usize,
    /// Pivot magnitude below which the relaxation matrix counts as singular.
    pub pivot_tolerance: f64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            pivot_tolerance: SINGULAR_PIVOT_TOLERANCE,
        }
    }
}

impl UpdateConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force serial sweeps (the reference path).
    pub fn serial() -> Self {
        Self::default().with_parallel(false)
    }

    /// Enable or disable parallel sweeps.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the minimum grid size for parallel sweeps.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the LU pivot tolerance.
    pub fn with_pivot_tolerance(mut self, tolerance: f64) -> Self {
        self.pivot_tolerance = tolerance;
        self
    }

    /// Whether a sweep over `ntot` points should use the parallel path.
    pub fn use_parallel(&self, ntot: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && ntot >= self.parallel_threshold
    }
}

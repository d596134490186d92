//! Transition tables: which levels each transition couples, and its rates.

use crate::error::{MultilevelError, Result, TransitionKind};
use crate::grid::{Direction, SIGMAT_COLUMNS};

/// A radiative transition, driven by the field through a polarization.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiativeTransition {
    /// Transition frequency (cycles per unit time; the angular frequency is 2*pi*frequency)
    pub frequency: f64,
    /// Linewidth gamma (the polarization dephasing rate is pi*gamma)
    pub linewidth: f64,
    /// Saturation cross-section per direction
    pub sigmat: [f64; SIGMAT_COLUMNS],
}

impl RadiativeTransition {
    /// Create a transition with the same cross-section along every direction.
    pub fn isotropic(frequency: f64, linewidth: f64, cross_section: f64) -> Self {
        Self {
            frequency,
            linewidth,
            sigmat: [cross_section; SIGMAT_COLUMNS],
        }
    }

    /// Create a transition with an explicit cross-section row.
    pub fn new(frequency: f64, linewidth: f64, sigmat: [f64; SIGMAT_COLUMNS]) -> Self {
        Self {
            frequency,
            linewidth,
            sigmat,
        }
    }

    /// Cross-section for a field component pointing along `direction`.
    pub fn cross_section(&self, direction: Direction) -> f64 {
        self.sigmat[direction.index()]
    }
}

/// A non-radiative transition, evolved through its density-matrix coherence.
#[derive(Debug, Clone, PartialEq)]
pub struct NonRadiativeTransition {
    /// Decoherence rate of the coherence amplitude
    pub decoherence: f64,
    /// Beat (precession) angular frequency
    pub frequency: f64,
}

impl NonRadiativeTransition {
    pub fn new(decoherence: f64, frequency: f64) -> Self {
        Self {
            decoherence,
            frequency,
        }
    }
}

/// Signed level x transition coupling matrix (`alpha` or `beta`).
///
/// Column `t` has exactly one positive entry (the upper level) and one
/// negative entry (the lower level). The magnitudes weight how the
/// transition's driven term feeds each level's population.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingMatrix {
    kind: TransitionKind,
    levels: usize,
    columns: usize,
    /// Row-major levels x columns
    entries: Vec<f64>,
}

impl CouplingMatrix {
    /// Create a coupling matrix from row-major `levels x columns` entries.
    pub fn new(kind: TransitionKind, levels: usize, columns: usize, entries: Vec<f64>) -> Result<Self> {
        if entries.len() != levels * columns {
            return Err(MultilevelError::dimension_mismatch(
                format!("{} coupling matrix", kind),
                levels * columns,
                entries.len(),
            ));
        }
        let matrix = Self {
            kind,
            levels,
            columns,
            entries,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build a matrix with unit entries from `(upper, lower)` level pairs.
    pub fn from_pairs(kind: TransitionKind, levels: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        let columns = pairs.len();
        let mut entries = vec![0.0; levels * columns];
        for (t, &(upper, lower)) in pairs.iter().enumerate() {
            if upper >= levels || lower >= levels {
                return Err(MultilevelError::invalid_transition(
                    kind,
                    t,
                    format!("level pair ({}, {}) outside 0..{}", upper, lower, levels),
                ));
            }
            entries[upper * columns + t] += 1.0;
            entries[lower * columns + t] -= 1.0;
        }
        Self::new(kind, levels, columns, entries)
    }

    /// An empty matrix (no transitions).
    pub fn empty(kind: TransitionKind, levels: usize) -> Self {
        Self {
            kind,
            levels,
            columns: 0,
            entries: Vec::new(),
        }
    }

    /// Check that every column names exactly one upper and one lower level.
    pub fn validate(&self) -> Result<()> {
        for t in 0..self.columns {
            let mut positive = 0;
            let mut negative = 0;
            for l in 0..self.levels {
                let a = self.get(l, t);
                if a.is_nan() {
                    return Err(MultilevelError::invalid_transition(self.kind, t, "NaN coupling entry"));
                }
                if a > 0.0 {
                    positive += 1;
                } else if a < 0.0 {
                    negative += 1;
                }
            }
            if positive != 1 || negative != 1 {
                return Err(MultilevelError::invalid_transition(
                    self.kind,
                    t,
                    format!(
                        "expected one positive and one negative entry, found {} and {}",
                        positive, negative
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Which table this is.
    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// Number of levels (rows).
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Number of transitions (columns).
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Entry at (level, transition).
    #[inline]
    pub fn get(&self, level: usize, t: usize) -> f64 {
        self.entries[level * self.columns + t]
    }

    /// Whether transition `t` touches `level`.
    #[inline]
    pub fn couples(&self, level: usize, t: usize) -> bool {
        self.get(level, t) != 0.0
    }

    /// The `(upper, lower)` levels of transition `t`.
    pub fn endpoints(&self, t: usize) -> Result<(usize, usize)> {
        let mut upper = None;
        let mut lower = None;
        for l in 0..self.levels {
            let a = self.get(l, t);
            if a > 0.0 {
                upper = Some(l);
            }
            if a < 0.0 {
                lower = Some(l);
            }
        }
        match (upper, lower) {
            (Some(u), Some(l)) => Ok((u, l)),
            _ => Err(MultilevelError::invalid_transition(
                self.kind,
                t,
                "missing upper or lower level",
            )),
        }
    }

    /// The first transition touching both `l1` and `l2`.
    pub fn find_connecting(&self, l1: usize, l2: usize) -> Option<usize> {
        (0..self.columns).find(|&t| self.couples(l1, t) && self.couples(l2, t))
    }
}

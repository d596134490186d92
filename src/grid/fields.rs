//! Sparse per-component field tables supplied by the host solver.

use crate::error::{MultilevelError, Result};

use super::types::{ComplexPart, Component, Direction, NUM_COMPONENTS};

/// Field arrays keyed by component and complex part.
///
/// Absent entries are normal: a real-valued simulation has no imaginary
/// parts, and a 1D run only carries two components.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    ntot: usize,
    arrays: Vec<Option<Vec<f64>>>,
}

impl FieldSet {
    /// Create an empty table for arrays of `ntot` points.
    pub fn new(ntot: usize) -> Self {
        Self {
            ntot,
            arrays: vec![None; NUM_COMPONENTS * 2],
        }
    }

    fn slot(c: Component, part: ComplexPart) -> usize {
        c.index() * 2 + part.index()
    }

    /// Number of points per array.
    pub fn ntot(&self) -> usize {
        self.ntot
    }

    /// Insert an array, replacing any previous one.
    pub fn insert(&mut self, c: Component, part: ComplexPart, values: Vec<f64>) -> Result<()> {
        if values.len() != self.ntot {
            return Err(MultilevelError::dimension_mismatch(
                format!("field {} ({:?})", c, part),
                self.ntot,
                values.len(),
            ));
        }
        self.arrays[Self::slot(c, part)] = Some(values);
        Ok(())
    }

    /// Insert a zero-filled array.
    pub fn with_zeros(mut self, c: Component, part: ComplexPart) -> Self {
        self.arrays[Self::slot(c, part)] = Some(vec![0.0; self.ntot]);
        self
    }

    /// Insert an array filled with `value`.
    pub fn with_uniform(mut self, c: Component, part: ComplexPart, value: f64) -> Self {
        self.arrays[Self::slot(c, part)] = Some(vec![value; self.ntot]);
        self
    }

    /// Remove an array.
    pub fn remove(&mut self, c: Component, part: ComplexPart) -> Option<Vec<f64>> {
        self.arrays[Self::slot(c, part)].take()
    }

    /// Borrow an array.
    pub fn get(&self, c: Component, part: ComplexPart) -> Option<&[f64]> {
        self.arrays[Self::slot(c, part)].as_deref()
    }

    /// Mutably borrow an array.
    pub fn get_mut(&mut self, c: Component, part: ComplexPart) -> Option<&mut [f64]> {
        self.arrays[Self::slot(c, part)].as_deref_mut()
    }

    /// Whether an array is present.
    pub fn contains(&self, c: Component, part: ComplexPart) -> bool {
        self.arrays[Self::slot(c, part)].is_some()
    }
}

/// Spatial saturation profiles `sigma[c][d]`.
///
/// The diagonal entry `sigma[c][direction(c)]` scales how strongly component
/// `c` drives the medium. Off-diagonal entries describe anisotropic coupling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SigmaTable {
    profiles: Vec<Option<Vec<f64>>>,
}

impl SigmaTable {
    /// Create an empty (everywhere trivial) table.
    pub fn new() -> Self {
        Self {
            profiles: vec![None; NUM_COMPONENTS * 3],
        }
    }

    fn slot(c: Component, d: Direction) -> usize {
        c.index() * 3 + d.index()
    }

    /// Set a profile.
    pub fn set(&mut self, c: Component, d: Direction, profile: Vec<f64>) {
        if self.profiles.is_empty() {
            self.profiles = vec![None; NUM_COMPONENTS * 3];
        }
        self.profiles[Self::slot(c, d)] = Some(profile);
    }

    /// Set the diagonal profile of `c` to a constant over `ntot` points.
    pub fn with_uniform_diagonal(mut self, c: Component, ntot: usize, value: f64) -> Self {
        self.set(c, c.direction(), vec![value; ntot]);
        self
    }

    /// Borrow a profile.
    pub fn get(&self, c: Component, d: Direction) -> Option<&[f64]> {
        self.profiles.get(Self::slot(c, d)).and_then(|p| p.as_deref())
    }

    /// Whether any direction of `c` carries a profile.
    pub fn is_nontrivial(&self, c: Component) -> bool {
        Direction::ALL.iter().any(|&d| self.get(c, d).is_some())
    }

    /// Check every profile against the grid size.
    pub fn validate(&self, ntot: usize) -> Result<()> {
        for c in Component::ALL {
            for d in Direction::ALL {
                if let Some(p) = self.get(c, d) {
                    if p.len() != ntot {
                        return Err(MultilevelError::dimension_mismatch(
                            format!("sigma[{}][{}]", c, d),
                            ntot,
                            p.len(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_set_sparse() {
        let mut w = FieldSet::new(8).with_zeros(Component::Ex, ComplexPart::Re);
        assert!(w.contains(Component::Ex, ComplexPart::Re));
        assert!(w.get(Component::Ex, ComplexPart::Im).is_none());
        w.get_mut(Component::Ex, ComplexPart::Re).unwrap()[3] = 2.0;
        assert_eq!(w.get(Component::Ex, ComplexPart::Re).unwrap()[3], 2.0);
    }

    #[test]
    fn test_field_set_length_checked() {
        let mut w = FieldSet::new(8);
        assert!(w.insert(Component::Ey, ComplexPart::Re, vec![0.0; 7]).is_err());
    }

    #[test]
    fn test_sigma_table() {
        let sigma = SigmaTable::new().with_uniform_diagonal(Component::Ez, 4, 1.0);
        assert!(sigma.is_nontrivial(Component::Ez));
        assert!(!sigma.is_nontrivial(Component::Ex));
        assert!(sigma.get(Component::Ez, Direction::Z).is_some());
        assert!(sigma.validate(4).is_ok());
        assert!(sigma.validate(5).is_err());
        // Default table is usable too
        assert!(SigmaTable::default().get(Component::Ex, Direction::X).is_none());
    }
}

//! Arena layout for the per-point state of a multilevel medium.
//!
//! All mutable state of one medium on one grid lives in a single flat
//! `Vec<f64>`, sliced as:
//!
//! ```text
//! | GammaInv (L*L) | P blocks | Ntmp (L) | N (ntot*L) | V blocks |
//! ```
//!
//! - P blocks: for every polarized (component, part), for every transition,
//!   `2*ntot` values: the current polarization then the previous one.
//! - N: populations, `N[i*L + level]`; Ntmp is the serial sweep's scratch.
//! - V blocks (extended media only): for each part, for each non-radiative
//!   transition, `2*ntot` values: current then previous coherence.
//!
//! The layout is a pure function of [`ArenaShape`], so any copy of the
//! arena re-derives identical offsets from the shape alone.

use std::ops::Range;

use log::debug;

use crate::grid::{ComplexPart, Component};

/// Everything the arena layout depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaShape {
    /// Grid points per array
    pub ntot: usize,
    /// Atomic levels L
    pub levels: usize,
    /// Radiative transitions T
    pub transitions: usize,
    /// Non-radiative transitions C (0 for radiative-only media)
    pub coherences: usize,
    /// (component, part) pairs that carry polarization storage, in table order
    pub polarized: Vec<(Component, ComplexPart)>,
}

/// Offset of one polarized (component, part) group of transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PolarizationBlock {
    component: Component,
    part: ComplexPart,
    offset: usize,
}

/// Block offsets inside the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaLayout {
    shape: ArenaShape,
    polarization: Vec<PolarizationBlock>,
    scratch: usize,
    population: usize,
    coherence: usize,
    total: usize,
}

impl ArenaLayout {
    /// Derive the layout of an arena.
    pub fn new(mut shape: ArenaShape) -> Self {
        shape.polarized.sort();
        shape.polarized.dedup();

        let ArenaShape {
            ntot,
            levels,
            transitions,
            coherences,
            ..
        } = shape;

        let mut offset = levels * levels;
        let polarization = shape
            .polarized
            .iter()
            .map(|&(component, part)| {
                let block = PolarizationBlock {
                    component,
                    part,
                    offset,
                };
                offset += 2 * ntot * transitions;
                block
            })
            .collect();

        let scratch = offset;
        let population = scratch + levels;
        let coherence = population + ntot * levels;
        let total = coherence + 2 * coherences * 2 * ntot;

        Self {
            shape,
            polarization,
            scratch,
            population,
            coherence,
            total,
        }
    }

    /// The shape this layout was derived from.
    pub fn shape(&self) -> &ArenaShape {
        &self.shape
    }

    /// Total arena length in reals.
    pub fn total_len(&self) -> usize {
        self.total
    }

    pub fn ntot(&self) -> usize {
        self.shape.ntot
    }

    pub fn levels(&self) -> usize {
        self.shape.levels
    }

    pub fn transitions(&self) -> usize {
        self.shape.transitions
    }

    pub fn coherences(&self) -> usize {
        self.shape.coherences
    }

    /// Polarized (component, part) pairs in storage order.
    pub fn polarized(&self) -> impl Iterator<Item = (Component, ComplexPart)> + '_ {
        self.polarization.iter().map(|b| (b.component, b.part))
    }

    /// Whether (component, part) carries polarization storage.
    pub fn has_polarization(&self, c: Component, part: ComplexPart) -> bool {
        self.block(c, part).is_some()
    }

    fn block(&self, c: Component, part: ComplexPart) -> Option<usize> {
        self.polarization
            .iter()
            .find(|b| b.component == c && b.part == part)
            .map(|b| b.offset)
    }

    /// The inverse relaxation matrix.
    pub fn gamma_inv(&self) -> Range<usize> {
        0..self.shape.levels * self.shape.levels
    }

    /// Current and previous polarization of transition `t`, back to back.
    pub fn polarization_pair(&self, c: Component, part: ComplexPart, t: usize) -> Option<Range<usize>> {
        if t >= self.shape.transitions {
            return None;
        }
        let ntot = self.shape.ntot;
        self.block(c, part).map(|base| {
            let start = base + 2 * ntot * t;
            start..start + 2 * ntot
        })
    }

    /// Current polarization of transition `t`.
    pub fn polarization(&self, c: Component, part: ComplexPart, t: usize) -> Option<Range<usize>> {
        let ntot = self.shape.ntot;
        self.polarization_pair(c, part, t).map(|r| r.start..r.start + ntot)
    }

    /// Previous polarization of transition `t`.
    pub fn polarization_previous(&self, c: Component, part: ComplexPart, t: usize) -> Option<Range<usize>> {
        let ntot = self.shape.ntot;
        self.polarization_pair(c, part, t).map(|r| r.start + ntot..r.end)
    }

    /// The serial population-update scratch vector.
    pub fn scratch(&self) -> Range<usize> {
        self.scratch..self.population
    }

    /// Populations of every point.
    pub fn populations(&self) -> Range<usize> {
        self.population..self.coherence
    }

    /// Start of the population block (also the end of everything the
    /// polarization sweep writes).
    pub fn scratch_offset(&self) -> usize {
        self.scratch
    }

    /// Current and previous coherence of non-radiative transition `cr`.
    pub fn coherence_pair(&self, part: ComplexPart, cr: usize) -> Option<Range<usize>> {
        let c = self.shape.coherences;
        if cr >= c {
            return None;
        }
        let ntot = self.shape.ntot;
        let start = self.coherence + (part.index() * c + cr) * 2 * ntot;
        Some(start..start + 2 * ntot)
    }
}

/// Owned per-point state of one medium on one grid.
#[derive(Debug)]
pub struct MultilevelData {
    layout: ArenaLayout,
    data: Vec<f64>,
    /// Timestep `GammaInv` was computed for
    dt: Option<f64>,
}

impl MultilevelData {
    /// Allocate a zeroed arena.
    pub fn new(shape: ArenaShape) -> Self {
        let layout = ArenaLayout::new(shape);
        debug!(
            "multilevel arena: {} reals ({} points, {} levels, {} transitions, {} coherences, {} polarized)",
            layout.total_len(),
            layout.ntot(),
            layout.levels(),
            layout.transitions(),
            layout.coherences(),
            layout.polarization.len()
        );
        let data = vec![0.0; layout.total_len()];
        Self {
            layout,
            data,
            dt: None,
        }
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    /// The raw arena.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Zero the whole arena and forget the cached timestep.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
        self.dt = None;
    }

    /// Timestep the cached `GammaInv` belongs to.
    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    pub(crate) fn set_dt(&mut self, dt: f64) {
        self.dt = Some(dt);
    }

    /// inv(I + Gamma*dt/2), row-major.
    pub fn gamma_inv(&self) -> &[f64] {
        &self.data[self.layout.gamma_inv()]
    }

    pub(crate) fn gamma_inv_mut(&mut self) -> &mut [f64] {
        let range = self.layout.gamma_inv();
        &mut self.data[range]
    }

    /// All populations, `N[i*L + level]`.
    pub fn populations(&self) -> &[f64] {
        &self.data[self.layout.populations()]
    }

    pub(crate) fn populations_mut(&mut self) -> &mut [f64] {
        let range = self.layout.populations();
        &mut self.data[range]
    }

    /// Populations at grid point `i`.
    pub fn population(&self, i: usize) -> &[f64] {
        let l = self.layout.levels();
        &self.populations()[i * l..(i + 1) * l]
    }

    /// Current polarization of transition `t` for (component, part).
    pub fn polarization(&self, c: Component, part: ComplexPart, t: usize) -> Option<&[f64]> {
        self.layout.polarization(c, part, t).map(|r| &self.data[r])
    }

    /// Previous polarization of transition `t` for (component, part).
    pub fn polarization_previous(&self, c: Component, part: ComplexPart, t: usize) -> Option<&[f64]> {
        self.layout.polarization_previous(c, part, t).map(|r| &self.data[r])
    }

    /// Mutable current polarization (host seeding and ghost exchange).
    pub fn polarization_mut(&mut self, c: Component, part: ComplexPart, t: usize) -> Option<&mut [f64]> {
        let range = self.layout.polarization(c, part, t)?;
        Some(&mut self.data[range])
    }

    /// Mutable (current, previous) polarization pair.
    pub fn polarization_pair_mut(
        &mut self,
        c: Component,
        part: ComplexPart,
        t: usize,
    ) -> Option<(&mut [f64], &mut [f64])> {
        let ntot = self.layout.ntot();
        let range = self.layout.polarization_pair(c, part, t)?;
        Some(self.data[range].split_at_mut(ntot))
    }

    /// Current coherence of non-radiative transition `cr`.
    pub fn coherence(&self, part: ComplexPart, cr: usize) -> Option<&[f64]> {
        let ntot = self.layout.ntot();
        self.layout
            .coherence_pair(part, cr)
            .map(|r| &self.data[r.start..r.start + ntot])
    }

    /// Previous coherence of non-radiative transition `cr`.
    pub fn coherence_previous(&self, part: ComplexPart, cr: usize) -> Option<&[f64]> {
        let ntot = self.layout.ntot();
        self.layout
            .coherence_pair(part, cr)
            .map(|r| &self.data[r.start + ntot..r.end])
    }

    /// Mutable (current, previous) coherence pair.
    pub fn coherence_pair_mut(&mut self, part: ComplexPart, cr: usize) -> Option<(&mut [f64], &mut [f64])> {
        let ntot = self.layout.ntot();
        let range = self.layout.coherence_pair(part, cr)?;
        Some(self.data[range].split_at_mut(ntot))
    }
}

impl Clone for MultilevelData {
    /// Deep copy. Offsets are re-derived from the shape, never copied.
    fn clone(&self) -> Self {
        let layout = ArenaLayout::new(self.layout.shape().clone());
        debug_assert_eq!(layout, self.layout);
        Self {
            layout,
            data: self.data.clone(),
            dt: self.dt,
        }
    }
}

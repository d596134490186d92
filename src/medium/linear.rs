//! Radiative-only multilevel medium.
//!
//! Each timestep runs two full-grid phases:
//!
//! 1. Populations: a trapezoidal step in the relaxation operator plus an
//!    explicit field-driven term, `N_new = GammaInv * ((I - Gamma*dt/2) N + alpha * drive)`,
//!    where the drive of transition `t` is `E.dP/32 + pi*gamma_t*dt * E.P/64` built from
//!    the 8-point (4 corners x 2 timesteps) field stencil around the cell center.
//! 2. Polarizations: every transition is a damped, driven oscillator on the
//!    Yee location of its component, driven by the just-updated population
//!    inversion averaged over the 4 surrounding cell centers.

use std::f64::consts::PI;

use log::{debug, trace, warn};

use crate::config::UpdateConfig;
use crate::error::{MultilevelError, Result};
use crate::grid::{shifted, ComplexPart, Component, FieldSet, FieldType, GridVolume, Sampling, SigmaTable};
use crate::solver::invert_with_tolerance;

use super::layout::{ArenaShape, MultilevelData};
use super::sweep::{corner_sum, for_each_chunk, for_each_pair};
use super::transitions::{CouplingMatrix, RadiativeTransition};
use super::Susceptibility;

/// At most one polarized field direction per spatial axis.
pub const MAX_POLARIZED_DIRECTIONS: usize = 3;

/// A polarized field direction entering the E.P dot product.
#[derive(Debug, Clone, Copy)]
struct DotComponent {
    component: Component,
    /// yee2cent offsets of the component
    o1: isize,
    o2: isize,
}

/// Borrowed arrays of one polarized direction for the population sweep.
struct DotTerms<'a> {
    o1: isize,
    o2: isize,
    /// (current, previous) field per part
    field: [Option<(&'a [f64], &'a [f64])>; 2],
    /// (current, previous) polarization per part, per transition
    polarization: [Option<Vec<(&'a [f64], &'a [f64])>>; 2],
}

/// Everything the per-point population update reads.
struct PopulationSweep<'a> {
    levels: usize,
    dt: f64,
    gamma: &'a [f64],
    gamma_inv: &'a [f64],
    alpha: &'a CouplingMatrix,
    transitions: &'a [RadiativeTransition],
    dots: Vec<DotTerms<'a>>,
}

impl PopulationSweep<'_> {
    /// Advance the populations `n` of cell center `i`, using `ntmp` as scratch.
    fn relax_point(&self, i: usize, n: &mut [f64], ntmp: &mut [f64]) {
        let l = self.levels;
        let dt2 = 0.5 * self.dt;

        // Ntmp = (I - Gamma * dt/2) * N
        for l1 in 0..l {
            ntmp[l1] = 0.0;
            for l2 in 0..l {
                let identity = if l1 == l2 { 1.0 } else { 0.0 };
                ntmp[l1] += (identity - self.gamma[l1 * l + l2] * dt2) * n[l2];
            }
        }

        // 8 * E at the cell center, per direction and part
        let mut e8 = [[0.0f64; 2]; MAX_POLARIZED_DIRECTIONS];
        for (idot, dot) in self.dots.iter().enumerate() {
            for part in ComplexPart::ALL {
                if let Some((w, wp)) = dot.field[part.index()] {
                    e8[idot][part.index()] = corner_sum(w, i, dot.o1, dot.o2) + corner_sum(wp, i, dot.o1, dot.o2);
                }
            }
        }

        // Ntmp += alpha * (E.dP/32 + gperp*dt * E.P/64)
        for (t, transition) in self.transitions.iter().enumerate() {
            let gperpdt = transition.linewidth * PI * self.dt;
            let mut edp32 = 0.0;
            let mut epave64 = 0.0;
            for (idot, dot) in self.dots.iter().enumerate() {
                for part in ComplexPart::ALL {
                    if let Some(pol) = &dot.polarization[part.index()] {
                        let (p, pp) = pol[t];
                        let cur = corner_sum(p, i, dot.o1, dot.o2);
                        let prev = corner_sum(pp, i, dot.o1, dot.o2);
                        edp32 += (cur - prev) * e8[idot][part.index()];
                        epave64 += (cur + prev) * e8[idot][part.index()];
                    }
                }
            }
            edp32 *= 0.03125;
            // 1/64: the extra 1/2 averages current and previous P
            epave64 *= 0.015625;

            let drive = edp32 + gperpdt * epave64;
            for (level, slot) in ntmp.iter_mut().enumerate().take(l) {
                *slot += self.alpha.get(level, t) * drive;
            }
        }

        // N = GammaInv * Ntmp
        for l1 in 0..l {
            n[l1] = 0.0;
            for l2 in 0..l {
                n[l1] += self.gamma_inv[l1 * l + l2] * ntmp[l2];
            }
        }
    }
}

/// Discretized oscillator coefficients of one radiative transition.
#[derive(Debug, Clone, Copy)]
struct OscillatorCoefficients {
    /// dt^2 * ((2 pi omega)^2 + (pi gamma)^2)
    omega0dtsqr: f64,
    /// 1 / (1 + pi gamma dt)
    gamma1inv: f64,
    /// 1 - pi gamma dt
    gamma1: f64,
    dtsqr: f64,
}

impl OscillatorCoefficients {
    fn new(transition: &RadiativeTransition, dt: f64) -> Self {
        let omega2pi = 2.0 * PI * transition.frequency;
        let gperp = PI * transition.linewidth;
        let dtsqr = dt * dt;
        Self {
            omega0dtsqr: (omega2pi * omega2pi + gperp * gperp) * dtsqr,
            gamma1inv: 1.0 / (1.0 + gperp * dt),
            gamma1: 1.0 - gperp * dt,
            dtsqr,
        }
    }

    #[inline]
    fn step(&self, pcur: f64, pprev: f64, drive: f64) -> f64 {
        self.gamma1inv * (pcur * (2.0 - self.omega0dtsqr) - self.gamma1 * pprev - self.dtsqr * drive)
    }
}

/// Multilevel atomic medium with radiative transitions only.
#[derive(Debug, Clone)]
pub struct MultilevelSusceptibility {
    /// Number of levels L
    levels: usize,
    /// L x L relaxation-rate matrix, row-major
    gamma: Vec<f64>,
    /// Initial populations
    n0: Vec<f64>,
    /// L x T coupling matrix
    alpha: CouplingMatrix,
    transitions: Vec<RadiativeTransition>,
    /// Spatial saturation profiles
    sigma: SigmaTable,
    config: UpdateConfig,
}

impl MultilevelSusceptibility {
    /// Create a medium from its relaxation matrix, initial populations and
    /// radiative transitions (`alpha` column `t` describes `transitions[t]`).
    pub fn new(
        gamma: Vec<f64>,
        n0: Vec<f64>,
        alpha: CouplingMatrix,
        transitions: Vec<RadiativeTransition>,
    ) -> Result<Self> {
        let levels = n0.len();
        if levels == 0 {
            return Err(MultilevelError::invalid_parameter("N0", "at least one level is required"));
        }
        if gamma.len() != levels * levels {
            return Err(MultilevelError::dimension_mismatch("Gamma", levels * levels, gamma.len()));
        }
        if alpha.levels() != levels {
            return Err(MultilevelError::dimension_mismatch("alpha rows", levels, alpha.levels()));
        }
        if alpha.columns() != transitions.len() {
            return Err(MultilevelError::dimension_mismatch(
                "alpha columns",
                transitions.len(),
                alpha.columns(),
            ));
        }
        alpha.validate()?;

        for (t, transition) in transitions.iter().enumerate() {
            if !transition.frequency.is_finite() || !(transition.linewidth >= 0.0) {
                return Err(MultilevelError::invalid_parameter(
                    format!("transition {}", t),
                    "frequency must be finite and linewidth non-negative",
                ));
            }
        }

        Ok(Self {
            levels,
            gamma,
            n0,
            alpha,
            transitions,
            sigma: SigmaTable::new(),
            config: UpdateConfig::default(),
        })
    }

    /// Attach saturation profiles.
    pub fn with_sigma(mut self, sigma: SigmaTable) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the update configuration.
    pub fn with_config(mut self, config: UpdateConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the saturation profiles.
    pub fn set_sigma(&mut self, sigma: SigmaTable) {
        self.sigma = sigma;
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn gamma(&self) -> &[f64] {
        &self.gamma
    }

    pub fn n0(&self) -> &[f64] {
        &self.n0
    }

    pub fn alpha(&self) -> &CouplingMatrix {
        &self.alpha
    }

    pub fn transitions(&self) -> &[RadiativeTransition] {
        &self.transitions
    }

    pub fn sigma(&self) -> &SigmaTable {
        &self.sigma
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Whether (component, part) needs polarization storage for these fields.
    pub fn needs_polarization(&self, c: Component, part: ComplexPart, fields: &FieldSet) -> bool {
        matches!(c.field_type(), FieldType::E | FieldType::H)
            && fields.contains(c, part)
            && self.sigma.is_nontrivial(c)
    }

    /// Arena shape for a grid, with `coherences` non-radiative transitions.
    pub(crate) fn arena_shape(&self, fields: &FieldSet, gv: &GridVolume, coherences: usize) -> Result<ArenaShape> {
        let ntot = gv.ntot();
        if fields.ntot() != ntot {
            return Err(MultilevelError::dimension_mismatch("field arrays", ntot, fields.ntot()));
        }
        self.sigma.validate(ntot)?;

        let polarized = Component::ALL
            .iter()
            .flat_map(|&c| ComplexPart::ALL.iter().map(move |&part| (c, part)))
            .filter(|&(c, part)| gv.dim().has_component(c) && self.needs_polarization(c, part, fields))
            .collect();

        Ok(ArenaShape {
            ntot,
            levels: self.levels,
            transitions: self.transitions.len(),
            coherences,
            polarized,
        })
    }

    /// Check that an arena belongs to this medium and grid.
    pub(crate) fn check_data(&self, gv: &GridVolume, data: &MultilevelData) -> Result<()> {
        let layout = data.layout();
        if layout.ntot() != gv.ntot() {
            return Err(MultilevelError::dimension_mismatch("arena grid points", gv.ntot(), layout.ntot()));
        }
        if layout.levels() != self.levels {
            return Err(MultilevelError::dimension_mismatch("arena levels", self.levels, layout.levels()));
        }
        if layout.transitions() != self.transitions.len() {
            return Err(MultilevelError::dimension_mismatch(
                "arena transitions",
                self.transitions.len(),
                layout.transitions(),
            ));
        }
        Ok(())
    }

    /// Recompute inv(I + Gamma*dt/2) unless it is cached for this `dt`.
    pub(crate) fn refresh_gamma_inv(&self, dt: f64, data: &mut MultilevelData) -> Result<()> {
        if data.dt() == Some(dt) {
            return Ok(());
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(MultilevelError::invalid_parameter("dt", format!("must be positive, got {}", dt)));
        }

        let l = self.levels;
        let mut m = vec![0.0; l * l];
        for i in 0..l {
            for j in 0..l {
                let identity = if i == j { 1.0 } else { 0.0 };
                m[i * l + j] = identity + self.gamma[i * l + j] * dt / 2.0;
            }
        }
        match invert_with_tolerance(&mut m, l, self.config.pivot_tolerance) {
            Ok(()) => {}
            Err(MultilevelError::SingularMatrix) => return Err(MultilevelError::SingularRelaxation { dt }),
            Err(e) => return Err(e),
        }

        data.gamma_inv_mut().copy_from_slice(&m);
        data.set_dt(dt);
        debug!("multilevel: GammaInv computed for dt = {:.6e}", dt);
        Ok(())
    }

    /// Zero the arena, compute `GammaInv` and broadcast `N0`.
    pub(crate) fn initialize(&self, dt: f64, gv: &GridVolume, data: &mut MultilevelData) -> Result<()> {
        self.check_data(gv, data)?;
        data.reset();
        self.refresh_gamma_inv(dt, data)?;

        let l = self.levels;
        for n in data.populations_mut().chunks_mut(l) {
            n.copy_from_slice(&self.n0);
        }
        debug!(
            "multilevel: initialized {} points with N0 = {:?}",
            gv.ntot(),
            self.n0
        );
        Ok(())
    }

    /// Polarized directions (real part present), with their yee2cent offsets.
    fn polarized_directions(&self, gv: &GridVolume, data: &MultilevelData) -> Result<Vec<DotComponent>> {
        let mut dots = Vec::with_capacity(MAX_POLARIZED_DIRECTIONS);
        for c in Component::ALL {
            if data.layout().has_polarization(c, ComplexPart::Re) {
                if dots.len() == MAX_POLARIZED_DIRECTIONS {
                    return Err(MultilevelError::invariant(format!(
                        "more than {} field directions carry polarization",
                        MAX_POLARIZED_DIRECTIONS
                    )));
                }
                let (o1, o2) = gv.yee2cent_offsets(c);
                dots.push(DotComponent { component: c, o1, o2 });
            }
        }
        Ok(dots)
    }

    /// Validate the inputs of one timestep before any state is touched.
    pub(crate) fn check_step(
        &self,
        w: &FieldSet,
        w_prev: &FieldSet,
        gv: &GridVolume,
        data: &MultilevelData,
    ) -> Result<()> {
        self.check_data(gv, data)?;
        let ntot = gv.ntot();
        if w.ntot() != ntot {
            return Err(MultilevelError::dimension_mismatch("current field arrays", ntot, w.ntot()));
        }
        if w_prev.ntot() != ntot {
            return Err(MultilevelError::dimension_mismatch("previous field arrays", ntot, w_prev.ntot()));
        }
        self.sigma.validate(ntot)?;
        self.check_isotropic(w, gv, data)?;
        self.polarized_directions(gv, data)?;
        Ok(())
    }

    /// Reject off-diagonal saturation profiles on polarized components.
    fn check_isotropic(&self, w: &FieldSet, gv: &GridVolume, data: &MultilevelData) -> Result<()> {
        for (c, part) in data.layout().polarized() {
            let d = c.direction();
            for &d1 in gv.dim().directions() {
                if d1 == d {
                    continue;
                }
                let c1 = c.with_direction(d1);
                if w.contains(c1, part) && self.sigma.get(c, d1).is_some() {
                    return Err(MultilevelError::UnsupportedAnisotropicGain { component: c });
                }
            }
        }
        Ok(())
    }

    /// Phase 1: advance the populations at every owned cell center.
    pub(crate) fn update_populations(
        &self,
        w: &FieldSet,
        w_prev: &FieldSet,
        dt: f64,
        gv: &GridVolume,
        data: &mut MultilevelData,
    ) -> Result<()> {
        let dots = self.polarized_directions(gv, data)?;
        let layout = data.layout().clone();
        let l = self.levels;
        let ntot = layout.ntot();
        let parallel = self.config.use_parallel(ntot);

        let (head, tail) = data.as_mut_slice().split_at_mut(layout.scratch_offset());
        let head: &[f64] = head;
        let (scratch, rest) = tail.split_at_mut(l);
        let populations = &mut rest[..ntot * l];

        let dots = dots
            .iter()
            .map(|dot| {
                let c = dot.component;
                let field = ComplexPart::ALL.map(|part| match (w.get(c, part), w_prev.get(c, part)) {
                    (Some(cur), Some(prev)) => Some((cur, prev)),
                    _ => None,
                });
                let polarization = ComplexPart::ALL.map(|part| {
                    (0..self.transitions.len())
                        .map(|t| {
                            let cur = layout.polarization(c, part, t)?;
                            let prev = layout.polarization_previous(c, part, t)?;
                            Some((&head[cur], &head[prev]))
                        })
                        .collect::<Option<Vec<_>>>()
                });
                DotTerms {
                    o1: dot.o1,
                    o2: dot.o2,
                    field,
                    polarization,
                }
            })
            .collect();

        let sweep = PopulationSweep {
            levels: l,
            dt,
            gamma: &self.gamma,
            gamma_inv: &head[layout.gamma_inv()],
            alpha: &self.alpha,
            transitions: &self.transitions,
            dots,
        };

        for_each_chunk(populations, l, scratch, parallel, |i, n, ntmp| {
            if gv.is_owned(Sampling::Centered, i) {
                sweep.relax_point(i, n, ntmp);
            }
        });
        Ok(())
    }

    /// Phase 3 (phase 2 for radiative-only media): advance every polarization.
    pub(crate) fn update_polarizations(
        &self,
        w: &FieldSet,
        dt: f64,
        gv: &GridVolume,
        data: &mut MultilevelData,
    ) -> Result<()> {
        let layout = data.layout().clone();
        let l = self.levels;
        let ntot = layout.ntot();
        let parallel = self.config.use_parallel(ntot);
        let polarized: Vec<_> = layout.polarized().collect();

        for (t, transition) in self.transitions.iter().enumerate() {
            let coefficients = OscillatorCoefficients::new(transition, dt);
            let (lp, lm) = self.alpha.endpoints(t)?;

            for &(c, part) in &polarized {
                let Some(wc) = w.get(c, part) else {
                    continue;
                };
                let d = c.direction();
                let Some(s) = self.sigma.get(c, d) else {
                    warn!("multilevel: {} is polarized but has no diagonal saturation profile, skipped", c);
                    continue;
                };
                let st = transition.cross_section(d);

                let (o1, o2) = gv.cent2yee_offsets(c);
                let (o1, o2) = (o1 * l as isize, o2 * l as isize);

                let pair = layout
                    .polarization_pair(c, part, t)
                    .ok_or_else(|| MultilevelError::invariant(format!("missing polarization block for {}", c)))?;
                let (head, tail) = data.as_mut_slice().split_at_mut(layout.scratch_offset());
                let n: &[f64] = &tail[l..l + ntot * l];
                let (p, pp) = head[pair].split_at_mut(ntot);

                for_each_pair(p, pp, parallel, |i, pcur, pprev| {
                    if !gv.is_owned(Sampling::Edge(c), i) {
                        return;
                    }
                    let up = i * l + lp;
                    let down = i * l + lm;
                    // population inversion averaged onto the Yee point
                    let dn = 0.25
                        * (n[up] + n[shifted(up, o1)] + n[shifted(up, o2)] + n[shifted(up, o1 + o2)]
                            - n[down]
                            - n[shifted(down, o1)]
                            - n[shifted(down, o2)]
                            - n[shifted(down, o1 + o2)]);
                    let current = *pcur;
                    *pcur = coefficients.step(current, *pprev, st * s[i] * wc[i] * dn);
                    *pprev = current;
                });
            }
        }
        Ok(())
    }

    /// Subtract every transition's polarization from the flux partner field.
    pub(crate) fn subtract_polarization(&self, ft: FieldType, f_minus_p: &mut FieldSet, data: &MultilevelData) {
        let partner = ft.flux_partner();
        let polarized: Vec<_> = data.layout().polarized().collect();
        for t in 0..self.transitions.len() {
            for &(ec, part) in &polarized {
                if ec.field_type() != ft {
                    continue;
                }
                let dc = ec.with_field_type(partner);
                if let (Some(p), Some(fmp)) = (data.polarization(ec, part, t), f_minus_p.get_mut(dc, part)) {
                    for (f, p) in fmp.iter_mut().zip(p) {
                        *f -= p;
                    }
                }
            }
        }
    }
}

impl Susceptibility for MultilevelSusceptibility {
    type Data = MultilevelData;

    fn name(&self) -> &str {
        "multilevel"
    }

    fn needs_p(&self, c: Component, part: ComplexPart, fields: &FieldSet) -> bool {
        self.needs_polarization(c, part, fields)
    }

    fn new_internal_data(&self, fields: &FieldSet, gv: &GridVolume) -> Result<MultilevelData> {
        Ok(MultilevelData::new(self.arena_shape(fields, gv, 0)?))
    }

    fn init_internal_data(&self, _fields: &FieldSet, dt: f64, gv: &GridVolume, data: &mut MultilevelData) -> Result<()> {
        self.initialize(dt, gv, data)
    }

    fn update_p(
        &self,
        w: &FieldSet,
        w_prev: &FieldSet,
        dt: f64,
        gv: &GridVolume,
        data: &mut MultilevelData,
    ) -> Result<()> {
        self.check_step(w, w_prev, gv, data)?;
        self.refresh_gamma_inv(dt, data)?;
        trace!("multilevel: update_p over {} points", gv.ntot());

        self.update_populations(w, w_prev, dt, gv, data)?;
        self.update_polarizations(w, dt, gv, data)
    }

    fn subtract_p(&self, ft: FieldType, f_minus_p: &mut FieldSet, data: &MultilevelData) {
        self.subtract_polarization(ft, f_minus_p, data);
    }

    fn num_cinternal_notowned_needed(&self, c: Component, data: &MultilevelData) -> usize {
        if data.layout().has_polarization(c, ComplexPart::Re) {
            self.transitions.len()
        } else {
            0
        }
    }

    fn cinternal_notowned_ptr<'a>(
        &self,
        index: usize,
        c: Component,
        part: ComplexPart,
        n: usize,
        data: &'a mut MultilevelData,
    ) -> Option<&'a mut [f64]> {
        data.polarization_mut(c, part, index)?.get_mut(n..)
    }
}

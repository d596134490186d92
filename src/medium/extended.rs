//! Multilevel medium with non-radiative coherence.
//!
//! On top of the radiative engine, every non-radiative transition carries a
//! complex coherence amplitude at each cell center. Between the population
//! and polarization phases the amplitudes take one explicit Euler step of
//! the Liouville equation: free decay and precession, plus commutator terms
//! through every intermediate level that a radiative transition links to
//! either end of the coherence.

use log::trace;

use crate::error::{MultilevelError, Result};
use crate::grid::{ComplexPart, Component, FieldSet, FieldType, GridVolume, Sampling};

use super::layout::MultilevelData;
use super::linear::MultilevelSusceptibility;
use super::sweep::{fill_points, for_each_pair};
use super::transitions::{CouplingMatrix, NonRadiativeTransition};
use super::Susceptibility;

/// Storage that connects a pair of levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRef {
    /// Coherence of a non-radiative transition
    NonRadiative(usize),
    /// Polarization of a radiative transition
    Radiative(usize),
}

/// One commutator term of a coherence's equation of motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouplingTerm {
    /// Radiative transition whose field interaction drives the term
    pub transition: usize,
    /// Storage read for the source amplitude
    pub source: TransitionRef,
    /// +1 for the former commutator term, -1 for the latter
    pub sign: f64,
}

/// A coupling term bound to concrete arrays for one sweep.
struct BoundTerm<'a> {
    /// Part of drho the term lands in
    target: usize,
    /// sign * (-i sign of the part) * cross-section * dt/2
    scale: f64,
    field: &'a [f64],
    profile: &'a [f64],
    current: &'a [f64],
    previous: &'a [f64],
}

/// Multilevel medium with radiative and non-radiative transitions.
#[derive(Debug, Clone)]
pub struct ExtendedMultilevelSusceptibility {
    base: MultilevelSusceptibility,
    /// L x C coupling matrix
    beta: CouplingMatrix,
    coherences: Vec<NonRadiativeTransition>,
}

impl ExtendedMultilevelSusceptibility {
    /// Extend a radiative medium with non-radiative transitions
    /// (`beta` column `cr` describes `coherences[cr]`).
    pub fn new(
        base: MultilevelSusceptibility,
        beta: CouplingMatrix,
        coherences: Vec<NonRadiativeTransition>,
    ) -> Result<Self> {
        if beta.levels() != base.levels() {
            return Err(MultilevelError::dimension_mismatch("beta rows", base.levels(), beta.levels()));
        }
        if beta.columns() != coherences.len() {
            return Err(MultilevelError::dimension_mismatch(
                "beta columns",
                coherences.len(),
                beta.columns(),
            ));
        }
        beta.validate()?;

        for (cr, coherence) in coherences.iter().enumerate() {
            if !(coherence.decoherence >= 0.0) || !coherence.frequency.is_finite() {
                return Err(MultilevelError::invalid_parameter(
                    format!("non-radiative transition {}", cr),
                    "decoherence must be non-negative and frequency finite",
                ));
            }
        }

        Ok(Self {
            base,
            beta,
            coherences,
        })
    }

    /// The radiative part of the medium.
    pub fn base(&self) -> &MultilevelSusceptibility {
        &self.base
    }

    pub fn beta(&self) -> &CouplingMatrix {
        &self.beta
    }

    pub fn coherences(&self) -> &[NonRadiativeTransition] {
        &self.coherences
    }

    /// The transition connecting two levels.
    ///
    /// Non-radiative transitions take priority over radiative ones when both
    /// connect the pair.
    pub fn lookup(&self, l1: usize, l2: usize) -> Result<TransitionRef> {
        if let Some(cr) = self.beta.find_connecting(l1, l2) {
            return Ok(TransitionRef::NonRadiative(cr));
        }
        if let Some(t) = self.base.alpha().find_connecting(l1, l2) {
            return Ok(TransitionRef::Radiative(t));
        }
        Err(MultilevelError::InconsistentTransitionTable {
            first: l1,
            second: l2,
        })
    }

    /// Commutator terms of non-radiative transition `cr`.
    ///
    /// For every intermediate level `lk` distinct from both ends `(lp, lm)`,
    /// a radiative transition linking `lp` and `lk` adds the `(lk, lm)`
    /// amplitude, and one linking `lk` and `lm` subtracts the `(lp, lk)`
    /// amplitude.
    pub fn coupling_plan(&self, cr: usize) -> Result<Vec<CouplingTerm>> {
        let (lp, lm) = self.beta.endpoints(cr)?;
        let alpha = self.base.alpha();
        let mut plan = Vec::new();

        for lk in (0..self.base.levels()).filter(|&lk| lk != lp && lk != lm) {
            for t in 0..alpha.columns() {
                if !alpha.couples(lk, t) {
                    continue;
                }
                if alpha.couples(lp, t) {
                    plan.push(CouplingTerm {
                        transition: t,
                        source: self.lookup(lk, lm)?,
                        sign: 1.0,
                    });
                }
                if alpha.couples(lm, t) {
                    plan.push(CouplingTerm {
                        transition: t,
                        source: self.lookup(lp, lk)?,
                        sign: -1.0,
                    });
                }
            }
        }
        Ok(plan)
    }

    /// Plans of every non-radiative transition.
    fn coupling_plans(&self) -> Result<Vec<Vec<CouplingTerm>>> {
        (0..self.coherences.len()).map(|cr| self.coupling_plan(cr)).collect()
    }

    /// Bind a plan to the arrays of this step.
    fn bind_terms<'a>(
        &'a self,
        plan: &[CouplingTerm],
        w: &'a FieldSet,
        dt: f64,
        data: &'a MultilevelData,
    ) -> Result<Vec<BoundTerm<'a>>> {
        let mut bound = Vec::new();
        for term in plan {
            let transition = &self.base.transitions()[term.transition];
            for (c, part) in data.layout().polarized() {
                let d = c.direction();
                let (Some(field), Some(profile)) = (w.get(c, part), self.base.sigma().get(c, d)) else {
                    continue;
                };
                let (current, previous) = match term.source {
                    TransitionRef::NonRadiative(k) => {
                        (data.coherence(part, k), data.coherence_previous(part, k))
                    }
                    TransitionRef::Radiative(t) => {
                        (data.polarization(c, part, t), data.polarization_previous(c, part, t))
                    }
                };
                let (Some(current), Some(previous)) = (current, previous) else {
                    return Err(MultilevelError::invariant(format!(
                        "missing storage for {:?} on {}",
                        term.source, c
                    )));
                };
                bound.push(BoundTerm {
                    target: part.conjugate().index(),
                    scale: term.sign * part.minus_i_sign() * transition.cross_section(d) * 0.5 * dt,
                    field,
                    profile,
                    current,
                    previous,
                });
            }
        }
        Ok(bound)
    }

    /// Phase 2: one Euler step of every coherence.
    pub(crate) fn update_coherences(
        &self,
        plans: &[Vec<CouplingTerm>],
        w: &FieldSet,
        dt: f64,
        gv: &GridVolume,
        data: &mut MultilevelData,
    ) -> Result<()> {
        let ntot = gv.ntot();
        let parallel = self.base.config().use_parallel(ntot);
        let mut drho = vec![[0.0f64; 2]; ntot];

        for (cr, (coherence, plan)) in self.coherences.iter().zip(plans).enumerate() {
            {
                let terms = self.bind_terms(plan, w, dt, data)?;
                let (Some(re), Some(im)) = (data.coherence(ComplexPart::Re, cr), data.coherence(ComplexPart::Im, cr))
                else {
                    return Err(MultilevelError::invariant(format!("missing coherence block {}", cr)));
                };
                let decay = coherence.decoherence * dt;
                let precession = coherence.frequency * dt;

                fill_points(&mut drho, parallel, |i, d| {
                    *d = [0.0; 2];
                    if !gv.is_owned(Sampling::Centered, i) {
                        return;
                    }
                    for (part, v) in [(ComplexPart::Re, re[i]), (ComplexPart::Im, im[i])] {
                        d[part.index()] -= decay * v;
                        d[part.conjugate().index()] += part.minus_i_sign() * precession * v;
                    }
                    for term in &terms {
                        d[term.target] +=
                            term.scale * term.profile[i] * term.field[i] * (term.current[i] + term.previous[i]);
                    }
                });
            }

            for part in ComplexPart::ALL {
                let (v, vp) = data
                    .coherence_pair_mut(part, cr)
                    .ok_or_else(|| MultilevelError::invariant(format!("missing coherence block {}", cr)))?;
                let drho = &drho;
                for_each_pair(v, vp, parallel, |i, v, vp| {
                    if gv.is_owned(Sampling::Centered, i) {
                        *vp = *v;
                        *v += drho[i][part.index()];
                    }
                });
            }
        }
        Ok(())
    }
}

impl Susceptibility for ExtendedMultilevelSusceptibility {
    type Data = MultilevelData;

    fn name(&self) -> &str {
        "multilevel-extended"
    }

    fn needs_p(&self, c: Component, part: ComplexPart, fields: &FieldSet) -> bool {
        self.base.needs_polarization(c, part, fields)
    }

    fn new_internal_data(&self, fields: &FieldSet, gv: &GridVolume) -> Result<MultilevelData> {
        Ok(MultilevelData::new(self.base.arena_shape(fields, gv, self.coherences.len())?))
    }

    fn init_internal_data(&self, _fields: &FieldSet, dt: f64, gv: &GridVolume, data: &mut MultilevelData) -> Result<()> {
        if data.layout().coherences() != self.coherences.len() {
            return Err(MultilevelError::dimension_mismatch(
                "arena coherences",
                self.coherences.len(),
                data.layout().coherences(),
            ));
        }
        self.base.initialize(dt, gv, data)
    }

    fn update_p(
        &self,
        w: &FieldSet,
        w_prev: &FieldSet,
        dt: f64,
        gv: &GridVolume,
        data: &mut MultilevelData,
    ) -> Result<()> {
        self.base.check_step(w, w_prev, gv, data)?;
        if data.layout().coherences() != self.coherences.len() {
            return Err(MultilevelError::dimension_mismatch(
                "arena coherences",
                self.coherences.len(),
                data.layout().coherences(),
            ));
        }
        let plans = self.coupling_plans()?;
        self.base.refresh_gamma_inv(dt, data)?;
        trace!(
            "multilevel-extended: update_p over {} points, {} coherences",
            gv.ntot(),
            self.coherences.len()
        );

        self.base.update_populations(w, w_prev, dt, gv, data)?;
        self.update_coherences(&plans, w, dt, gv, data)?;
        self.base.update_polarizations(w, dt, gv, data)
    }

    fn subtract_p(&self, ft: FieldType, f_minus_p: &mut FieldSet, data: &MultilevelData) {
        self.base.subtract_polarization(ft, f_minus_p, data);
    }

    fn num_cinternal_notowned_needed(&self, c: Component, data: &MultilevelData) -> usize {
        self.base.num_cinternal_notowned_needed(c, data)
    }

    fn cinternal_notowned_ptr<'a>(
        &self,
        index: usize,
        c: Component,
        part: ComplexPart,
        n: usize,
        data: &'a mut MultilevelData,
    ) -> Option<&'a mut [f64]> {
        self.base.cinternal_notowned_ptr(index, c, part, n, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateConfig;
    use crate::error::TransitionKind;
    use crate::grid::SigmaTable;
    use crate::medium::RadiativeTransition;
    use approx::assert_relative_eq;

    /// Lambda system: 0 and 1 both couple radiatively to 2, and share a coherence.
    fn lambda_medium(ntot: usize) -> ExtendedMultilevelSusceptibility {
        let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 3, &[(2, 0), (2, 1)]).unwrap();
        let base = MultilevelSusceptibility::new(
            vec![0.0; 9],
            vec![0.5, 0.3, 0.2],
            alpha,
            vec![
                RadiativeTransition::isotropic(1.0, 0.1, 1.0),
                RadiativeTransition::isotropic(1.2, 0.1, 1.0),
            ],
        )
        .unwrap()
        .with_sigma(SigmaTable::new().with_uniform_diagonal(Component::Ex, ntot, 1.0))
        .with_config(UpdateConfig::serial());
        let beta = CouplingMatrix::from_pairs(TransitionKind::NonRadiative, 3, &[(1, 0)]).unwrap();
        ExtendedMultilevelSusceptibility::new(base, beta, vec![NonRadiativeTransition::new(0.2, 0.5)]).unwrap()
    }

    #[test]
    fn test_lookup_prefers_non_radiative() {
        let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 2, &[(1, 0)]).unwrap();
        let base = MultilevelSusceptibility::new(
            vec![0.0; 4],
            vec![0.5, 0.5],
            alpha,
            vec![RadiativeTransition::isotropic(1.0, 0.1, 1.0)],
        )
        .unwrap();
        let beta = CouplingMatrix::from_pairs(TransitionKind::NonRadiative, 2, &[(1, 0)]).unwrap();
        let medium =
            ExtendedMultilevelSusceptibility::new(base, beta, vec![NonRadiativeTransition::new(0.1, 0.0)]).unwrap();
        assert_eq!(medium.lookup(0, 1).unwrap(), TransitionRef::NonRadiative(0));
    }

    #[test]
    fn test_coupling_plan_of_lambda_system() {
        let medium = lambda_medium(4);
        // coherence (1, 0) through level 2
        let plan = medium.coupling_plan(0).unwrap();
        assert_eq!(
            plan,
            vec![
                CouplingTerm {
                    transition: 0,
                    source: TransitionRef::Radiative(1),
                    sign: -1.0,
                },
                CouplingTerm {
                    transition: 1,
                    source: TransitionRef::Radiative(0),
                    sign: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_missing_link_is_inconsistent() {
        // Radiative 1 -> 0 and 3 -> 2; coherence 2 -> 0 needs (1, 2) through level 1
        let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 4, &[(1, 0), (3, 2)]).unwrap();
        let base = MultilevelSusceptibility::new(
            vec![0.0; 16],
            vec![0.25; 4],
            alpha,
            vec![
                RadiativeTransition::isotropic(1.0, 0.1, 1.0),
                RadiativeTransition::isotropic(1.0, 0.1, 1.0),
            ],
        )
        .unwrap();
        let beta = CouplingMatrix::from_pairs(TransitionKind::NonRadiative, 4, &[(2, 0)]).unwrap();
        let medium =
            ExtendedMultilevelSusceptibility::new(base, beta, vec![NonRadiativeTransition::new(0.1, 0.0)]).unwrap();
        let err = medium.coupling_plan(0).unwrap_err();
        assert!(matches!(
            err,
            MultilevelError::InconsistentTransitionTable { first: 1, second: 2 }
                | MultilevelError::InconsistentTransitionTable { first: 2, second: 1 }
        ));
    }

    #[test]
    fn test_beta_shape_checked() {
        let medium = lambda_medium(4);
        let beta = CouplingMatrix::from_pairs(TransitionKind::NonRadiative, 3, &[(1, 0)]).unwrap();
        assert!(ExtendedMultilevelSusceptibility::new(medium.base().clone(), beta, vec![]).is_err());
    }

    #[test]
    fn test_free_coherence_step() {
        let gv = GridVolume::one_d(4).unwrap();
        let medium = lambda_medium(gv.ntot());
        // no fields at all: pure decay and precession
        let w = FieldSet::new(gv.ntot());
        let mut data = medium.new_internal_data(&w, &gv).unwrap();
        medium.init_internal_data(&w, 0.1, &gv, &mut data).unwrap();
        data.coherence_pair_mut(ComplexPart::Re, 0).unwrap().0.fill(1.0);

        medium.update_p(&w, &w, 0.1, &gv, &mut data).unwrap();
        let i = gv.index(0, 0, 2);
        assert_relative_eq!(data.coherence(ComplexPart::Re, 0).unwrap()[i], 1.0 - 0.2 * 0.1, epsilon = 1e-12);
        assert_relative_eq!(data.coherence(ComplexPart::Im, 0).unwrap()[i], -0.5 * 0.1, epsilon = 1e-12);
        assert_relative_eq!(data.coherence_previous(ComplexPart::Re, 0).unwrap()[i], 1.0, epsilon = 1e-12);
        // the last point is not owned and keeps its value
        let last = gv.ntot() - 1;
        assert_eq!(data.coherence(ComplexPart::Re, 0).unwrap()[last], 1.0);
    }

    #[test]
    fn test_coherence_driven_through_intermediate_level() {
        let gv = GridVolume::one_d(4).unwrap();
        let ntot = gv.ntot();
        let (st0, st1) = (0.5, 2.0);
        let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 3, &[(2, 0), (2, 1)]).unwrap();
        let base = MultilevelSusceptibility::new(
            vec![0.0; 9],
            vec![0.5, 0.3, 0.2],
            alpha,
            vec![
                RadiativeTransition::isotropic(1.0, 0.1, st0),
                RadiativeTransition::isotropic(1.2, 0.1, st1),
            ],
        )
        .unwrap()
        .with_sigma(SigmaTable::new().with_uniform_diagonal(Component::Ex, ntot, 1.0))
        .with_config(UpdateConfig::serial());
        let beta = CouplingMatrix::from_pairs(TransitionKind::NonRadiative, 3, &[(1, 0)]).unwrap();
        let medium =
            ExtendedMultilevelSusceptibility::new(base, beta, vec![NonRadiativeTransition::new(0.2, 0.5)]).unwrap();

        let (e_re, e_im) = (0.4, -0.3);
        let w = FieldSet::new(ntot)
            .with_uniform(Component::Ex, ComplexPart::Re, e_re)
            .with_uniform(Component::Ex, ComplexPart::Im, e_im);
        let mut data = medium.new_internal_data(&w, &gv).unwrap();
        medium.init_internal_data(&w, 0.1, &gv, &mut data).unwrap();

        // Re part: P1 = (1.0, 0.6), P0 = (0.25, 0.25); Im part: P1 = (0.5, 0.7), P0 = 0
        let (a, b, c) = (1.0, 0.6, 0.25);
        let (a_im, b_im) = (0.5, 0.7);
        let (cur, prev) = data.polarization_pair_mut(Component::Ex, ComplexPart::Re, 1).unwrap();
        cur.fill(a);
        prev.fill(b);
        let (cur, prev) = data.polarization_pair_mut(Component::Ex, ComplexPart::Re, 0).unwrap();
        cur.fill(c);
        prev.fill(c);
        let (cur, prev) = data.polarization_pair_mut(Component::Ex, ComplexPart::Im, 1).unwrap();
        cur.fill(a_im);
        prev.fill(b_im);

        let dt = 0.1;
        medium.update_p(&w, &w, dt, &gv, &mut data).unwrap();

        // the coherence starts at zero, so only the commutator terms contribute
        let i = gv.index(0, 0, 2);
        let expected_im = 0.5 * dt * e_re * (st0 * (a + b) - st1 * 2.0 * c);
        let expected_re = -0.5 * dt * st0 * e_im * (a_im + b_im);
        assert_relative_eq!(data.coherence(ComplexPart::Im, 0).unwrap()[i], expected_im, epsilon = 1e-12);
        assert_relative_eq!(data.coherence(ComplexPart::Re, 0).unwrap()[i], expected_re, epsilon = 1e-12);
        assert_relative_eq!(expected_im, -0.004, epsilon = 1e-12);
        assert_relative_eq!(expected_re, 0.009, epsilon = 1e-12);
    }
}

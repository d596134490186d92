//! Multilevel atomic media.
//!
//! A medium is attached to a host field solver through the [`Susceptibility`]
//! trait. The host owns one [`MultilevelData`] arena per medium and grid,
//! hands the current and previous field snapshots to [`Susceptibility::update_p`]
//! once per timestep, and then calls [`Susceptibility::subtract_p`] to recover
//! E (or H) from D (or B).
//!
//! Two engines implement the trait:
//!
//! - [`MultilevelSusceptibility`]: populations and radiative polarizations.
//! - [`ExtendedMultilevelSusceptibility`]: adds non-radiative coherences.

mod extended;
mod layout;
mod linear;
mod sweep;
mod transitions;

pub use extended::{CouplingTerm, ExtendedMultilevelSusceptibility, TransitionRef};
pub use layout::{ArenaLayout, ArenaShape, MultilevelData};
pub use linear::{MultilevelSusceptibility, MAX_POLARIZED_DIRECTIONS};
pub use transitions::{CouplingMatrix, NonRadiativeTransition, RadiativeTransition};

use crate::error::Result;
use crate::grid::{ComplexPart, Component, FieldSet, FieldType, GridVolume};

/// Contract between a polarizable medium and the host field solver.
pub trait Susceptibility {
    /// Per-grid state owned by the host.
    type Data: Clone + Send;

    /// Short model name for diagnostics.
    fn name(&self) -> &str;

    /// Whether (component, part) needs polarization storage given the fields
    /// the host carries.
    fn needs_p(&self, c: Component, part: ComplexPart, fields: &FieldSet) -> bool;

    /// Allocate a zeroed arena for a grid.
    fn new_internal_data(&self, fields: &FieldSet, gv: &GridVolume) -> Result<Self::Data>;

    /// Reset the arena and load the initial state for timestep `dt`.
    fn init_internal_data(&self, fields: &FieldSet, dt: f64, gv: &GridVolume, data: &mut Self::Data) -> Result<()>;

    /// Advance the medium by one timestep.
    ///
    /// `w` and `w_prev` are the field at the current and previous steps.
    fn update_p(
        &self,
        w: &FieldSet,
        w_prev: &FieldSet,
        dt: f64,
        gv: &GridVolume,
        data: &mut Self::Data,
    ) -> Result<()>;

    /// Subtract the polarization of field type `ft` from its flux partner.
    fn subtract_p(&self, ft: FieldType, f_minus_p: &mut FieldSet, data: &Self::Data);

    /// Deep copy of an arena.
    fn copy_internal_data(&self, data: &Self::Data) -> Self::Data {
        data.clone()
    }

    /// Release an arena.
    fn delete_internal_data(&self, data: Self::Data) {
        drop(data);
    }

    /// Number of internal arrays of `c` the host must exchange across
    /// partition boundaries.
    fn num_cinternal_notowned_needed(&self, c: Component, data: &Self::Data) -> usize;

    /// Array `index` of `c`, starting at point `n`, for boundary exchange.
    fn cinternal_notowned_ptr<'a>(
        &self,
        index: usize,
        c: Component,
        part: ComplexPart,
        n: usize,
        data: &'a mut Self::Data,
    ) -> Option<&'a mut [f64]>;
}

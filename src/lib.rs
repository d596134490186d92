//! # Multilevel Core
//!
//! Multilevel atomic gain and absorption media for FDTD field solvers.
//!
//! At every grid point and timestep the core advances:
//! - the populations of an L-level atomic system,
//! - one damped, field-driven polarization oscillator per radiative transition,
//! - (extended media) a complex coherence per non-radiative transition.
//!
//! ## Architecture
//!
//! - [`grid`] - Yee-grid vocabulary shared with the host: components, grid volume, field tables
//! - [`solver`] - Dense LU inversion of the relaxation operator
//! - [`medium`] - Transition tables, the state arena and the update engines
//! - [`config`] - Update configuration (parallel sweeps, pivot tolerance)
//! - [`error`] - Error type
//!
//! ## Usage
//!
//! ```no_run
//! use multilevel_core::{
//!     ComplexPart, Component, CouplingMatrix, FieldSet, GridVolume, MultilevelSusceptibility,
//!     RadiativeTransition, SigmaTable, Susceptibility, TransitionKind,
//! };
//!
//! # fn main() -> multilevel_core::Result<()> {
//! let gv = GridVolume::one_d(200)?;
//! let alpha = CouplingMatrix::from_pairs(TransitionKind::Radiative, 2, &[(1, 0)])?;
//! let medium = MultilevelSusceptibility::new(
//!     vec![0.0, -0.01, 0.0, 0.01],
//!     vec![0.0, 1.0],
//!     alpha,
//!     vec![RadiativeTransition::isotropic(1.0, 0.05, 1e-3)],
//! )?
//! .with_sigma(SigmaTable::new().with_uniform_diagonal(Component::Ex, gv.ntot(), 1.0));
//!
//! let w = FieldSet::new(gv.ntot()).with_zeros(Component::Ex, ComplexPart::Re);
//! let mut data = medium.new_internal_data(&w, &gv)?;
//! medium.init_internal_data(&w, 0.05, &gv, &mut data)?;
//! medium.update_p(&w, &w, 0.05, &gv, &mut data)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Timestep
//!
//! Populations take a trapezoidal step in the relaxation operator, so
//! `GammaInv = inv(I + Gamma*dt/2)` is computed once per timestep size and
//! cached in the arena. Polarizations use the standard second-order
//! Lorentz-oscillator update, and coherences a single explicit Euler step.

pub mod config;
pub mod error;
pub mod grid;
pub mod medium;
pub mod solver;

// Re-export main types for convenience
pub use config::UpdateConfig;
pub use error::{MultilevelError, Result, TransitionKind};
pub use grid::{ComplexPart, Component, Dimensionality, Direction, FieldSet, FieldType, GridVolume, Sampling, SigmaTable};
pub use medium::{
    CouplingMatrix, ExtendedMultilevelSusceptibility, MultilevelData, MultilevelSusceptibility,
    NonRadiativeTransition, RadiativeTransition, Susceptibility,
};

/// Scalar type of every array in the core.
pub type Real = f64;

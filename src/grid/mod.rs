//! Staggered-grid vocabulary shared with the host field solver.
//!
//! The core never owns the electromagnetic fields. The host hands it sparse
//! [`FieldSet`] tables (present only for components the simulation carries)
//! and a [`GridVolume`] describing how flat indices map onto the Yee cell.
//! Populations and coherences live at cell centers; polarizations live at
//! the Yee location of their component, so every coupling between the two
//! goes through a 4-corner average whose offsets the volume supplies.

mod fields;
mod types;
mod volume;

pub use fields::{FieldSet, SigmaTable};
pub use types::*;
pub use volume::{Dimensionality, GridVolume, Sampling};

pub(crate) use volume::shifted;

//! Dense linear algebra for the relaxation operator.
//!
//! The population update is a trapezoidal step in the relaxation term:
//!
//! ```text
//! (I + Gamma*dt/2) N_new = (I - Gamma*dt/2) N_old + drive
//! ```
//!
//! The left-hand operator only depends on `Gamma` and `dt`, so it is inverted
//! once per timestep size and the per-point update becomes a matrix-vector
//! product with `GammaInv`. Level counts are small (a handful), so a plain
//! LU factorization with partial pivoting is all that is needed.

mod dense;

pub use dense::{invert, invert_with_tolerance, DenseLu};

/// Pivot magnitude below which a matrix is treated as singular.
pub const SINGULAR_PIVOT_TOLERANCE: f64 = 1e-15;

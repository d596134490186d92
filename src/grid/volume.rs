//! Grid volume geometry: sizes, strides, staggered-grid offsets and ownership.

use crate::error::{MultilevelError, Result};

use super::types::{Component, Direction};

/// Number of spatial dimensions of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    /// Propagation along z only (Ex, Hy).
    D1,
    /// The x-y plane, all six field components.
    D2,
    /// Full 3D.
    D3,
}

impl Dimensionality {
    /// Axes that carry grid points.
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Dimensionality::D1 => &[Direction::Z],
            Dimensionality::D2 => &[Direction::X, Direction::Y],
            Dimensionality::D3 => &[Direction::X, Direction::Y, Direction::Z],
        }
    }

    /// Whether a direction carries grid points.
    pub fn has_direction(self, direction: Direction) -> bool {
        self.directions().contains(&direction)
    }

    /// Whether a field component exists in this dimensionality.
    pub fn has_component(self, component: Component) -> bool {
        match self {
            Dimensionality::D1 => {
                let wanted = if component.is_electric() {
                    Direction::X
                } else {
                    Direction::Y
                };
                component.direction() == wanted
            }
            Dimensionality::D2 | Dimensionality::D3 => true,
        }
    }
}

/// Where on the staggered grid a quantity is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Cell centers (populations, coherences).
    Centered,
    /// The Yee location of a field component (polarizations).
    Edge(Component),
}

/// A rectangular grid volume.
///
/// Every array (fields, polarizations, populations) is indexed by the same
/// flat index over `(n_x + 1) x (n_y + 1) x (n_z + 1)` points, counting only
/// the axes present in the dimensionality. Index `(i, j, k)` names both the
/// cell center at `(i + 1/2, j + 1/2, k + 1/2)` and each component's Yee
/// location in the same cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridVolume {
    dim: Dimensionality,
    /// Number of cells per axis (0 on absent axes)
    cells: [usize; 3],
    /// Number of points per axis
    sizes: [usize; 3],
    /// Flat-index stride per axis
    strides: [usize; 3],
}

impl GridVolume {
    /// Create a grid volume. Cell counts on absent axes are ignored.
    pub fn new(dim: Dimensionality, nx: usize, ny: usize, nz: usize) -> Result<Self> {
        let requested = [nx, ny, nz];
        let mut cells = [0; 3];
        let mut sizes = [1; 3];
        for &d in dim.directions() {
            let n = requested[d.index()];
            if n == 0 {
                return Err(MultilevelError::InvalidGrid {
                    message: format!("axis {} needs at least one cell", d),
                });
            }
            cells[d.index()] = n;
            sizes[d.index()] = n + 1;
        }

        let strides = [sizes[1] * sizes[2], sizes[2], 1];
        Ok(Self {
            dim,
            cells,
            sizes,
            strides,
        })
    }

    /// A 1D grid of `nz` cells along z.
    pub fn one_d(nz: usize) -> Result<Self> {
        Self::new(Dimensionality::D1, 0, 0, nz)
    }

    /// A 2D grid of `nx` x `ny` cells.
    pub fn two_d(nx: usize, ny: usize) -> Result<Self> {
        Self::new(Dimensionality::D2, nx, ny, 0)
    }

    /// A 3D grid of `nx` x `ny` x `nz` cells.
    pub fn three_d(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        Self::new(Dimensionality::D3, nx, ny, nz)
    }

    /// The dimensionality.
    pub fn dim(&self) -> Dimensionality {
        self.dim
    }

    /// Total number of grid points (length of every per-point array).
    pub fn ntot(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Number of cells along an axis.
    pub fn cells(&self, direction: Direction) -> usize {
        self.cells[direction.index()]
    }

    /// Flat-index stride along an axis.
    pub fn stride(&self, direction: Direction) -> usize {
        self.strides[direction.index()]
    }

    /// Flat index of grid coordinates.
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i * self.strides[0] + j * self.strides[1] + k * self.strides[2]
    }

    /// Grid coordinates of a flat index.
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let i = idx / self.strides[0];
        let rem = idx % self.strides[0];
        [i, rem / self.strides[1], rem % self.strides[1]]
    }

    /// Offsets from a Yee point of `c` to the other corners surrounding the
    /// same cell center: summing `v[i]`, `v[i+o1]`, `v[i+o2]`, `v[i+o1+o2]`
    /// gives 4x the value at center `i`. Unused offsets are zero.
    pub fn yee2cent_offsets(&self, c: Component) -> (isize, isize) {
        let mut offsets = [0isize; 2];
        let mut n = 0;
        for &d in self.dim.directions() {
            if c.on_integer_axis(d) && n < 2 {
                offsets[n] = self.stride(d) as isize;
                n += 1;
            }
        }
        (offsets[0], offsets[1])
    }

    /// Offsets from a cell center to the centers surrounding the Yee point
    /// of `c` with the same index.
    pub fn cent2yee_offsets(&self, c: Component) -> (isize, isize) {
        let (o1, o2) = self.yee2cent_offsets(c);
        (-o1, -o2)
    }

    /// Whether the point `idx` is updated for the given sampling.
    ///
    /// Owned points are exactly those whose 4-corner stencil stays inside the
    /// array: centers read Yee points at `+o`, Yee points read centers at `-o`.
    pub fn is_owned(&self, sampling: Sampling, idx: usize) -> bool {
        if idx >= self.ntot() {
            return false;
        }
        if let Sampling::Edge(c) = sampling {
            if !self.dim.has_component(c) {
                return false;
            }
        }

        let coords = self.coords(idx);
        for &d in self.dim.directions() {
            let x = coords[d.index()];
            let n = self.cells(d);
            let lower = match sampling {
                Sampling::Edge(c) if c.on_integer_axis(d) => 1,
                _ => 0,
            };
            if x < lower || x >= n {
                return false;
            }
        }
        true
    }

    /// Number of owned points for a sampling.
    pub fn owned_count(&self, sampling: Sampling) -> usize {
        (0..self.ntot()).filter(|&i| self.is_owned(sampling, i)).count()
    }
}

/// Apply a signed stencil offset to a flat index.
#[inline]
pub(crate) fn shifted(i: usize, offset: isize) -> usize {
    i.wrapping_add_signed(offset)
}

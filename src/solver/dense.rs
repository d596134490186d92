//! Dense LU factorization and inversion for small row-major matrices.

use crate::error::{MultilevelError, Result};

use super::SINGULAR_PIVOT_TOLERANCE;

/// LU factorization with partial pivoting, PA = LU.
#[derive(Debug, Clone)]
pub struct DenseLu {
    /// Matrix dimension
    pub size: usize,
    /// Packed L (unit diagonal, below) and U (on and above diagonal), row-major
    pub lu: Vec<f64>,
    /// Row permutation: row i of PA is row `pivots[i]` of A
    pub pivots: Vec<usize>,
    /// Pivot magnitude treated as zero
    pub tolerance: f64,
}

impl DenseLu {
    /// Create an empty factorization workspace.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            lu: vec![0.0; size * size],
            pivots: (0..size).collect(),
            tolerance: SINGULAR_PIVOT_TOLERANCE,
        }
    }

    /// Set the singular-pivot tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Factor a size x size row-major matrix.
    ///
    /// Rows are exchanged so that every pivot is the largest remaining entry
    /// of its column. Fails with [`MultilevelError::SingularMatrix`] when that
    /// entry is below the tolerance (or NaN).
    pub fn factor(&mut self, a: &[f64]) -> Result<()> {
        let n = self.size;
        if a.len() != n * n {
            return Err(MultilevelError::dimension_mismatch("LU input matrix", n * n, a.len()));
        }
        self.lu.copy_from_slice(a);
        self.pivots.iter_mut().enumerate().for_each(|(i, p)| *p = i);

        for k in 0..n {
            let (row, magnitude) = self.largest_in_column(k);
            if !(magnitude >= self.tolerance) {
                return Err(MultilevelError::SingularMatrix);
            }
            if row != k {
                self.exchange_rows(k, row);
            }

            // Rows above k + 1 hold the finished part of U
            let (upper, lower) = self.lu.split_at_mut((k + 1) * n);
            let pivot_row = &upper[k * n..];
            let pivot = pivot_row[k];
            for target in lower.chunks_exact_mut(n) {
                let multiplier = target[k] / pivot;
                target[k] = multiplier;
                for (t, &p) in target[k + 1..].iter_mut().zip(&pivot_row[k + 1..]) {
                    *t -= multiplier * p;
                }
            }
        }

        Ok(())
    }

    /// Row index and magnitude of the largest entry of column `k` at or below the diagonal.
    fn largest_in_column(&self, k: usize) -> (usize, f64) {
        let n = self.size;
        (k..n)
            .map(|i| (i, self.lu[i * n + k].abs()))
            .fold((k, f64::NAN), |best, candidate| {
                if best.1.is_nan() || candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }

    fn exchange_rows(&mut self, r1: usize, r2: usize) {
        let n = self.size;
        self.pivots.swap(r1, r2);
        let (low, high) = (r1.min(r2), r1.max(r2));
        let (head, tail) = self.lu.split_at_mut(high * n);
        head[low * n..(low + 1) * n].swap_with_slice(&mut tail[..n]);
    }

    /// Solve A x = b with the stored factorization.
    pub fn solve(&self, b: &[f64], x: &mut [f64]) {
        let n = self.size;
        for (xi, &p) in x.iter_mut().zip(&self.pivots) {
            *xi = b[p];
        }

        // L has a unit diagonal: y = L^-1 P b
        for (i, row) in self.lu.chunks_exact(n).enumerate() {
            let dot: f64 = row[..i].iter().zip(&x[..i]).map(|(l, y)| l * y).sum();
            x[i] -= dot;
        }

        // x = U^-1 y
        for (i, row) in self.lu.chunks_exact(n).enumerate().rev() {
            let dot: f64 = row[i + 1..].iter().zip(&x[i + 1..]).map(|(u, xj)| u * xj).sum();
            x[i] = (x[i] - dot) / row[i];
        }
    }
}

/// Replace a size x size row-major matrix by its inverse.
///
/// On failure the matrix is left untouched. A singular matrix is reported as
/// [`MultilevelError::SingularMatrix`]; callers decide whether that is fatal.
pub fn invert(matrix: &mut [f64], size: usize) -> Result<()> {
    invert_with_tolerance(matrix, size, SINGULAR_PIVOT_TOLERANCE)
}

/// [`invert`] with an explicit singular-pivot tolerance.
pub fn invert_with_tolerance(matrix: &mut [f64], size: usize, tolerance: f64) -> Result<()> {
    let mut lu = DenseLu::new(size).with_tolerance(tolerance);
    lu.factor(matrix)?;

    let mut unit = vec![0.0; size];
    let mut column = vec![0.0; size];
    for j in 0..size {
        unit.fill(0.0);
        unit[j] = 1.0;
        lu.solve(&unit, &mut column);
        for i in 0..size {
            matrix[i * size + j] = column[i];
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matmul(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
        let mut c = vec![0.0; n * n];
        for i in 0..n {
            for k in 0..n {
                for j in 0..n {
                    c[i * n + j] += a[i * n + k] * b[k * n + j];
                }
            }
        }
        c
    }

    #[test]
    fn test_invert_2x2() {
        let mut m = vec![4.0, 7.0, 2.0, 6.0];
        invert(&mut m, 2).unwrap();
        // inv = 1/10 * [6 -7; -2 4]
        assert_relative_eq!(m[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(m[1], -0.7, epsilon = 1e-12);
        assert_relative_eq!(m[2], -0.2, epsilon = 1e-12);
        assert_relative_eq!(m[3], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_invert_needs_pivoting() {
        // Zero on the leading diagonal
        let a = vec![0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 4.0, -3.0, 8.0];
        let mut inv = a.clone();
        invert(&mut inv, 3).unwrap();
        let product = matmul(&a, &inv, 3);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[i * 3 + j], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_invert_with_repeated_row_exchanges() {
        // Every column's largest entry sits below the diagonal
        let a = vec![
            0.0, 2.0, 1.0, 0.5, //
            1.0, 0.0, 3.0, 1.0, //
            2.0, 1.0, 0.0, 4.0, //
            5.0, -1.0, 2.0, 0.0,
        ];
        let mut inv = a.clone();
        invert(&mut inv, 4).unwrap();
        let product = matmul(&a, &inv, 4);
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[i * 4 + j], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_left_untouched() {
        let mut m = vec![1.0, 2.0, 2.0, 4.0];
        let err = invert(&mut m, 2).unwrap_err();
        assert!(matches!(err, MultilevelError::SingularMatrix));
        assert_eq!(m, vec![1.0, 2.0, 2.0, 4.0]);
    }

    #[test]
    fn test_size_mismatch() {
        let mut lu = DenseLu::new(3);
        assert!(lu.factor(&[1.0, 0.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn test_solve() {
        let mut lu = DenseLu::new(2);
        lu.factor(&[2.0, 1.0, 1.0, 3.0]).unwrap();
        let mut x = vec![0.0; 2];
        lu.solve(&[3.0, 5.0], &mut x);
        assert_relative_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.4, epsilon = 1e-12);
    }
}

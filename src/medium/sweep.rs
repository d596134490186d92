//! Point loops shared by the update phases.
//!
//! Within one phase no point reads another point's new value, so every loop
//! here may run on the rayon pool. Each worker gets its own scratch vector.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Visit fixed-size chunks (one per grid point) with a scratch vector.
///
/// The serial path reuses `serial_scratch` and zeroes it afterwards, so the
/// scratch never carries state between sweeps; parallel workers allocate
/// their own of the same length.
pub(crate) fn for_each_chunk<F>(
    values: &mut [f64],
    chunk: usize,
    serial_scratch: &mut [f64],
    parallel: bool,
    f: F,
) where
    F: Fn(usize, &mut [f64], &mut [f64]) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            let len = serial_scratch.len();
            values
                .par_chunks_mut(chunk)
                .enumerate()
                .for_each_init(|| vec![0.0; len], |scratch, (i, v)| f(i, v, scratch.as_mut_slice()));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for (i, v) in values.chunks_mut(chunk).enumerate() {
        f(i, v, &mut *serial_scratch);
    }
    serial_scratch.fill(0.0);
}

/// Visit matching entries of a current/previous pair of arrays.
pub(crate) fn for_each_pair<F>(current: &mut [f64], previous: &mut [f64], parallel: bool, f: F)
where
    F: Fn(usize, &mut f64, &mut f64) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            current
                .par_iter_mut()
                .zip(previous.par_iter_mut())
                .enumerate()
                .for_each(|(i, (c, p))| f(i, c, p));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for (i, (c, p)) in current.iter_mut().zip(previous.iter_mut()).enumerate() {
        f(i, c, p);
    }
}

/// Fill one output slot per grid point.
pub(crate) fn fill_points<T, F>(out: &mut [T], parallel: bool, f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            out.par_iter_mut().enumerate().for_each(|(i, o)| f(i, o));
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for (i, o) in out.iter_mut().enumerate() {
        f(i, o);
    }
}

/// Sum of a quantity over the four corners `i`, `i+o1`, `i+o2`, `i+o1+o2`.
#[inline]
pub(crate) fn corner_sum(values: &[f64], i: usize, o1: isize, o2: isize) -> f64 {
    use crate::grid::shifted;
    values[i] + values[shifted(i, o1)] + values[shifted(i, o2)] + values[shifted(i, o1 + o2)]
}

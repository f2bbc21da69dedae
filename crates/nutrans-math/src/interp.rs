//! Cell-centred multilinear interpolation on [`Axis`] grids.
//!
//! Data live at bin centres. Positions beyond the outermost centres are
//! clamped, and the reported slope along that axis is zero there.

use crate::axis::Axis;

/// Interpolation stencil around one position on an N-dimensional grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationCube<const N: usize> {
    lower: [usize; N],
    upper: [usize; N],
    frac: [f64; N],
    inv_width: [f64; N],
}

impl<const N: usize> InterpolationCube<N> {
    pub fn new(axes: [&Axis; N], x: [f64; N]) -> Self {
        let mut lower = [0; N];
        let mut upper = [0; N];
        let mut frac = [0.0; N];
        let mut inv_width = [0.0; N];

        for d in 0..N {
            let axis = axes[d];
            let n = axis.size();
            if n == 0 {
                continue;
            }
            let j = axis.bin_clamped(x[d]);
            let (lo, hi) = if x[d] < axis.center(j) {
                (j.saturating_sub(1), j)
            } else {
                (j, (j + 1).min(n - 1))
            };
            lower[d] = lo;
            upper[d] = hi;
            if lo == hi {
                continue;
            }
            let width = axis.center(hi) - axis.center(lo);
            frac[d] = ((x[d] - axis.center(lo)) / width).clamp(0.0, 1.0);
            if x[d] >= axis.center(lo) && x[d] <= axis.center(hi) {
                inv_width[d] = 1.0 / width;
            }
        }

        InterpolationCube {
            lower,
            upper,
            frac,
            inv_width,
        }
    }

    fn corner(&self, mask: usize) -> [usize; N] {
        let mut idx = [0; N];
        for d in 0..N {
            idx[d] = if mask & (1 << d) != 0 {
                self.upper[d]
            } else {
                self.lower[d]
            };
        }
        idx
    }

    fn weight(&self, mask: usize, skip: Option<usize>) -> f64 {
        (0..N)
            .filter(|&d| Some(d) != skip)
            .map(|d| {
                if mask & (1 << d) != 0 {
                    self.frac[d]
                } else {
                    1.0 - self.frac[d]
                }
            })
            .product()
    }

    /// Weighted sum of `value` over the 2^N stencil corners.
    pub fn interpolate<F: Fn([usize; N]) -> f64>(&self, value: F) -> f64 {
        (0..1usize << N)
            .map(|mask| self.weight(mask, None) * value(self.corner(mask)))
            .sum()
    }

    /// Gradient of the interpolant with respect to each coordinate.
    pub fn slopes<F: Fn([usize; N]) -> f64>(&self, value: F) -> [f64; N] {
        let mut out = [0.0; N];
        for (d, slot) in out.iter_mut().enumerate() {
            if self.inv_width[d] == 0.0 {
                continue;
            }
            *slot = (0..1usize << N)
                .map(|mask| {
                    let sign = if mask & (1 << d) != 0 { 1.0 } else { -1.0 };
                    sign * self.weight(mask, Some(d)) * value(self.corner(mask))
                })
                .sum::<f64>()
                * self.inv_width[d];
        }
        out
    }
}

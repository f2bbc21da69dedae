//! Mathematical primitives for Nutrans: axis lookup, CDF sampling and interpolation.

pub mod axis;
pub mod cdf;
pub mod interp;

//! Relativistic Monte Carlo transport geometry.
//!
//! Stage 1: metric, connection and comoving tetrads
//! Stage 2: zone grids, boundary distances and symmetry folding
//! Stage 3: opacity lookup, escape spectra and zone snapshots

pub mod einstein;
pub mod grid;
pub mod metric;
pub mod opacity;
pub mod snapshot;
pub mod spectrum;
pub mod telemetry;

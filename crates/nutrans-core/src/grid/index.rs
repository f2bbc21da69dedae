//! Row-major zone index bijection, last axis fastest.
//!
//! Grids with fewer than three dimensions pad `dims` with 1, so a 2-D
//! cylinder `[nr, nz, 1]` flattens as `i * nz + j`.

use nutrans_types::error::{TransportError, TransportResult};

pub fn n_zones(dims: [usize; 3]) -> usize {
    dims[0] * dims[1] * dims[2]
}

/// Flat index without bounds checks; callers guarantee `ind[d] < dims[d]`.
pub(crate) fn flat_index(dims: [usize; 3], ind: [usize; 3]) -> usize {
    (ind[0] * dims[1] + ind[1]) * dims[2] + ind[2]
}

pub fn flatten(dims: [usize; 3], ind: [usize; 3]) -> TransportResult<usize> {
    if (0..3).any(|d| ind[d] >= dims[d]) {
        return Err(TransportError::PhysicsViolation(format!(
            "directional indices {ind:?} out of range for dims {dims:?}"
        )));
    }
    Ok(flat_index(dims, ind))
}

pub fn unflatten(dims: [usize; 3], z: usize) -> TransportResult<[usize; 3]> {
    let n = n_zones(dims);
    if z >= n {
        return Err(TransportError::ZoneIndex {
            index: z,
            n_zones: n,
        });
    }
    let k = z % dims[2];
    let rest = z / dims[2];
    Ok([rest / dims[1], rest % dims[1], k])
}

// ─────────────────────────────────────────────────────────────────────
// Nutrans — Zone Snapshot
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Self-describing zone data for an external writer.
//!
//! Coordinate arrays hold bin edges (`min` followed by every top), one per
//! grid dimension. Data arrays are shaped by the grid's `dims()` truncated
//! to its dimensionality, row-major with the last axis fastest.

use std::collections::BTreeMap;

use ndarray::{ArrayD, Dimension, IxDyn};
use nutrans_types::error::{TransportError, TransportResult};
use serde::Serialize;

use crate::grid::index::flatten;
use crate::grid::{Grid, ZoneGeometry};

#[derive(Debug, Clone)]
pub struct ZoneSnapshot {
    pub dims: Vec<usize>,
    pub coordinates: Vec<Vec<f64>>,
    pub fields: BTreeMap<String, ArrayD<f64>>,
    grid_dims: [usize; 3],
}

/// Layout description written next to the data arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotHeader {
    pub dimensionality: usize,
    pub dims: Vec<usize>,
    pub coordinates: Vec<Vec<f64>>,
    pub fields: Vec<String>,
}

impl ZoneSnapshot {
    /// Comoving volume, density, temperature and electron fraction.
    pub fn from_grid(grid: &Grid) -> TransportResult<Self> {
        let ndim = grid.dimensionality();
        let grid_dims = grid.dims();
        let mut coordinates = Vec::with_capacity(ndim);
        for d in 0..ndim {
            let axis = grid.axis(d).ok_or_else(|| {
                TransportError::InvalidAxis(format!("grid has no axis {d}"))
            })?;
            let mut edges = Vec::with_capacity(axis.size() + 1);
            edges.push(axis.min());
            edges.extend_from_slice(axis.tops());
            coordinates.push(edges);
        }

        let mut snap = ZoneSnapshot {
            dims: grid_dims[..ndim].to_vec(),
            coordinates,
            fields: BTreeMap::new(),
            grid_dims,
        };

        let volume = (0..grid.n_zones())
            .map(|z| grid.zone_com_3volume(z))
            .collect::<TransportResult<Vec<_>>>()?;
        let fluid = grid.fluid();
        snap.add_field("comoving_volume", &volume)?;
        snap.add_field("rho", &fluid.rho.to_vec())?;
        snap.add_field("T", &fluid.temperature.to_vec())?;
        snap.add_field("Ye", &fluid.ye.to_vec())?;
        Ok(snap)
    }

    /// Reshape a flat per-zone array and store it under `name`.
    pub fn add_field(&mut self, name: &str, per_zone: &[f64]) -> TransportResult<()> {
        let n: usize = self.dims.iter().product();
        if per_zone.len() != n {
            return Err(TransportError::PhysicsViolation(format!(
                "field '{name}' needs {n} zone values, got {}",
                per_zone.len()
            )));
        }
        let mut data = ArrayD::zeros(IxDyn(&self.dims));
        for (ind, slot) in data.indexed_iter_mut() {
            let mut full = [0usize; 3];
            full[..ind.ndim()].copy_from_slice(ind.slice());
            *slot = per_zone[flatten(self.grid_dims, full)?];
        }
        self.fields.insert(name.to_string(), data);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.fields.get(name)
    }

    pub fn header(&self) -> SnapshotHeader {
        SnapshotHeader {
            dimensionality: self.dims.len(),
            dims: self.dims.clone(),
            coordinates: self.coordinates.clone(),
            fields: self.fields.keys().cloned().collect(),
        }
    }

    pub fn header_json(&self) -> TransportResult<String> {
        Ok(serde_json::to_string_pretty(&self.header())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cartesian3D, Cylinder2D, Sphere1D};
    use nutrans_math::axis::Axis;
    use nutrans_types::state::FluidState;

    #[test]
    fn test_sphere_snapshot_shapes() {
        let grid = Grid::Sphere1D(
            Sphere1D::new(
                Axis::uniform(0.0, 3.0, 3).unwrap(),
                FluidState::uniform(3, 2.0, 1.0e9, 0.4),
                false,
            )
            .unwrap(),
        );
        let snap = ZoneSnapshot::from_grid(&grid).unwrap();
        assert_eq!(snap.dims, vec![3]);
        assert_eq!(snap.coordinates, vec![vec![0.0, 1.0, 2.0, 3.0]]);
        let rho = snap.field("rho").unwrap();
        assert_eq!(rho.shape(), &[3]);
        assert!(rho.iter().all(|&v| v == 2.0));
        assert_eq!(snap.header().fields, vec!["T", "Ye", "comoving_volume", "rho"]);
    }

    #[test]
    fn test_cylinder_field_is_row_major() {
        let grid = Grid::Cylinder2D(
            Cylinder2D::new(
                Axis::uniform(0.0, 2.0, 2).unwrap(),
                Axis::uniform(0.0, 3.0, 3).unwrap(),
                FluidState::uniform(6, 1.0, 1.0, 0.5),
                false,
            )
            .unwrap(),
        );
        let mut snap = ZoneSnapshot::from_grid(&grid).unwrap();
        let ids: Vec<f64> = (0..6).map(|z| z as f64).collect();
        snap.add_field("zone_id", &ids).unwrap();
        let f = snap.field("zone_id").unwrap();
        assert_eq!(f.shape(), &[2, 3]);
        assert_eq!(f[[0, 2]], 2.0);
        assert_eq!(f[[1, 0]], 3.0);
        assert!(snap.add_field("short", &ids[..5]).is_err());
    }

    #[test]
    fn test_cartesian_header_json() {
        let axes = [
            Axis::uniform(0.0, 1.0, 2).unwrap(),
            Axis::uniform(0.0, 1.0, 3).unwrap(),
            Axis::uniform(0.0, 1.0, 4).unwrap(),
        ];
        let grid = Grid::Cartesian3D(
            Cartesian3D::new(axes, FluidState::uniform(24, 1.0, 1.0, 0.5), None, Default::default())
                .unwrap(),
        );
        let snap = ZoneSnapshot::from_grid(&grid).unwrap();
        assert_eq!(snap.field("comoving_volume").unwrap().shape(), &[2, 3, 4]);
        let json = snap.header_json().unwrap();
        assert!(json.contains("\"dimensionality\": 3"));
        assert!(json.contains("comoving_volume"));
    }
}

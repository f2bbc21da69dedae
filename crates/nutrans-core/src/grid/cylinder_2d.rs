// ─────────────────────────────────────────────────────────────────────
// Nutrans — Cylindrical Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Axisymmetric (rcyl, z) grid in flat spacetime.
//!
//! Fluid velocity columns are (v_r, v_phi, v_z) in cm/s.

use std::f64::consts::PI;

use nutrans_math::axis::Axis;
use nutrans_types::error::{TransportError, TransportResult};
use nutrans_types::state::FluidState;

use super::index::flat_index;
use super::random_walk::face_radius;
use super::{
    clamp_superluminal, helper_zone, lab_to_comoving, min_face_step, unit_direction, ZoneGeometry,
    ZoneLookup,
};
use crate::einstein::{EinsteinHelper, TetradRotation};
use crate::metric::ThreeMetric;

#[derive(Debug, Clone)]
pub struct Cylinder2D {
    rcyl: Axis,
    z: Axis,
    fluid: FluidState,
    reflect_z: bool,
}

impl Cylinder2D {
    pub fn new(rcyl: Axis, z: Axis, mut fluid: FluidState, reflect_z: bool) -> TransportResult<Self> {
        if rcyl.is_empty() || rcyl.min() < 0.0 {
            return Err(TransportError::InvalidAxis(format!(
                "rcyl axis needs >= 1 bin and min >= 0, got {} bins from {}",
                rcyl.size(),
                rcyl.min()
            )));
        }
        if z.is_empty() {
            return Err(TransportError::InvalidAxis(
                "z axis needs >= 1 bin".to_string(),
            ));
        }
        if reflect_z && z.min() != 0.0 {
            return Err(TransportError::InvalidAxis(format!(
                "z reflection needs the z axis to start at 0, got {}",
                z.min()
            )));
        }
        fluid.validate(rcyl.size() * z.size())?;
        clamp_superluminal(&mut fluid, |_| ThreeMetric::identity());
        Ok(Cylinder2D {
            rcyl,
            z,
            fluid,
            reflect_z,
        })
    }

    fn rcyl_of(xup: &[f64; 4]) -> f64 {
        (xup[0] * xup[0] + xup[1] * xup[1]).sqrt()
    }

    fn bounds(&self, z: usize) -> TransportResult<([f64; 2], [f64; 2])> {
        let [i, j, _] = self.zone_directional_indices(z)?;
        Ok((
            [self.rcyl.bottom(i), self.rcyl.top(i)],
            [self.z.bottom(j), self.z.top(j)],
        ))
    }
}

impl ZoneGeometry for Cylinder2D {
    fn dimensionality(&self) -> usize {
        2
    }

    fn dims(&self) -> [usize; 3] {
        [self.rcyl.size(), self.z.size(), 1]
    }

    fn axis(&self, d: usize) -> Option<&Axis> {
        match d {
            0 => Some(&self.rcyl),
            1 => Some(&self.z),
            _ => None,
        }
    }

    fn fluid(&self) -> &FluidState {
        &self.fluid
    }

    fn tetrad_rotation(&self) -> TetradRotation {
        TetradRotation::Cartesian
    }

    fn zone_index(&self, xup: &[f64; 4]) -> ZoneLookup {
        let rc = Self::rcyl_of(xup);
        if rc < self.rcyl.min() {
            return ZoneLookup::BelowInner;
        }
        match (self.rcyl.bin_checked(rc), self.z.bin_checked(xup[2])) {
            (Some(i), Some(j)) => ZoneLookup::Zone(flat_index(self.dims(), [i, j, 0])),
            _ => ZoneLookup::BeyondOuter,
        }
    }

    fn zone_lab_3volume(&self, z: usize) -> TransportResult<f64> {
        let ([r0, r1], [z0, z1]) = self.bounds(z)?;
        Ok(PI * (r1 * r1 - r0 * r0) * (z1 - z0))
    }

    fn zone_min_length(&self, z: usize) -> TransportResult<f64> {
        let ([r0, r1], [z0, z1]) = self.bounds(z)?;
        Ok((r1 - r0).min(z1 - z0))
    }

    fn zone_coordinates(&self, z: usize) -> TransportResult<Vec<f64>> {
        let [i, j, _] = self.zone_directional_indices(z)?;
        Ok(vec![self.rcyl.center(i), self.z.center(j)])
    }

    fn zone_position(&self, z: usize) -> TransportResult<[f64; 4]> {
        let [i, j, _] = self.zone_directional_indices(z)?;
        Ok([self.rcyl.center(i), 0.0, self.z.center(j), 0.0])
    }

    fn sample_in_zone(&self, z: usize, rand: [f64; 3]) -> TransportResult<[f64; 4]> {
        let ([r0, r1], [z0, z1]) = self.bounds(z)?;
        let pad = (r1 - r0) * 1e-12;
        let rc = (rand[0] * (r1 * r1 - r0 * r0) + r0 * r0)
            .sqrt()
            .clamp(r0 + pad, r1 - pad);
        let phi = 2.0 * PI * rand[1];
        let zc = (z0 + rand[2] * (z1 - z0)).clamp(z0, z1 - (z1 - z0) * 1e-12);
        Ok([rc * phi.cos(), rc * phi.sin(), zc, 0.0])
    }

    fn d_boundary(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        let zone = helper_zone(self, eh)?;
        let ([r0, r1], [z0, z1]) = self.bounds(zone)?;
        let d = unit_direction(eh)?;
        let [x, y, zc, _] = eh.xup;

        let mut s = f64::INFINITY;
        let a = d[0] * d[0] + d[1] * d[1];
        if a > 0.0 {
            let b = x * d[0] + y * d[1];
            let rho2 = x * x + y * y;
            let disc_out = b * b - a * (rho2 - r1 * r1);
            if disc_out >= 0.0 {
                s = s.min(((-b + disc_out.sqrt()) / a).max(0.0));
            }
            if r0 > 0.0 && b < 0.0 {
                let disc_in = b * b - a * (rho2 - r0 * r0);
                if disc_in >= 0.0 {
                    s = s.min(((-b - disc_in.sqrt()) / a).max(0.0));
                }
            }
        }
        if d[2] > 0.0 {
            s = s.min(((z1 - zc) / d[2]).max(0.0));
        } else if d[2] < 0.0 {
            s = s.min(((z0 - zc) / d[2]).max(0.0));
        }
        let floor = min_face_step((r1 - r0).min(z1 - z0));
        lab_to_comoving(eh, s.max(floor))
    }

    fn d_randomwalk(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        let zone = helper_zone(self, eh)?;
        let ([r0, r1], [z0, z1]) = self.bounds(zone)?;
        let rc = Self::rcyl_of(&eh.xup);
        let n = if rc > 0.0 {
            [eh.xup[0] / rc, eh.xup[1] / rc, 0.0]
        } else {
            [1.0, 0.0, 0.0]
        };
        let zc = eh.xup[2];
        let mut faces = vec![
            (n, r1 - rc),
            ([0.0, 0.0, 1.0], z1 - zc),
            ([0.0, 0.0, -1.0], zc - z0),
        ];
        if r0 > 0.0 {
            faces.push(([-n[0], -n[1], 0.0], rc - r0));
        }
        faces
            .into_iter()
            .try_fold(f64::INFINITY, |acc, (dir, dist)| {
                Ok(acc.min(face_radius(&eh.g, &eh.u, dir, dist, eh.scatopac)?))
            })
    }

    fn symmetry_boundaries(&self, eh: &mut EinsteinHelper) -> TransportResult<()> {
        if self.reflect_z && eh.xup[2] < 0.0 {
            eh.xup[2] = -eh.xup[2];
            eh.kup[2] = -eh.kup[2];
        }
        Ok(())
    }

    fn interpolate_fluid_velocity(&self, xup: &[f64; 4], z: usize) -> TransportResult<[f64; 3]> {
        self.check_zone(z)?;
        let [vr, vphi, vz] = self.fluid.zone_velocity(z);
        let rc = Self::rcyl_of(xup);
        if rc == 0.0 {
            return Ok([0.0, 0.0, vz]);
        }
        let (cos_p, sin_p) = (xup[0] / rc, xup[1] / rc);
        Ok([vr * cos_p - vphi * sin_p, vr * sin_p + vphi * cos_p, vz])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn cylinder(reflect_z: bool) -> Cylinder2D {
        Cylinder2D::new(
            Axis::uniform(0.0, 2.0, 2).unwrap(),
            Axis::uniform(0.0, 3.0, 3).unwrap(),
            FluidState::uniform(6, 1.0, 1.0, 0.5),
            reflect_z,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_uses_z_fastest() {
        let g = cylinder(false);
        assert_eq!(g.zone_index(&[0.5, 0.0, 0.5, 0.0]), ZoneLookup::Zone(0));
        assert_eq!(g.zone_index(&[0.0, 0.5, 2.5, 0.0]), ZoneLookup::Zone(2));
        assert_eq!(g.zone_index(&[1.0, 1.0, 1.5, 0.0]), ZoneLookup::Zone(4));
        assert_eq!(g.zone_index(&[0.5, 0.0, -0.5, 0.0]), ZoneLookup::BeyondOuter);
        assert_eq!(g.zone_index(&[2.5, 0.0, 0.5, 0.0]), ZoneLookup::BeyondOuter);
        assert_eq!(g.zone_directional_indices(4).unwrap(), [1, 1, 0]);
    }

    #[test]
    fn test_volumes_fill_cylinder() {
        let g = cylinder(false);
        let total: f64 = (0..g.n_zones())
            .map(|z| g.zone_lab_3volume(z).unwrap())
            .sum();
        assert!((total - 12.0 * PI).abs() < 1e-12);
        assert_eq!(g.zone_min_length(0).unwrap(), 1.0);
    }

    #[test]
    fn test_reflect_requires_zero_based_z() {
        let err = Cylinder2D::new(
            Axis::uniform(0.0, 1.0, 1).unwrap(),
            Axis::uniform(-1.0, 1.0, 2).unwrap(),
            FluidState::uniform(2, 1.0, 1.0, 0.5),
            true,
        )
        .unwrap_err();
        match err {
            TransportError::InvalidAxis(msg) => assert!(msg.contains("start at 0")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_sample_and_coordinates() {
        let g = cylinder(false);
        for z in 0..g.n_zones() {
            let x = g.sample_in_zone(z, [0.37, 0.81, 0.52]).unwrap();
            assert_eq!(g.zone_index(&x), ZoneLookup::Zone(z));
            let centre = g.zone_position(z).unwrap();
            assert_eq!(g.zone_index(&centre), ZoneLookup::Zone(z));
            let coords = g.zone_coordinates(z).unwrap();
            assert_eq!(coords.len(), 2);
        }
    }

    #[test]
    fn test_boundary_distance_radial_and_vertical() {
        let grid = Grid::Cylinder2D(cylinder(false));
        let mut eh = EinsteinHelper::new([0.5, 0.0, 0.5, 0.0], [1.0, 0.0, 0.0, 1.0]);
        grid.update_einstein_helper(&mut eh).unwrap();
        assert!((grid.d_boundary(&eh).unwrap() - 0.5).abs() < 1e-12);

        let mut up = EinsteinHelper::new([0.5, 0.0, 0.25, 0.0], [0.0, 0.0, 1.0, 1.0]);
        grid.update_einstein_helper(&mut up).unwrap();
        assert!((grid.d_boundary(&up).unwrap() - 0.75).abs() < 1e-12);

        let mut inward = EinsteinHelper::new([1.5, 0.0, 0.5, 0.0], [-1.0, 0.0, 0.0, 1.0]);
        grid.update_einstein_helper(&mut inward).unwrap();
        assert!((grid.d_boundary(&inward).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_inward_from_lower_faces_leaves_zone() {
        let grid = Grid::Cylinder2D(cylinder(false));
        let cases = [
            ([1.0, 0.0, 0.5, 0.0], [-1.0, 0.0, 0.0, 1.0], 3, 0),
            ([0.5, 0.0, 1.0, 0.0], [0.0, 0.0, -1.0, 1.0], 1, 0),
        ];
        for (x, k, before, after) in cases {
            let mut eh = EinsteinHelper::new(x, k);
            assert_eq!(grid.update_einstein_helper(&mut eh).unwrap(), ZoneLookup::Zone(before));
            let d = grid.d_boundary(&eh).unwrap();
            assert!(d > 0.0 && d < 1e-9, "d = {d}");

            eh.ds_com = d;
            eh.integrate_geodesic().unwrap();
            assert_eq!(grid.update_einstein_helper(&mut eh).unwrap(), ZoneLookup::Zone(after));
        }
    }

    #[test]
    fn test_mirror_plane() {
        let g = cylinder(true);
        let mut eh = EinsteinHelper::new([0.5, 0.0, -0.2, 0.0], [0.0, 0.0, -1.0, 1.0]);
        g.symmetry_boundaries(&mut eh).unwrap();
        assert_eq!(eh.xup[2], 0.2);
        assert_eq!(eh.kup[2], 1.0);
        assert_eq!(g.zone_index(&eh.xup), ZoneLookup::Zone(0));
    }

    #[test]
    fn test_rotational_velocity_to_cartesian() {
        let mut fluid = FluidState::uniform(1, 1.0, 1.0, 0.5);
        fluid.velocity[[0, 1]] = 2.0e9;
        fluid.velocity[[0, 2]] = 1.0e9;
        let g = Cylinder2D::new(
            Axis::uniform(0.0, 1.0, 1).unwrap(),
            Axis::uniform(0.0, 1.0, 1).unwrap(),
            fluid,
            false,
        )
        .unwrap();
        let v = g.interpolate_fluid_velocity(&[0.0, 0.5, 0.5, 0.0], 0).unwrap();
        assert!((v[0] + 2.0e9).abs() < 1e-3);
        assert!(v[1].abs() < 1e-3);
        assert_eq!(v[2], 1.0e9);
        let on_axis = g.interpolate_fluid_velocity(&[0.0, 0.0, 0.5, 0.0], 0).unwrap();
        assert_eq!(on_axis, [0.0, 0.0, 1.0e9]);
    }

    #[test]
    fn test_random_walk_limited_by_nearest_face() {
        let grid = Grid::Cylinder2D(cylinder(false));
        let mut eh = EinsteinHelper::new([0.5, 0.0, 0.9, 0.0], [1.0, 0.0, 0.0, 1.0]);
        grid.update_einstein_helper(&mut eh).unwrap();
        eh.scatopac = 1.0e4;
        let r = grid.d_randomwalk(&eh).unwrap();
        assert!((r - 0.1).abs() < 1e-12, "r = {r}");
    }
}

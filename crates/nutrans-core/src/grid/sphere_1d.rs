// ─────────────────────────────────────────────────────────────────────
// Nutrans — Spherical Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spherically symmetric shells in flat spacetime.
//!
//! Fluid velocity column 0 holds the radial speed; columns 1 and 2 are
//! ignored.

use std::f64::consts::PI;

use nutrans_math::axis::Axis;
use nutrans_types::error::{TransportError, TransportResult};
use nutrans_types::state::FluidState;

use super::random_walk::face_radius;
use super::{
    clamp_superluminal, helper_zone, lab_to_comoving, min_face_step, ray_sphere_entry,
    ray_sphere_exit, unit_direction, ZoneGeometry, ZoneLookup,
};
use crate::einstein::{EinsteinHelper, TetradRotation};
use crate::metric::ThreeMetric;

#[derive(Debug, Clone)]
pub struct Sphere1D {
    r: Axis,
    fluid: FluidState,
    /// Radial velocity per zone, cm/s.
    vr: Vec<f64>,
    reflect_outer: bool,
}

impl Sphere1D {
    pub fn new(r: Axis, mut fluid: FluidState, reflect_outer: bool) -> TransportResult<Self> {
        if r.is_empty() || r.min() < 0.0 {
            return Err(TransportError::InvalidAxis(format!(
                "radial axis needs >= 1 bin and min >= 0, got {} bins from {}",
                r.size(),
                r.min()
            )));
        }
        fluid.validate(r.size())?;
        for z in 0..fluid.n_zones() {
            fluid.velocity[[z, 1]] = 0.0;
            fluid.velocity[[z, 2]] = 0.0;
        }
        clamp_superluminal(&mut fluid, |_| ThreeMetric::identity());
        let vr = fluid.velocity.column(0).to_vec();
        Ok(Sphere1D {
            r,
            fluid,
            vr,
            reflect_outer,
        })
    }

    pub fn radial_axis(&self) -> &Axis {
        &self.r
    }

    fn radius(xup: &[f64; 4]) -> f64 {
        (xup[0] * xup[0] + xup[1] * xup[1] + xup[2] * xup[2]).sqrt()
    }
}

impl ZoneGeometry for Sphere1D {
    fn dimensionality(&self) -> usize {
        1
    }

    fn dims(&self) -> [usize; 3] {
        [self.r.size(), 1, 1]
    }

    fn axis(&self, d: usize) -> Option<&Axis> {
        (d == 0).then_some(&self.r)
    }

    fn fluid(&self) -> &FluidState {
        &self.fluid
    }

    fn tetrad_rotation(&self) -> TetradRotation {
        TetradRotation::Spherical
    }

    fn zone_index(&self, xup: &[f64; 4]) -> ZoneLookup {
        let r = Self::radius(xup);
        if r < self.r.min() {
            return ZoneLookup::BelowInner;
        }
        match self.r.bin_checked(r) {
            Some(z) => ZoneLookup::Zone(z),
            None => ZoneLookup::BeyondOuter,
        }
    }

    fn zone_lab_3volume(&self, z: usize) -> TransportResult<f64> {
        self.check_zone(z)?;
        let (r0, r1) = (self.r.bottom(z), self.r.top(z));
        Ok(4.0 / 3.0 * PI * (r1 * r1 * r1 - r0 * r0 * r0))
    }

    fn zone_min_length(&self, z: usize) -> TransportResult<f64> {
        self.check_zone(z)?;
        Ok(self.r.delta(z))
    }

    fn zone_coordinates(&self, z: usize) -> TransportResult<Vec<f64>> {
        self.check_zone(z)?;
        Ok(vec![self.r.center(z)])
    }

    fn zone_position(&self, z: usize) -> TransportResult<[f64; 4]> {
        self.check_zone(z)?;
        Ok([self.r.center(z), 0.0, 0.0, 0.0])
    }

    fn sample_in_zone(&self, z: usize, rand: [f64; 3]) -> TransportResult<[f64; 4]> {
        self.check_zone(z)?;
        let (r0, r1) = (self.r.bottom(z), self.r.top(z));
        let r3 = rand[0] * (r1 * r1 * r1 - r0 * r0 * r0) + r0 * r0 * r0;
        // Keep clear of both faces so the radius recomputed from x, y, z
        // still locates to this zone.
        let pad = (r1 - r0) * 1e-12;
        let r = r3.cbrt().clamp(r0 + pad, r1 - pad);
        let mu = 2.0 * rand[1] - 1.0;
        let phi = 2.0 * PI * rand[2];
        let s = (1.0 - mu * mu).max(0.0).sqrt();
        Ok([r * s * phi.cos(), r * s * phi.sin(), r * mu, 0.0])
    }

    fn d_boundary(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        let z = helper_zone(self, eh)?;
        let d = unit_direction(eh)?;
        let x = [eh.xup[0], eh.xup[1], eh.xup[2]];
        let outer = ray_sphere_exit(x, d, self.r.top(z));
        let inner = ray_sphere_entry(x, d, self.r.bottom(z));
        let floor = min_face_step(self.zone_min_length(z)?);
        lab_to_comoving(eh, outer.min(inner).max(floor))
    }

    fn d_randomwalk(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        let z = helper_zone(self, eh)?;
        let r = Self::radius(&eh.xup);
        let n = if r > 0.0 {
            [eh.xup[0] / r, eh.xup[1] / r, eh.xup[2] / r]
        } else {
            [0.0, 0.0, 1.0]
        };
        let (r0, r1) = (self.r.bottom(z), self.r.top(z));
        let mut radius = face_radius(&eh.g, &eh.u, n, r1 - r, eh.scatopac)?;
        if r0 > 0.0 {
            let inward = [-n[0], -n[1], -n[2]];
            radius = radius.min(face_radius(&eh.g, &eh.u, inward, r - r0, eh.scatopac)?);
        }
        Ok(radius)
    }

    fn symmetry_boundaries(&self, eh: &mut EinsteinHelper) -> TransportResult<()> {
        if !self.reflect_outer {
            return Ok(());
        }
        let r = Self::radius(&eh.xup);
        let rmax = self.r.max();
        if r <= rmax {
            return Ok(());
        }
        let folded = (2.0 * rmax - r).max(self.r.min());
        let n = [eh.xup[0] / r, eh.xup[1] / r, eh.xup[2] / r];
        for i in 0..3 {
            eh.xup[i] = n[i] * folded;
        }
        let kr = eh.kup[0] * n[0] + eh.kup[1] * n[1] + eh.kup[2] * n[2];
        if kr > 0.0 {
            for i in 0..3 {
                eh.kup[i] -= 2.0 * kr * n[i];
            }
        }
        Ok(())
    }

    fn interpolate_fluid_velocity(&self, xup: &[f64; 4], z: usize) -> TransportResult<[f64; 3]> {
        self.check_zone(z)?;
        let r = Self::radius(xup);
        if r == 0.0 {
            return Ok([0.0; 3]);
        }
        let vr = self.r.value_at(r, &self.vr)?;
        Ok([vr * xup[0] / r, vr * xup[1] / r, vr * xup[2] / r])
    }
}

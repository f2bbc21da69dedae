// ─────────────────────────────────────────────────────────────────────
// Nutrans — Cartesian Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 3-D Cartesian grid, optionally carrying a curved stationary spacetime.
//!
//! Lapse, shift, spatial metric and fluid velocity are cell-centred and
//! trilinearly interpolated. The connection comes from the slopes of the
//! same interpolant, so it is piecewise constant between cell centres.

use nutrans_math::axis::Axis;
use nutrans_math::interp::InterpolationCube;
use nutrans_types::error::{TransportError, TransportResult};
use nutrans_types::state::{FluidState, SpacetimeFields};

use super::index::flat_index;
use super::random_walk::face_radius;
use super::{clamp_superluminal, helper_zone, min_face_step, ZoneGeometry, ZoneLookup};
use crate::einstein::{EinsteinHelper, TetradRotation};
use crate::metric::{Christoffel, ThreeMetric};

/// Symmetry planes of a Cartesian domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartesianSymmetry {
    pub reflect: [bool; 3],
    pub rotate_hemisphere: [bool; 2],
    pub rotate_quadrant: bool,
}

impl CartesianSymmetry {
    fn validate(&self, axes: &[Axis; 3]) -> TransportResult<()> {
        let rotates = [
            self.rotate_hemisphere[0] || self.rotate_quadrant,
            self.rotate_hemisphere[1] || self.rotate_quadrant,
        ];
        if (self.reflect[0] || self.reflect[1]) && (rotates[0] || rotates[1]) {
            return Err(TransportError::ConfigError(
                "x/y reflection cannot be combined with rotations".to_string(),
            ));
        }
        if self.rotate_quadrant && self.rotate_hemisphere.iter().any(|&h| h) {
            return Err(TransportError::ConfigError(
                "quadrant rotation excludes hemisphere rotation".to_string(),
            ));
        }
        if self.rotate_hemisphere[0] && self.rotate_hemisphere[1] {
            return Err(TransportError::ConfigError(
                "hemisphere rotation may be set for x or y, not both".to_string(),
            ));
        }
        for (d, axis) in axes.iter().enumerate() {
            let folds = self.reflect[d] || (d < 2 && rotates[d]);
            if folds && axis.min() != 0.0 {
                return Err(TransportError::InvalidAxis(format!(
                    "axis {d} carries a symmetry plane and must start at 0, got {}",
                    axis.min()
                )));
            }
        }
        if self.rotate_quadrant && axes[0] != axes[1] {
            return Err(TransportError::InvalidAxis(
                "quadrant rotation needs identical x and y axes".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Cartesian3D {
    axes: [Axis; 3],
    fluid: FluidState,
    spacetime: Option<SpacetimeFields>,
    sqrt_det_g3: Vec<f64>,
    symmetry: CartesianSymmetry,
}

impl Cartesian3D {
    pub fn new(
        axes: [Axis; 3],
        mut fluid: FluidState,
        spacetime: Option<SpacetimeFields>,
        symmetry: CartesianSymmetry,
    ) -> TransportResult<Self> {
        if let Some(d) = axes.iter().position(|a| a.is_empty()) {
            return Err(TransportError::InvalidAxis(format!(
                "axis {d} needs >= 1 bin"
            )));
        }
        symmetry.validate(&axes)?;
        let n: usize = axes.iter().map(Axis::size).product();
        fluid.validate(n)?;

        let sqrt_det_g3 = match &spacetime {
            Some(st) => {
                st.validate(n)?;
                (0..n)
                    .map(|z| ThreeMetric::from_array(st.zone_three_metric(z)).det().sqrt())
                    .collect()
            }
            None => vec![1.0; n],
        };
        clamp_superluminal(&mut fluid, |z| match &spacetime {
            Some(st) => ThreeMetric::from_array(st.zone_three_metric(z)),
            None => ThreeMetric::identity(),
        });

        Ok(Cartesian3D {
            axes,
            fluid,
            spacetime,
            sqrt_det_g3,
            symmetry,
        })
    }

    pub fn spacetime(&self) -> Option<&SpacetimeFields> {
        self.spacetime.as_ref()
    }

    pub fn symmetry(&self) -> CartesianSymmetry {
        self.symmetry
    }

    fn cube(&self, xup: &[f64; 4]) -> InterpolationCube<3> {
        InterpolationCube::new(
            [&self.axes[0], &self.axes[1], &self.axes[2]],
            [xup[0], xup[1], xup[2]],
        )
    }

    fn deltas(&self, ind: [usize; 3]) -> [f64; 3] {
        [
            self.axes[0].delta(ind[0]),
            self.axes[1].delta(ind[1]),
            self.axes[2].delta(ind[2]),
        ]
    }
}

impl ZoneGeometry for Cartesian3D {
    fn dimensionality(&self) -> usize {
        3
    }

    fn dims(&self) -> [usize; 3] {
        [self.axes[0].size(), self.axes[1].size(), self.axes[2].size()]
    }

    fn axis(&self, d: usize) -> Option<&Axis> {
        self.axes.get(d)
    }

    fn fluid(&self) -> &FluidState {
        &self.fluid
    }

    fn tetrad_rotation(&self) -> TetradRotation {
        TetradRotation::Cartesian
    }

    fn zone_index(&self, xup: &[f64; 4]) -> ZoneLookup {
        let mut ind = [0; 3];
        for d in 0..3 {
            match self.axes[d].bin_checked(xup[d]) {
                Some(i) => ind[d] = i,
                None => return ZoneLookup::BeyondOuter,
            }
        }
        ZoneLookup::Zone(flat_index(self.dims(), ind))
    }

    fn zone_lab_3volume(&self, z: usize) -> TransportResult<f64> {
        let dx = self.deltas(self.zone_directional_indices(z)?);
        Ok(dx[0] * dx[1] * dx[2] * self.sqrt_det_g3[z])
    }

    fn zone_min_length(&self, z: usize) -> TransportResult<f64> {
        let dx = self.deltas(self.zone_directional_indices(z)?);
        Ok(dx[0].min(dx[1]).min(dx[2]))
    }

    fn zone_coordinates(&self, z: usize) -> TransportResult<Vec<f64>> {
        let ind = self.zone_directional_indices(z)?;
        Ok((0..3).map(|d| self.axes[d].center(ind[d])).collect())
    }

    fn zone_position(&self, z: usize) -> TransportResult<[f64; 4]> {
        let ind = self.zone_directional_indices(z)?;
        Ok([
            self.axes[0].center(ind[0]),
            self.axes[1].center(ind[1]),
            self.axes[2].center(ind[2]),
            0.0,
        ])
    }

    fn sample_in_zone(&self, z: usize, rand: [f64; 3]) -> TransportResult<[f64; 4]> {
        let ind = self.zone_directional_indices(z)?;
        let mut x = [0.0; 4];
        for d in 0..3 {
            let (lo, hi) = (self.axes[d].bottom(ind[d]), self.axes[d].top(ind[d]));
            let width = hi - lo;
            x[d] = (lo + rand[d] * width).min(hi - width * 1e-12).max(lo);
        }
        Ok(x)
    }

    fn d_boundary(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        let z = helper_zone(self, eh)?;
        let ind = self.zone_directional_indices(z)?;
        let mut dlambda = f64::INFINITY;
        for d in 0..3 {
            let k = eh.kup[d];
            let face = if k > 0.0 {
                self.axes[d].top(ind[d])
            } else if k < 0.0 {
                self.axes[d].bottom(ind[d])
            } else {
                continue;
            };
            // The axis that limits the step advances by at least a small
            // fraction of its width, so a particle on a face crosses it.
            let floor = min_face_step(self.axes[d].delta(ind[d])) / k.abs();
            dlambda = dlambda.min(((face - eh.xup[d]) / k).max(floor));
        }
        if !dlambda.is_finite() || !(eh.kup_tet[3] > 0.0) {
            return Err(TransportError::PhysicsViolation(format!(
                "no boundary ahead of kup={:?}, kup_tet_t={}",
                eh.kup, eh.kup_tet[3]
            )));
        }
        Ok(dlambda * eh.kup_tet[3])
    }

    fn d_randomwalk(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        let z = helper_zone(self, eh)?;
        let ind = self.zone_directional_indices(z)?;
        let mut radius = f64::INFINITY;
        for d in 0..3 {
            for sgn in [1.0, -1.0] {
                let mut dir = [0.0; 3];
                dir[d] = sgn;
                let dist = if sgn > 0.0 {
                    self.axes[d].top(ind[d]) - eh.xup[d]
                } else {
                    eh.xup[d] - self.axes[d].bottom(ind[d])
                };
                radius = radius.min(face_radius(&eh.g, &eh.u, dir, dist, eh.scatopac)?);
            }
        }
        Ok(radius)
    }

    fn symmetry_boundaries(&self, eh: &mut EinsteinHelper) -> TransportResult<()> {
        let sym = &self.symmetry;
        let mut klow = eh.g.lower(eh.kup);
        let mut x = eh.xup;
        let mut touched = false;

        for d in 0..3 {
            if sym.reflect[d] && x[d] < 0.0 {
                klow[d] = -klow[d];
                x[d] = -x[d];
                touched = true;
            }
        }

        for i in 0..2 {
            if x[i] >= 0.0 || !(sym.rotate_hemisphere[i] || sym.rotate_quadrant) {
                continue;
            }
            touched = true;
            let other = 1 - i;
            if sym.rotate_quadrant && x[other] >= 0.0 {
                // 90° about z.
                let (k_i, x_i) = (klow[i], x[i]);
                klow[i] = klow[other];
                klow[other] = -k_i;
                x[i] = x[other];
                x[other] = -x_i;
            } else {
                // 180° about z.
                for j in 0..2 {
                    klow[j] = -klow[j];
                    x[j] = -x[j];
                }
            }
        }

        if touched {
            eh.kup = eh.g.raise4(klow);
            eh.xup = x;
        }
        Ok(())
    }

    fn interpolate_fluid_velocity(&self, xup: &[f64; 4], z: usize) -> TransportResult<[f64; 3]> {
        self.check_zone(z)?;
        let cube = self.cube(xup);
        let dims = self.dims();
        let v = &self.fluid.velocity;
        let mut out = [0.0; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = cube.interpolate(|ind| v[[flat_index(dims, ind), c]]);
        }
        Ok(out)
    }

    fn zone_lapse(&self, z: usize) -> f64 {
        self.spacetime.as_ref().map_or(1.0, |st| st.lapse[z])
    }

    fn zone_three_metric(&self, z: usize) -> ThreeMetric {
        match &self.spacetime {
            Some(st) => ThreeMetric::from_array(st.zone_three_metric(z)),
            None => ThreeMetric::identity(),
        }
    }

    fn interpolate_lapse(&self, xup: &[f64; 4]) -> f64 {
        let Some(st) = &self.spacetime else {
            return 1.0;
        };
        let dims = self.dims();
        self.cube(xup)
            .interpolate(|ind| st.lapse[flat_index(dims, ind)])
    }

    fn interpolate_shift(&self, xup: &[f64; 4]) -> [f64; 3] {
        let Some(st) = &self.spacetime else {
            return [0.0; 3];
        };
        let dims = self.dims();
        let cube = self.cube(xup);
        let mut out = [0.0; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = cube.interpolate(|ind| st.shift[[flat_index(dims, ind), c]]);
        }
        out
    }

    fn interpolate_3metric(&self, xup: &[f64; 4]) -> ThreeMetric {
        let Some(st) = &self.spacetime else {
            return ThreeMetric::identity();
        };
        let dims = self.dims();
        let cube = self.cube(xup);
        let mut out = [0.0; 6];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = cube.interpolate(|ind| st.three_metric[[flat_index(dims, ind), c]]);
        }
        ThreeMetric::from_array(out)
    }

    fn interpolate_christoffel(&self, xup: &[f64; 4]) -> TransportResult<Christoffel> {
        let Some(st) = &self.spacetime else {
            return Ok(Christoffel::default());
        };
        let dims = self.dims();
        let cube = self.cube(xup);

        let dalpha = cube.slopes(|ind| st.lapse[flat_index(dims, ind)]);
        let mut dbetaup = [[0.0; 3]; 3];
        for c in 0..3 {
            let s = cube.slopes(|ind| st.shift[[flat_index(dims, ind), c]]);
            for d in 0..3 {
                dbetaup[d][c] = s[d];
            }
        }
        let mut dgamma = [[0.0; 6]; 3];
        for c in 0..6 {
            let s = cube.slopes(|ind| st.three_metric[[flat_index(dims, ind), c]]);
            for d in 0..3 {
                dgamma[d][c] = s[d];
            }
        }

        let g = self.interpolate_metric(xup)?;
        Christoffel::from_metric_derivatives(
            &g,
            dalpha,
            dbetaup,
            dgamma.map(ThreeMetric::from_array),
        )
    }
}

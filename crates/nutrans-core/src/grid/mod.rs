// ─────────────────────────────────────────────────────────────────────
// Nutrans — Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Zone-indexed spatial discretizations.
//!
//! Each geometry implements [`ZoneGeometry`]; [`Grid`] is the closed set of
//! variants the transport driver works with, plus the operations shared by
//! every geometry (rest mass, Lorentz factors, isotropic sampling, and the
//! per-step [`EinsteinHelper`] refresh).
//!
//! Positions handed to a grid are Cartesian-equivalent `[x, y, z, t]` in cm.

pub mod cartesian_3d;
pub mod cylinder_2d;
pub mod index;
pub mod random_walk;
pub mod sphere_1d;

use std::f64::consts::PI;

use nutrans_math::axis::Axis;
use nutrans_types::config::{GridConfig, RandomWalkConfig, RankContext, TransportConfig};
use nutrans_types::constants::{
    C_LIGHT_CGS, K_BOLTZMANN_CGS, MAX_LORENTZ_FACTOR, MEV_TO_ERG, M_NEUTRON_CGS, TINY,
};
use nutrans_types::error::{TransportError, TransportResult};
use nutrans_types::state::{FluidState, SpacetimeFields};
use rand::Rng;
use rand_distr::{Distribution, UnitSphere};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::einstein::{EinsteinHelper, TetradRotation};
use crate::metric::{Christoffel, Metric, ThreeMetric};

pub use cartesian_3d::{Cartesian3D, CartesianSymmetry};
pub use cylinder_2d::Cylinder2D;
pub use sphere_1d::Sphere1D;

/// Result of locating a position on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneLookup {
    Zone(usize),
    /// Inside the inner boundary (e.g. a central core).
    BelowInner,
    /// Outside the outer boundary; the particle escapes.
    BeyondOuter,
}

impl ZoneLookup {
    pub fn zone(self) -> Option<usize> {
        match self {
            ZoneLookup::Zone(z) => Some(z),
            _ => None,
        }
    }
}

/// Operation contract shared by every geometry.
pub trait ZoneGeometry {
    fn dimensionality(&self) -> usize;

    /// Zones per axis, padded with 1 past `dimensionality()`.
    fn dims(&self) -> [usize; 3];

    fn axis(&self, d: usize) -> Option<&Axis>;

    fn fluid(&self) -> &FluidState;

    fn tetrad_rotation(&self) -> TetradRotation;

    fn zone_index(&self, xup: &[f64; 4]) -> ZoneLookup;

    fn zone_lab_3volume(&self, z: usize) -> TransportResult<f64>;

    fn zone_min_length(&self, z: usize) -> TransportResult<f64>;

    /// Cell-centre coordinates in the grid's native coordinates.
    fn zone_coordinates(&self, z: usize) -> TransportResult<Vec<f64>>;

    /// A Cartesian-equivalent position at the cell centre.
    fn zone_position(&self, z: usize) -> TransportResult<[f64; 4]>;

    /// Volume-uniform position inside zone `z` from three uniform draws.
    fn sample_in_zone(&self, z: usize, rand: [f64; 3]) -> TransportResult<[f64; 4]>;

    /// Comoving distance to the nearest face of the particle's zone.
    /// Zero means the particle already sits on its exit face.
    fn d_boundary(&self, eh: &EinsteinHelper) -> TransportResult<f64>;

    /// Comoving radius of a diffusion sphere that stays inside the zone.
    fn d_randomwalk(&self, eh: &EinsteinHelper) -> TransportResult<f64>;

    /// Fold positions that crossed a symmetry plane back into the domain.
    fn symmetry_boundaries(&self, eh: &mut EinsteinHelper) -> TransportResult<()>;

    /// Cartesian fluid 3-velocity at `xup` in cm/s.
    fn interpolate_fluid_velocity(&self, xup: &[f64; 4], z: usize) -> TransportResult<[f64; 3]>;

    fn n_zones(&self) -> usize {
        index::n_zones(self.dims())
    }

    fn check_zone(&self, z: usize) -> TransportResult<()> {
        let n = self.n_zones();
        if z >= n {
            return Err(TransportError::ZoneIndex {
                index: z,
                n_zones: n,
            });
        }
        Ok(())
    }

    fn zone_directional_indices(&self, z: usize) -> TransportResult<[usize; 3]> {
        index::unflatten(self.dims(), z)
    }

    fn zone_index_from_directional(&self, ind: [usize; 3]) -> TransportResult<usize> {
        index::flatten(self.dims(), ind)
    }

    /// Zone velocity in an orthonormal basis, cm/s.
    fn zone_native_velocity(&self, z: usize) -> [f64; 3] {
        self.fluid().zone_velocity(z)
    }

    fn zone_lapse(&self, _z: usize) -> f64 {
        1.0
    }

    fn zone_three_metric(&self, _z: usize) -> ThreeMetric {
        ThreeMetric::identity()
    }

    fn interpolate_lapse(&self, _xup: &[f64; 4]) -> f64 {
        1.0
    }

    fn interpolate_shift(&self, _xup: &[f64; 4]) -> [f64; 3] {
        [0.0; 3]
    }

    fn interpolate_3metric(&self, _xup: &[f64; 4]) -> ThreeMetric {
        ThreeMetric::identity()
    }

    fn interpolate_christoffel(&self, _xup: &[f64; 4]) -> TransportResult<Christoffel> {
        Ok(Christoffel::default())
    }

    fn interpolate_metric(&self, xup: &[f64; 4]) -> TransportResult<Metric> {
        Metric::curved(
            self.interpolate_lapse(xup),
            self.interpolate_shift(xup),
            self.interpolate_3metric(xup),
        )
    }
}

/// Scale zone speeds down to the `MAX_LORENTZ_FACTOR` limit. Returns the
/// number of zones touched.
pub(crate) fn clamp_superluminal(fluid: &mut FluidState, metric: impl Fn(usize) -> ThreeMetric) -> usize {
    let beta_max = (1.0 - 1.0 / (MAX_LORENTZ_FACTOR * MAX_LORENTZ_FACTOR)).sqrt();
    let mut clamped = 0;
    for z in 0..fluid.n_zones() {
        let v = fluid.zone_velocity(z);
        let beta = [v[0] / C_LIGHT_CGS, v[1] / C_LIGHT_CGS, v[2] / C_LIGHT_CGS];
        let speed = metric(z).dot(beta, beta).sqrt();
        if speed > beta_max {
            let scale = beta_max / speed;
            for d in 0..3 {
                fluid.velocity[[z, d]] *= scale;
            }
            clamped += 1;
        }
    }
    if clamped > 0 {
        warn!(
            zones = clamped,
            max_lorentz_factor = MAX_LORENTZ_FACTOR,
            "clamped superluminal fluid velocities"
        );
    }
    clamped
}

/// Distance along unit direction `d` from `x` to the sphere `|x| = radius`,
/// taking the first crossing ahead of the particle.
pub(crate) fn ray_sphere_exit(x: [f64; 3], d: [f64; 3], radius: f64) -> f64 {
    let b = x[0] * d[0] + x[1] * d[1] + x[2] * d[2];
    let c = x[0] * x[0] + x[1] * x[1] + x[2] * x[2] - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return f64::INFINITY;
    }
    (-b + disc.sqrt()).max(0.0)
}

/// First inward crossing of the sphere `|x| = radius`, if the ray reaches it.
pub(crate) fn ray_sphere_entry(x: [f64; 3], d: [f64; 3], radius: f64) -> f64 {
    let b = x[0] * d[0] + x[1] * d[1] + x[2] * d[2];
    if radius <= 0.0 || b >= 0.0 {
        return f64::INFINITY;
    }
    let c = x[0] * x[0] + x[1] * x[1] + x[2] * x[2] - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return f64::INFINITY;
    }
    (-b - disc.sqrt()).max(0.0)
}

/// Shortest lab step a boundary distance may return. A particle sitting on
/// a face it is moving through must still leave the zone.
pub(crate) fn min_face_step(min_length: f64) -> f64 {
    TINY * min_length
}

/// Lab path length to comoving path length for a flat-space particle.
pub(crate) fn lab_to_comoving(eh: &EinsteinHelper, lab: f64) -> TransportResult<f64> {
    if !(eh.kup[3] > 0.0) || !(eh.kup_tet[3] > 0.0) {
        return Err(TransportError::PhysicsViolation(format!(
            "wave vector must be future pointing, got kup_t={}, kup_tet_t={}",
            eh.kup[3], eh.kup_tet[3]
        )));
    }
    Ok(lab * eh.kup_tet[3] / eh.kup[3])
}

/// Unit spatial direction of the particle's coordinate wave vector.
pub(crate) fn unit_direction(eh: &EinsteinHelper) -> TransportResult<[f64; 3]> {
    let k = [eh.kup[0], eh.kup[1], eh.kup[2]];
    let norm = (k[0] * k[0] + k[1] * k[1] + k[2] * k[2]).sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(TransportError::PhysicsViolation(
            "particle wave vector has no spatial direction".to_string(),
        ));
    }
    Ok([k[0] / norm, k[1] / norm, k[2] / norm])
}

/// Zone the helper belongs to, falling back to a fresh lookup.
pub(crate) fn helper_zone<G: ZoneGeometry + ?Sized>(grid: &G, eh: &EinsteinHelper) -> TransportResult<usize> {
    match eh.z_ind {
        Some(z) => {
            grid.check_zone(z)?;
            Ok(z)
        }
        None => grid.zone_index(&eh.xup).zone().ok_or_else(|| {
            TransportError::PhysicsViolation(format!(
                "particle at {:?} is off the grid",
                eh.xup
            ))
        }),
    }
}

/// Totals written to the log when a grid is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSummary {
    pub n_zones: usize,
    pub dimensionality: usize,
    /// [g]
    pub total_rest_mass: f64,
    /// Mass-weighted temperature [K].
    pub mean_temperature: f64,
    pub mean_ye: f64,
    /// [erg]
    pub kinetic_energy: f64,
    /// [erg]
    pub thermal_energy: f64,
}

impl GridSummary {
    pub fn to_json(&self) -> TransportResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone)]
pub enum Grid {
    Sphere1D(Sphere1D),
    Cylinder2D(Cylinder2D),
    Cartesian3D(Cartesian3D),
}

macro_rules! dispatch {
    ($self:expr, $g:ident => $body:expr) => {
        match $self {
            Grid::Sphere1D($g) => $body,
            Grid::Cylinder2D($g) => $body,
            Grid::Cartesian3D($g) => $body,
        }
    };
}

impl ZoneGeometry for Grid {
    fn dimensionality(&self) -> usize {
        dispatch!(self, g => g.dimensionality())
    }
    fn dims(&self) -> [usize; 3] {
        dispatch!(self, g => g.dims())
    }
    fn axis(&self, d: usize) -> Option<&Axis> {
        dispatch!(self, g => g.axis(d))
    }
    fn fluid(&self) -> &FluidState {
        dispatch!(self, g => g.fluid())
    }
    fn tetrad_rotation(&self) -> TetradRotation {
        dispatch!(self, g => g.tetrad_rotation())
    }
    fn zone_index(&self, xup: &[f64; 4]) -> ZoneLookup {
        dispatch!(self, g => g.zone_index(xup))
    }
    fn zone_lab_3volume(&self, z: usize) -> TransportResult<f64> {
        dispatch!(self, g => g.zone_lab_3volume(z))
    }
    fn zone_min_length(&self, z: usize) -> TransportResult<f64> {
        dispatch!(self, g => g.zone_min_length(z))
    }
    fn zone_coordinates(&self, z: usize) -> TransportResult<Vec<f64>> {
        dispatch!(self, g => g.zone_coordinates(z))
    }
    fn zone_position(&self, z: usize) -> TransportResult<[f64; 4]> {
        dispatch!(self, g => g.zone_position(z))
    }
    fn sample_in_zone(&self, z: usize, rand: [f64; 3]) -> TransportResult<[f64; 4]> {
        dispatch!(self, g => g.sample_in_zone(z, rand))
    }
    fn d_boundary(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        dispatch!(self, g => g.d_boundary(eh))
    }
    fn d_randomwalk(&self, eh: &EinsteinHelper) -> TransportResult<f64> {
        dispatch!(self, g => g.d_randomwalk(eh))
    }
    fn symmetry_boundaries(&self, eh: &mut EinsteinHelper) -> TransportResult<()> {
        dispatch!(self, g => g.symmetry_boundaries(eh))
    }
    fn interpolate_fluid_velocity(&self, xup: &[f64; 4], z: usize) -> TransportResult<[f64; 3]> {
        dispatch!(self, g => g.interpolate_fluid_velocity(xup, z))
    }
    fn zone_native_velocity(&self, z: usize) -> [f64; 3] {
        dispatch!(self, g => g.zone_native_velocity(z))
    }
    fn zone_lapse(&self, z: usize) -> f64 {
        dispatch!(self, g => g.zone_lapse(z))
    }
    fn zone_three_metric(&self, z: usize) -> ThreeMetric {
        dispatch!(self, g => g.zone_three_metric(z))
    }
    fn interpolate_lapse(&self, xup: &[f64; 4]) -> f64 {
        dispatch!(self, g => g.interpolate_lapse(xup))
    }
    fn interpolate_shift(&self, xup: &[f64; 4]) -> [f64; 3] {
        dispatch!(self, g => g.interpolate_shift(xup))
    }
    fn interpolate_3metric(&self, xup: &[f64; 4]) -> ThreeMetric {
        dispatch!(self, g => g.interpolate_3metric(xup))
    }
    fn interpolate_christoffel(&self, xup: &[f64; 4]) -> TransportResult<Christoffel> {
        dispatch!(self, g => g.interpolate_christoffel(xup))
    }
    fn interpolate_metric(&self, xup: &[f64; 4]) -> TransportResult<Metric> {
        dispatch!(self, g => g.interpolate_metric(xup))
    }
}

impl Grid {
    /// Build the configured geometry over externally loaded zone data.
    /// `spacetime` is only consulted for relativistic Cartesian grids.
    pub fn from_config(
        config: &TransportConfig,
        fluid: FluidState,
        spacetime: Option<SpacetimeFields>,
    ) -> TransportResult<Self> {
        config.validate()?;
        let grid = match &config.grid {
            GridConfig::Sphere1D { r, reflect_outer } => {
                Grid::Sphere1D(Sphere1D::new(Axis::from_spec(r)?, fluid, *reflect_outer)?)
            }
            GridConfig::Cylinder2D { rcyl, z, reflect_z } => Grid::Cylinder2D(Cylinder2D::new(
                Axis::from_spec(rcyl)?,
                Axis::from_spec(z)?,
                fluid,
                *reflect_z,
            )?),
            GridConfig::Cartesian3D {
                x,
                y,
                z,
                reflect,
                rotate_hemisphere,
                rotate_quadrant,
            } => {
                let symmetry = CartesianSymmetry {
                    reflect: *reflect,
                    rotate_hemisphere: *rotate_hemisphere,
                    rotate_quadrant: *rotate_quadrant,
                };
                let spacetime = if config.relativistic { spacetime } else { None };
                Grid::Cartesian3D(Cartesian3D::new(
                    [Axis::from_spec(x)?, Axis::from_spec(y)?, Axis::from_spec(z)?],
                    fluid,
                    spacetime,
                    symmetry,
                )?)
            }
        };
        grid.log_summary(&config.rank)?;
        Ok(grid)
    }

    /// Whether any metric query can differ from Minkowski.
    pub fn is_relativistic(&self) -> bool {
        matches!(self, Grid::Cartesian3D(g) if g.spacetime().is_some())
    }

    pub fn zone_lorentz_factor(&self, z: usize) -> TransportResult<f64> {
        self.check_zone(z)?;
        let v = self.zone_native_velocity(z);
        let beta = [v[0] / C_LIGHT_CGS, v[1] / C_LIGHT_CGS, v[2] / C_LIGHT_CGS];
        let mut g = Metric::flat();
        g.gammalow = self.zone_three_metric(z);
        g.update()?;
        EinsteinHelper::lorentz_factor(&g, beta)
    }

    /// Fluid-frame volume.
    pub fn zone_com_3volume(&self, z: usize) -> TransportResult<f64> {
        Ok(self.zone_lab_3volume(z)? * self.zone_lorentz_factor(z)?)
    }

    pub fn zone_4volume(&self, z: usize) -> TransportResult<f64> {
        Ok(self.zone_lab_3volume(z)? * self.zone_lapse(z))
    }

    pub fn zone_rest_mass(&self, z: usize) -> TransportResult<f64> {
        self.check_zone(z)?;
        Ok(self.fluid().rho[z] * self.zone_com_3volume(z)?)
    }

    pub fn total_rest_mass(&self) -> TransportResult<f64> {
        (0..self.n_zones())
            .into_par_iter()
            .map(|z| self.zone_rest_mass(z))
            .sum()
    }

    /// Distance of the zone centre from the origin.
    pub fn zone_radius(&self, z: usize) -> TransportResult<f64> {
        let x = self.zone_position(z)?;
        Ok((x[0] * x[0] + x[1] * x[1] + x[2] * x[2]).sqrt())
    }

    pub fn summary(&self) -> TransportResult<GridSummary> {
        let fluid = self.fluid();
        let per_zone: Vec<[f64; 5]> = (0..self.n_zones())
            .into_par_iter()
            .map(|z| -> TransportResult<[f64; 5]> {
                let mass = self.zone_rest_mass(z)?;
                let w = self.zone_lorentz_factor(z)?;
                let t = fluid.temperature[z];
                Ok([
                    mass,
                    t * mass,
                    fluid.ye[z] * mass,
                    (w - 1.0) * mass * C_LIGHT_CGS * C_LIGHT_CGS,
                    mass / M_NEUTRON_CGS * K_BOLTZMANN_CGS * t,
                ])
            })
            .collect::<TransportResult<_>>()?;
        let totals = per_zone.iter().fold([0.0; 5], |mut acc, row| {
            for (a, r) in acc.iter_mut().zip(row.iter()) {
                *a += r;
            }
            acc
        });
        let mass = totals[0];
        let mean = |x: f64| if mass > 0.0 { x / mass } else { 0.0 };
        Ok(GridSummary {
            n_zones: self.n_zones(),
            dimensionality: self.dimensionality(),
            total_rest_mass: mass,
            mean_temperature: mean(totals[1]),
            mean_ye: mean(totals[2]),
            kinetic_energy: totals[3],
            thermal_energy: totals[4],
        })
    }

    /// Log the grid summary from the root rank only.
    pub fn log_summary(&self, rank: &RankContext) -> TransportResult<()> {
        if !rank.is_root() {
            return Ok(());
        }
        let s = self.summary()?;
        info!(
            zones = s.n_zones,
            dimensionality = s.dimensionality,
            mass_g = s.total_rest_mass,
            mean_t_mev = s.mean_temperature * K_BOLTZMANN_CGS / MEV_TO_ERG,
            mean_ye = s.mean_ye,
            kinetic_erg = s.kinetic_energy,
            thermal_erg = s.thermal_energy,
            "grid constructed"
        );
        Ok(())
    }

    /// Isotropic unit vector.
    pub fn isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
        UnitSphere.sample(rng)
    }

    /// Null tetrad wave vector of frequency `nu` [Hz] in a random direction.
    pub fn isotropic_kup_tet<R: Rng + ?Sized>(nu: f64, rng: &mut R) -> TransportResult<[f64; 4]> {
        if !nu.is_finite() || nu <= 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "frequency must be finite and > 0, got {nu}"
            )));
        }
        let d = Self::isotropic_direction(rng);
        let k = 2.0 * PI * nu / C_LIGHT_CGS;
        Ok([k * d[0], k * d[1], k * d[2], k])
    }

    /// Position on a central core of radius `r_core` and an outward,
    /// cosine-weighted emission direction. Flat spacetime only.
    pub fn random_core_x_d<R: Rng + ?Sized>(
        &self,
        r_core: f64,
        rng: &mut R,
    ) -> TransportResult<([f64; 3], [f64; 3])> {
        if self.is_relativistic() {
            return Err(TransportError::PhysicsViolation(
                "core emission requires a flat spacetime".to_string(),
            ));
        }
        if !r_core.is_finite() || r_core <= 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "r_core must be finite and > 0, got {r_core}"
            )));
        }
        let normal = Self::isotropic_direction(rng);
        let a = r_core * (1.0 + 1e-10);
        let x = [a * normal[0], a * normal[1], a * normal[2]];

        // Local frame with the surface normal as its z axis.
        let helper = if normal[2].abs() < 0.9 {
            [0.0, 0.0, 1.0]
        } else {
            [1.0, 0.0, 0.0]
        };
        let t1 = normalize3(cross(helper, normal));
        let t2 = cross(normal, t1);
        let cos_t = rng.gen::<f64>().sqrt();
        let sin_t = (1.0 - cos_t * cos_t).max(0.0).sqrt();
        let phi = 2.0 * PI * rng.gen::<f64>();
        let (a1, a2) = (sin_t * phi.cos(), sin_t * phi.sin());
        let d = normalize3([
            a1 * t1[0] + a2 * t2[0] + cos_t * normal[0],
            a1 * t1[1] + a2 * t2[1] + cos_t * normal[1],
            a1 * t1[2] + a2 * t2[2] + cos_t * normal[2],
        ]);
        Ok((x, d))
    }

    /// Locate the particle and rebuild metric, connection, four-velocity,
    /// tetrad and null wave vector for the current position.
    pub fn update_einstein_helper(&self, eh: &mut EinsteinHelper) -> TransportResult<ZoneLookup> {
        let lookup = self.zone_index(&eh.xup);
        let z = match lookup {
            ZoneLookup::Zone(z) => z,
            _ => {
                eh.z_ind = None;
                return Ok(lookup);
            }
        };
        eh.z_ind = Some(z);
        eh.dir_ind = self.zone_directional_indices(z)?;
        eh.g = self.interpolate_metric(&eh.xup)?;
        eh.christoffel = self.interpolate_christoffel(&eh.xup)?;
        let v = self.interpolate_fluid_velocity(&eh.xup, z)?;
        eh.set_fourvel(v)?;
        eh.set_tetrad_basis(self.tetrad_rotation())?;
        if eh.kup[..3].iter().any(|k| *k != 0.0) {
            eh.renormalize_kup()?;
        }
        Ok(lookup)
    }

    /// Diffusion step length when the zone is optically thick to scattering,
    /// otherwise `None`.
    pub fn random_walk_step(
        &self,
        eh: &EinsteinHelper,
        config: &RandomWalkConfig,
    ) -> TransportResult<Option<f64>> {
        if !config.enabled {
            return Ok(None);
        }
        let z = helper_zone(self, eh)?;
        let tau = eh.scatopac * self.zone_min_length(z)?;
        if tau < config.min_optical_depth {
            return Ok(None);
        }
        let r = self.d_randomwalk(eh)? * config.sphere_size;
        Ok((r > 0.0).then_some(r))
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize3(v: [f64; 3]) -> [f64; 3] {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / n, v[1] / n, v[2] / n]
}

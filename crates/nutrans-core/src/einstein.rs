// ─────────────────────────────────────────────────────────────────────
// Nutrans — Einstein Helper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-step relativistic particle context.
//!
//! An [`EinsteinHelper`] bundles a particle's coordinate position and wave
//! vector with the local metric, connection and an orthonormal tetrad
//! comoving with the fluid. It is rebuilt from grid queries every step;
//! only `xup` and `kup` carry over.
//!
//! Tetrad-frame wave vectors are `k_tet = 2πν/c` (rad/cm), so
//! `kup_tet[3]` is the comoving angular wavenumber.

use std::f64::consts::PI;

use nutrans_types::constants::{C_LIGHT_CGS, TINY};
use nutrans_types::error::{TransportError, TransportResult};

use crate::metric::{Christoffel, Metric};

/// Trial spatial legs used before Gram-Schmidt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TetradRotation {
    /// Coordinate x, y, z.
    Cartesian,
    /// Radial, polar and azimuthal directions about the origin.
    Spherical,
}

#[derive(Debug, Clone)]
pub struct EinsteinHelper {
    pub xup: [f64; 4],
    pub kup: [f64; 4],
    pub g: Metric,
    pub christoffel: Christoffel,
    /// Fluid four-velocity.
    pub u: [f64; 4],
    /// Tetrad legs; `e[3]` is timelike.
    pub e: [[f64; 4]; 4],
    pub kup_tet: [f64; 4],
    pub absopac: f64,
    pub scatopac: f64,
    /// Comoving path length of the next step [cm].
    pub ds_com: f64,
    pub dir_ind: [usize; 3],
    pub z_ind: Option<usize>,
    /// Frequency bin in the opacity table.
    pub eas_ind: Option<usize>,
}

impl EinsteinHelper {
    /// Fresh context at a coordinate position with a coordinate wave vector.
    pub fn new(xup: [f64; 4], kup: [f64; 4]) -> Self {
        EinsteinHelper {
            xup,
            kup,
            g: Metric::flat(),
            christoffel: Christoffel::default(),
            u: [0.0, 0.0, 0.0, 1.0],
            e: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            kup_tet: [0.0; 4],
            absopac: 0.0,
            scatopac: 0.0,
            ds_com: 0.0,
            dir_ind: [0; 3],
            z_ind: None,
            eas_ind: None,
        }
    }

    /// Lorentz factor of an Eulerian 3-velocity given in units of c.
    pub fn lorentz_factor(g: &Metric, v: [f64; 3]) -> TransportResult<f64> {
        let v2 = g.dot(v, v);
        if !v2.is_finite() || !(0.0..1.0).contains(&v2) {
            return Err(TransportError::PhysicsViolation(format!(
                "3-velocity must be subluminal, got v^2/c^2 = {v2}"
            )));
        }
        Ok(1.0 / (1.0 - v2).sqrt())
    }

    /// Fluid four-velocity from an Eulerian 3-velocity in cm/s.
    pub fn set_fourvel(&mut self, v_cms: [f64; 3]) -> TransportResult<()> {
        let v = [
            v_cms[0] / C_LIGHT_CGS,
            v_cms[1] / C_LIGHT_CGS,
            v_cms[2] / C_LIGHT_CGS,
        ];
        let w = Self::lorentz_factor(&self.g, v)?;
        let alpha = self.g.alpha;
        for i in 0..3 {
            self.u[i] = w * (v[i] - self.g.betaup[i] / alpha);
        }
        self.u[3] = w / alpha;
        Ok(())
    }

    /// Build an orthonormal tetrad whose timelike leg is the fluid velocity.
    pub fn set_tetrad_basis(&mut self, rotation: TetradRotation) -> TransportResult<()> {
        let mut e = [[0.0; 4]; 4];
        match rotation {
            TetradRotation::Cartesian => {
                e[0][0] = 1.0;
                e[1][1] = 1.0;
                e[2][2] = 1.0;
            }
            TetradRotation::Spherical => {
                let [x, y, z, _] = self.xup;
                let rp = (x * x + y * y).sqrt();
                if rp == 0.0 {
                    // On the z axis: radial along ±z, theta along x, phi along y.
                    e[0][2] = if z >= 0.0 { 1.0 } else { -1.0 };
                    e[1][0] = 1.0;
                    e[2][1] = 1.0;
                } else {
                    e[0] = [x, y, z, 0.0];
                    e[1] = [x * z, y * z, -rp * rp, 0.0];
                    e[2] = [-y, x, 0.0, 0.0];
                }
            }
        }

        e[3] = self.u;
        self.g.normalize(&mut e[3])?;
        for leg in 0..3 {
            let mut trial = e[leg];
            self.g.orthogonalize(&mut trial, &e[3]);
            for prev in 0..leg {
                self.g.orthogonalize(&mut trial, &e[prev]);
            }
            self.g.normalize(&mut trial)?;
            e[leg] = trial;
        }

        for a in 0..4 {
            for b in a..4 {
                let d = self.g.dot(e[a], e[b]);
                let expected = match (a == b, a) {
                    (false, _) => 0.0,
                    (true, 3) => -1.0,
                    (true, _) => 1.0,
                };
                if (d - expected).abs() > TINY {
                    return Err(TransportError::PhysicsViolation(format!(
                        "tetrad not orthonormal: e{a}.e{b} = {d}, expected {expected}"
                    )));
                }
            }
        }
        self.e = e;
        Ok(())
    }

    pub fn coord_to_tetrad(&self, kup_coord: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (mu, slot) in out.iter_mut().enumerate() {
            *slot = self.g.dot(kup_coord, self.e[mu]);
        }
        out[3] = -out[3];
        out
    }

    pub fn tetrad_to_coord(&self, kup_tet: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (mu, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|nu| kup_tet[nu] * self.e[nu][mu]).sum();
        }
        out
    }

    /// Set the wave vector from its tetrad components.
    pub fn set_kup_tet(&mut self, kup_tet: [f64; 4]) -> TransportResult<()> {
        if !(kup_tet[3] > 0.0) || kup_tet.iter().any(|k| !k.is_finite()) {
            return Err(TransportError::PhysicsViolation(format!(
                "tetrad wave vector needs finite components and k^t > 0, got {kup_tet:?}"
            )));
        }
        let null_err = Metric::dot_minkowski(&kup_tet, &kup_tet) / (kup_tet[3] * kup_tet[3]);
        if null_err.abs() > 1e-6 {
            return Err(TransportError::PhysicsViolation(format!(
                "tetrad wave vector is not null: relative norm {null_err}"
            )));
        }
        self.kup_tet = kup_tet;
        let mut kup = self.tetrad_to_coord(kup_tet);
        self.g.normalize_null(&mut kup)?;
        self.kup = kup;
        Ok(())
    }

    /// Re-impose the null condition under the current metric and refresh `kup_tet`.
    pub fn renormalize_kup(&mut self) -> TransportResult<()> {
        self.g.normalize_null(&mut self.kup)?;
        self.kup_tet = self.coord_to_tetrad(self.kup);
        Ok(())
    }

    /// Comoving frequency [Hz].
    pub fn comoving_frequency(&self) -> f64 {
        self.kup_tet[3] * C_LIGHT_CGS / (2.0 * PI)
    }

    pub fn scale_p_frequency(&mut self, scale: f64) {
        self.kup.iter_mut().for_each(|k| *k *= scale);
        self.kup_tet.iter_mut().for_each(|k| *k *= scale);
    }

    /// One forward-Euler step covering comoving length `ds_com`.
    pub fn integrate_geodesic(&mut self) -> TransportResult<()> {
        if !self.ds_com.is_finite() || self.ds_com < 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "ds_com must be finite and >= 0, got {}",
                self.ds_com
            )));
        }
        if !(self.kup_tet[3] > 0.0) {
            return Err(TransportError::PhysicsViolation(format!(
                "comoving wavenumber must be > 0, got {}",
                self.kup_tet[3]
            )));
        }
        let dlambda = self.ds_com / self.kup_tet[3];
        let accel = self.christoffel.contract2(self.kup);
        for i in 0..3 {
            self.kup[i] += accel[i] * dlambda;
        }
        for mu in 0..4 {
            self.xup[mu] += self.kup[mu] * dlambda;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::ThreeMetric;

    fn assert_orthonormal(eh: &EinsteinHelper) {
        for a in 0..4 {
            for b in 0..4 {
                let d = eh.g.dot(eh.e[a], eh.e[b]);
                let expected = if a != b {
                    0.0
                } else if a == 3 {
                    -1.0
                } else {
                    1.0
                };
                assert!((d - expected).abs() < 1e-10, "e{a}.e{b} = {d}");
            }
        }
    }

    #[test]
    fn test_static_fluid_flat_tetrad_is_identity() {
        let mut eh = EinsteinHelper::new([1.0, 2.0, 3.0, 0.0], [1.0, 0.0, 0.0, 1.0]);
        eh.set_fourvel([0.0; 3]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Cartesian).unwrap();
        for a in 0..4 {
            for b in 0..4 {
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((eh.e[a][b] - expected).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_moving_fluid_curved_tetrad_orthonormal() {
        let mut eh = EinsteinHelper::new([1.0, -2.0, 0.5, 0.0], [0.0; 4]);
        eh.g = Metric::curved(
            0.7,
            [0.05, 0.1, -0.02],
            ThreeMetric { xx: 1.4, yy: 1.2, zz: 1.1, xy: 0.05, xz: 0.02, yz: -0.03 },
        )
        .unwrap();
        eh.set_fourvel([0.3 * C_LIGHT_CGS, -0.2 * C_LIGHT_CGS, 0.1 * C_LIGHT_CGS])
            .unwrap();
        assert!((eh.g.dot(eh.u, eh.u) + 1.0).abs() < 1e-12);
        eh.set_tetrad_basis(TetradRotation::Spherical).unwrap();
        assert_orthonormal(&eh);
    }

    #[test]
    fn test_spherical_on_axis() {
        let mut eh = EinsteinHelper::new([0.0, 0.0, -4.0, 0.0], [0.0; 4]);
        eh.set_fourvel([0.0; 3]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Spherical).unwrap();
        assert_eq!(eh.e[0], [0.0, 0.0, -1.0, 0.0]);
        assert_orthonormal(&eh);
    }

    #[test]
    fn test_superluminal_velocity_rejected() {
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        let err = eh.set_fourvel([1.1 * C_LIGHT_CGS, 0.0, 0.0]).unwrap_err();
        match err {
            TransportError::PhysicsViolation(msg) => assert!(msg.contains("subluminal")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tetrad_roundtrip_and_frequency() {
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        eh.set_fourvel([0.5 * C_LIGHT_CGS, 0.0, 0.0]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Cartesian).unwrap();
        let nu = 1.0e20;
        let k = 2.0 * PI * nu / C_LIGHT_CGS;
        eh.set_kup_tet([0.0, k, 0.0, k]).unwrap();
        assert!(eh.g.dot(eh.kup, eh.kup).abs() < 1e-12 * k * k);
        let back = eh.coord_to_tetrad(eh.kup);
        for i in 0..4 {
            assert!((back[i] - eh.kup_tet[i]).abs() < 1e-12 * k);
        }
        assert!((eh.comoving_frequency() / nu - 1.0).abs() < 1e-12);
        // Transverse emission is boosted by W in the lab frame.
        let w = 1.0 / (1.0f64 - 0.25).sqrt();
        assert!((eh.kup[3] / k - w).abs() < 1e-12);
    }

    #[test]
    fn test_set_kup_tet_rejects_non_null() {
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        eh.set_fourvel([0.0; 3]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Cartesian).unwrap();
        assert!(eh.set_kup_tet([1.0, 0.0, 0.0, 2.0]).is_err());
        assert!(eh.set_kup_tet([1.0, 0.0, 0.0, -1.0]).is_err());
    }

    #[test]
    fn test_scale_frequency() {
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        eh.set_fourvel([0.0; 3]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Cartesian).unwrap();
        eh.set_kup_tet([0.0, 0.0, 2.0, 2.0]).unwrap();
        eh.scale_p_frequency(0.5);
        assert_eq!(eh.kup_tet[3], 1.0);
        assert_eq!(eh.kup[3], 1.0);
    }

    #[test]
    fn test_flat_geodesic_is_straight() {
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        eh.set_fourvel([0.0; 3]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Cartesian).unwrap();
        eh.set_kup_tet([3.0, 4.0, 0.0, 5.0]).unwrap();
        eh.ds_com = 10.0;
        eh.integrate_geodesic().unwrap();
        assert!((eh.xup[0] - 6.0).abs() < 1e-12);
        assert!((eh.xup[1] - 8.0).abs() < 1e-12);
        assert!((eh.xup[3] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_geodesic_falls_in_uniform_field() {
        let grav = 1e-4;
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        eh.set_fourvel([0.0; 3]).unwrap();
        eh.set_tetrad_basis(TetradRotation::Cartesian).unwrap();
        eh.set_kup_tet([0.0, 1.0, 0.0, 1.0]).unwrap();
        eh.christoffel = Christoffel::from_metric_derivatives(
            &eh.g,
            [grav, 0.0, 0.0],
            [[0.0; 3]; 3],
            [ThreeMetric::zero(); 3],
        )
        .unwrap();
        eh.ds_com = 1.0;
        eh.integrate_geodesic().unwrap();
        assert!(eh.kup[0] < 0.0);
        assert!(eh.xup[0] < 0.0);
    }

    #[test]
    fn test_integrate_rejects_negative_step() {
        let mut eh = EinsteinHelper::new([0.0; 4], [0.0; 4]);
        eh.kup_tet = [1.0, 0.0, 0.0, 1.0];
        eh.ds_com = -1.0;
        assert!(eh.integrate_geodesic().is_err());
    }
}

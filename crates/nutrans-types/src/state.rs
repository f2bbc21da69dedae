// ─────────────────────────────────────────────────────────────────────
// Nutrans — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{Array1, Array2};

use crate::error::{TransportError, TransportResult};

/// Per-zone fluid state, owned by a grid and indexed by flat zone id.
/// Velocities are Eulerian 3-velocities in cm/s in the grid's own basis:
/// (v_r, -, -) for spheres, (v_r, v_phi, v_z) for cylinders and
/// (v_x, v_y, v_z) for Cartesian boxes.
#[derive(Debug, Clone)]
pub struct FluidState {
    pub rho: Array1<f64>,         // Rest-mass density [g/cm^3]
    pub temperature: Array1<f64>, // [K]
    pub ye: Array1<f64>,          // Electron fraction
    pub velocity: Array2<f64>,    // [n_zones, 3], cm/s
}

impl FluidState {
    /// Static fluid with the same thermodynamic state in every zone.
    pub fn uniform(n_zones: usize, rho: f64, temperature: f64, ye: f64) -> Self {
        FluidState {
            rho: Array1::from_elem(n_zones, rho),
            temperature: Array1::from_elem(n_zones, temperature),
            ye: Array1::from_elem(n_zones, ye),
            velocity: Array2::zeros((n_zones, 3)),
        }
    }

    pub fn from_arrays(
        rho: Array1<f64>,
        temperature: Array1<f64>,
        ye: Array1<f64>,
        velocity: Array2<f64>,
    ) -> TransportResult<Self> {
        let state = FluidState {
            rho,
            temperature,
            ye,
            velocity,
        };
        state.validate(state.rho.len())?;
        Ok(state)
    }

    pub fn n_zones(&self) -> usize {
        self.rho.len()
    }

    pub fn validate(&self, n_zones: usize) -> TransportResult<()> {
        if self.rho.len() != n_zones
            || self.temperature.len() != n_zones
            || self.ye.len() != n_zones
            || self.velocity.dim() != (n_zones, 3)
        {
            return Err(TransportError::PhysicsViolation(format!(
                "fluid state shape mismatch: rho={}, T={}, ye={}, v={:?}, expected n_zones={n_zones}",
                self.rho.len(),
                self.temperature.len(),
                self.ye.len(),
                self.velocity.dim()
            )));
        }
        if self.rho.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(TransportError::PhysicsViolation(
                "fluid rho must be finite and >= 0".to_string(),
            ));
        }
        if self.temperature.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(TransportError::PhysicsViolation(
                "fluid temperature must be finite and >= 0".to_string(),
            ));
        }
        if self.ye.iter().any(|v| !v.is_finite() || !(0.0..=1.0).contains(v)) {
            return Err(TransportError::PhysicsViolation(
                "fluid ye must lie in [0, 1]".to_string(),
            ));
        }
        if self.velocity.iter().any(|v| !v.is_finite()) {
            return Err(TransportError::PhysicsViolation(
                "fluid velocity must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn zone_velocity(&self, z: usize) -> [f64; 3] {
        [
            self.velocity[[z, 0]],
            self.velocity[[z, 1]],
            self.velocity[[z, 2]],
        ]
    }
}

/// Lapse, shift and spatial metric per zone.
/// `three_metric` columns are ordered xx, yy, zz, xy, xz, yz.
#[derive(Debug, Clone)]
pub struct SpacetimeFields {
    pub lapse: Array1<f64>,        // [n_zones]
    pub shift: Array2<f64>,        // [n_zones, 3], contravariant, units of c
    pub three_metric: Array2<f64>, // [n_zones, 6], covariant
}

impl SpacetimeFields {
    /// Minkowski values everywhere.
    pub fn flat(n_zones: usize) -> Self {
        let mut three_metric = Array2::zeros((n_zones, 6));
        for z in 0..n_zones {
            for d in 0..3 {
                three_metric[[z, d]] = 1.0;
            }
        }
        SpacetimeFields {
            lapse: Array1::ones(n_zones),
            shift: Array2::zeros((n_zones, 3)),
            three_metric,
        }
    }

    pub fn from_arrays(
        lapse: Array1<f64>,
        shift: Array2<f64>,
        three_metric: Array2<f64>,
    ) -> TransportResult<Self> {
        let fields = SpacetimeFields {
            lapse,
            shift,
            three_metric,
        };
        fields.validate(fields.lapse.len())?;
        Ok(fields)
    }

    pub fn n_zones(&self) -> usize {
        self.lapse.len()
    }

    pub fn validate(&self, n_zones: usize) -> TransportResult<()> {
        if self.lapse.len() != n_zones
            || self.shift.dim() != (n_zones, 3)
            || self.three_metric.dim() != (n_zones, 6)
        {
            return Err(TransportError::DegenerateMetric(format!(
                "spacetime field shape mismatch: lapse={}, shift={:?}, three_metric={:?}, expected n_zones={n_zones}",
                self.lapse.len(),
                self.shift.dim(),
                self.three_metric.dim()
            )));
        }
        for z in 0..n_zones {
            let alpha = self.lapse[z];
            if !alpha.is_finite() || alpha <= 0.0 {
                return Err(TransportError::DegenerateMetric(format!(
                    "zone {z} lapse must be finite and > 0, got {alpha}"
                )));
            }
            if (0..3).any(|d| !self.shift[[z, d]].is_finite()) {
                return Err(TransportError::DegenerateMetric(format!(
                    "zone {z} shift must be finite"
                )));
            }
            let g = self.zone_three_metric(z);
            if g.iter().any(|v| !v.is_finite()) {
                return Err(TransportError::DegenerateMetric(format!(
                    "zone {z} three-metric must be finite"
                )));
            }
            // Sylvester's criterion on the leading minors.
            let [xx, yy, zz, xy, xz, yz] = g;
            let m2 = xx * yy - xy * xy;
            let det = xx * (yy * zz - yz * yz) - xy * (xy * zz - yz * xz) + xz * (xy * yz - yy * xz);
            if xx <= 0.0 || m2 <= 0.0 || det <= 0.0 {
                return Err(TransportError::DegenerateMetric(format!(
                    "zone {z} three-metric must be positive definite, got {g:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn zone_shift(&self, z: usize) -> [f64; 3] {
        [self.shift[[z, 0]], self.shift[[z, 1]], self.shift[[z, 2]]]
    }

    pub fn zone_three_metric(&self, z: usize) -> [f64; 6] {
        let mut out = [0.0; 6];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = self.three_metric[[z, c]];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_fluid_shapes() {
        let fluid = FluidState::uniform(12, 1.0e10, 1.0e11, 0.3);
        assert_eq!(fluid.n_zones(), 12);
        assert_eq!(fluid.velocity.dim(), (12, 3));
        assert!(fluid.validate(12).is_ok());
        assert!(fluid.validate(11).is_err());
        assert_eq!(fluid.zone_velocity(4), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fluid_rejects_bad_ye() {
        let err = FluidState::from_arrays(
            Array1::ones(2),
            Array1::ones(2),
            Array1::from_vec(vec![0.2, 1.5]),
            Array2::zeros((2, 3)),
        )
        .unwrap_err();
        match err {
            TransportError::PhysicsViolation(msg) => assert!(msg.contains("ye")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_flat_spacetime_is_valid() {
        let fields = SpacetimeFields::flat(5);
        assert!(fields.validate(5).is_ok());
        assert_eq!(fields.zone_three_metric(2), [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(fields.zone_shift(2), [0.0; 3]);
    }

    #[test]
    fn test_spacetime_rejects_indefinite_metric() {
        let mut three_metric = Array2::zeros((1, 6));
        three_metric[[0, 0]] = 1.0;
        three_metric[[0, 1]] = 1.0;
        three_metric[[0, 2]] = 1.0;
        three_metric[[0, 3]] = 2.0; // |xy| > sqrt(xx*yy)
        let err =
            SpacetimeFields::from_arrays(Array1::ones(1), Array2::zeros((1, 3)), three_metric)
                .unwrap_err();
        match err {
            TransportError::DegenerateMetric(msg) => assert!(msg.contains("positive definite")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_spacetime_rejects_zero_lapse() {
        let mut fields = SpacetimeFields::flat(3);
        fields.lapse[1] = 0.0;
        assert!(fields.validate(3).is_err());
    }
}

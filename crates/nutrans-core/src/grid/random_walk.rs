//! Diffusion super-step radius for optically thick zones.
//!
//! A random-walk sphere of comoving radius `R` takes `t = 3κR²/(π²c)` to
//! escape by diffusion. While it diffuses the fluid carries it `βct` toward
//! the nearest face, so the largest safe radius solves
//! `R + (3βκ/π²) R² = d` for face distance `d`.

use std::f64::consts::PI;

use nutrans_types::error::{TransportError, TransportResult};

use crate::metric::Metric;

/// Largest sphere radius that stays inside a face `dist_com` away while
/// the fluid moves toward it at `beta_toward_face` (units of c).
pub fn randomwalk_radius(beta_toward_face: f64, dist_com: f64, scatopac: f64) -> f64 {
    let d = dist_com.max(0.0);
    let a = 3.0 * beta_toward_face * scatopac / (PI * PI);
    if !(a > 0.0) || d == 0.0 {
        return d;
    }
    // Rationalised root of a R^2 + R - d = 0, stable for small a.
    2.0 * d / (1.0 + (1.0 + 4.0 * a * d).sqrt())
}

/// Radius limited by one face lying `dist_lab` coordinate lengths away
/// along the coordinate-unit direction `dir`.
pub fn face_radius(
    g: &Metric,
    u: &[f64; 4],
    dir: [f64; 3],
    dist_lab: f64,
    scatopac: f64,
) -> TransportResult<f64> {
    let mut ktest = [dir[0], dir[1], dir[2], 0.0];
    g.normalize_null(&mut ktest)?;
    let kup_tet_t = -g.dot(ktest, *u);
    if !(kup_tet_t > 0.0) {
        return Err(TransportError::PhysicsViolation(format!(
            "random-walk test vector has non-positive comoving energy {kup_tet_t}"
        )));
    }
    let dist_com = dist_lab.max(0.0) * kup_tet_t;
    let beta = (u[0] * dir[0] + u[1] * dir[1] + u[2] * dir[2]) / u[3];
    Ok(randomwalk_radius(beta, dist_com, scatopac))
}

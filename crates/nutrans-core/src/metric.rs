// ─────────────────────────────────────────────────────────────────────
// Nutrans — Metric
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Local 3+1 spacetime metric and stationary connection coefficients.
//!
//! 4-vectors are stored `[x, y, z, t]` with time at index 3. The metric is
//! held in ADM form: lapse `alpha`, contravariant shift `betaup` and the
//! covariant spatial metric `gammalow`.

use nutrans_types::error::{TransportError, TransportResult};

/// Symmetric covariant 3x3 spatial metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeMetric {
    pub xx: f64,
    pub yy: f64,
    pub zz: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
}

impl Default for ThreeMetric {
    fn default() -> Self {
        Self::identity()
    }
}

impl ThreeMetric {
    pub fn identity() -> Self {
        ThreeMetric {
            xx: 1.0,
            yy: 1.0,
            zz: 1.0,
            xy: 0.0,
            xz: 0.0,
            yz: 0.0,
        }
    }

    pub fn zero() -> Self {
        Self::from_array([0.0; 6])
    }

    /// Components ordered xx, yy, zz, xy, xz, yz.
    pub fn from_array(c: [f64; 6]) -> Self {
        ThreeMetric {
            xx: c[0],
            yy: c[1],
            zz: c[2],
            xy: c[3],
            xz: c[4],
            yz: c[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.xx, self.yy, self.zz, self.xy, self.xz, self.yz]
    }

    pub fn component(&self, i: usize, j: usize) -> f64 {
        match (i.min(j), i.max(j)) {
            (0, 0) => self.xx,
            (1, 1) => self.yy,
            (2, 2) => self.zz,
            (0, 1) => self.xy,
            (0, 2) => self.xz,
            (1, 2) => self.yz,
            _ => 0.0,
        }
    }

    pub fn det(&self) -> f64 {
        self.xx * (self.yy * self.zz - self.yz * self.yz)
            - self.xy * (self.xy * self.zz - self.yz * self.xz)
            + self.xz * (self.xy * self.yz - self.yy * self.xz)
    }

    pub fn is_positive_definite(&self) -> bool {
        self.xx > 0.0 && self.xx * self.yy - self.xy * self.xy > 0.0 && self.det() > 0.0
    }

    /// Contravariant inverse via the adjugate.
    pub fn inverse(&self) -> TransportResult<ThreeMetric> {
        let det = self.det();
        if !det.is_finite() || det <= 0.0 {
            return Err(TransportError::DegenerateMetric(format!(
                "three-metric determinant must be finite and > 0, got {det}"
            )));
        }
        let inv = 1.0 / det;
        Ok(ThreeMetric {
            xx: (self.yy * self.zz - self.yz * self.yz) * inv,
            yy: (self.xx * self.zz - self.xz * self.xz) * inv,
            zz: (self.xx * self.yy - self.xy * self.xy) * inv,
            xy: (self.xz * self.yz - self.xy * self.zz) * inv,
            xz: (self.xy * self.yz - self.xz * self.yy) * inv,
            yz: (self.xy * self.xz - self.xx * self.yz) * inv,
        })
    }

    pub fn lower(&self, v: [f64; 3]) -> [f64; 3] {
        [
            self.xx * v[0] + self.xy * v[1] + self.xz * v[2],
            self.xy * v[0] + self.yy * v[1] + self.yz * v[2],
            self.xz * v[0] + self.yz * v[1] + self.zz * v[2],
        ]
    }

    pub fn dot(&self, a: [f64; 3], b: [f64; 3]) -> f64 {
        let low = self.lower(a);
        low[0] * b[0] + low[1] * b[1] + low[2] * b[2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    pub alpha: f64,
    pub betaup: [f64; 3],
    pub gammalow: ThreeMetric,
    betalow: [f64; 3],
    gammaup: ThreeMetric,
    gtt: f64,
}

impl Default for Metric {
    fn default() -> Self {
        Self::flat()
    }
}

impl Metric {
    /// Minkowski metric.
    pub fn flat() -> Self {
        Metric {
            alpha: 1.0,
            betaup: [0.0; 3],
            gammalow: ThreeMetric::identity(),
            betalow: [0.0; 3],
            gammaup: ThreeMetric::identity(),
            gtt: -1.0,
        }
    }

    pub fn curved(alpha: f64, betaup: [f64; 3], gammalow: ThreeMetric) -> TransportResult<Self> {
        let mut g = Self::flat();
        g.alpha = alpha;
        g.betaup = betaup;
        g.gammalow = gammalow;
        g.update()?;
        Ok(g)
    }

    /// Recompute derived quantities after `alpha`, `betaup` or `gammalow` change.
    pub fn update(&mut self) -> TransportResult<()> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(TransportError::DegenerateMetric(format!(
                "lapse must be finite and > 0, got {}",
                self.alpha
            )));
        }
        if self.betaup.iter().any(|b| !b.is_finite()) {
            return Err(TransportError::DegenerateMetric(
                "shift must be finite".to_string(),
            ));
        }
        if !self.gammalow.is_positive_definite() {
            return Err(TransportError::DegenerateMetric(format!(
                "three-metric must be positive definite, got {:?}",
                self.gammalow
            )));
        }
        self.gammaup = self.gammalow.inverse()?;
        self.betalow = self.gammalow.lower(self.betaup);
        self.gtt = -self.alpha * self.alpha + dot3(self.betalow, self.betaup);
        Ok(())
    }

    pub fn gtt(&self) -> f64 {
        self.gtt
    }

    pub fn betalow(&self) -> [f64; 3] {
        self.betalow
    }

    pub fn gammaup(&self) -> ThreeMetric {
        self.gammaup
    }

    /// Covariant 4-metric component `g_ab`.
    pub fn component(&self, a: usize, b: usize) -> f64 {
        match (a, b) {
            (3, 3) => self.gtt,
            (3, i) | (i, 3) => self.betalow[i],
            (i, j) => self.gammalow.component(i, j),
        }
    }

    /// Contravariant 4-metric component `g^ab`.
    pub fn inverse_component(&self, a: usize, b: usize) -> f64 {
        let ia2 = 1.0 / (self.alpha * self.alpha);
        match (a, b) {
            (3, 3) => -ia2,
            (3, i) | (i, 3) => self.betaup[i] * ia2,
            (i, j) => self.gammaup.component(i, j) - self.betaup[i] * self.betaup[j] * ia2,
        }
    }

    /// Lower a 3-vector with the spatial metric or a 4-vector with the full metric.
    pub fn lower<const N: usize>(&self, v: [f64; N]) -> [f64; N] {
        let mut out = [0.0; N];
        if N == 4 {
            let t = N - 1;
            let spatial = self.gammalow.lower([v[0], v[1], v[2]]);
            for i in 0..3 {
                out[i] = spatial[i] + self.betalow[i] * v[t];
            }
            out[t] = self.gtt * v[t] + dot3(self.betalow, [v[0], v[1], v[2]]);
        } else {
            for i in 0..N.min(3) {
                out[i] = (0..N.min(3))
                    .map(|j| self.gammalow.component(i, j) * v[j])
                    .sum();
            }
        }
        out
    }

    /// Raise a covector with the ADM inverse metric.
    pub fn raise4(&self, w: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (a, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|b| self.inverse_component(a, b) * w[b]).sum();
        }
        out
    }

    pub fn dot<const N: usize>(&self, a: [f64; N], b: [f64; N]) -> f64 {
        let low = self.lower(a);
        low.iter().zip(b.iter()).map(|(l, x)| l * x).sum()
    }

    /// Projection onto the Eulerian observer, `-n_a v^a = alpha v^t`.
    pub fn ndot(&self, v: [f64; 4]) -> f64 {
        self.alpha * v[3]
    }

    /// Rescale to unit norm, keeping the sign of the norm.
    pub fn normalize<const N: usize>(&self, x: &mut [f64; N]) -> TransportResult<()> {
        let norm2 = self.dot(*x, *x);
        scale_to_unit(x, norm2)
    }

    /// Replace the time component so that `x` is null and future pointing.
    pub fn normalize_null(&self, x: &mut [f64; 4]) -> TransportResult<()> {
        let spatial = [x[0], x[1], x[2]];
        let a = self.gtt;
        let b = 2.0 * dot3(self.betalow, spatial);
        let c = self.gammalow.dot(spatial, spatial);
        if a >= 0.0 {
            return Err(TransportError::DegenerateMetric(format!(
                "g_tt must be < 0 to complete a null vector, got {a}"
            )));
        }
        if !c.is_finite() || c <= 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "null completion needs a non-zero finite spatial part, got {spatial:?}"
            )));
        }
        let disc = b * b - 4.0 * a * c;
        x[3] = (-b - disc.sqrt()) / (2.0 * a);
        Ok(())
    }

    /// One Gram-Schmidt step: remove the component of `v` along `e`.
    pub fn orthogonalize<const N: usize>(&self, v: &mut [f64; N], e: &[f64; N]) {
        let ee = self.dot(*e, *e);
        if ee == 0.0 {
            return;
        }
        let proj = self.dot(*v, *e) / ee;
        for (vi, ei) in v.iter_mut().zip(e.iter()) {
            *vi -= proj * ei;
        }
    }

    pub fn dot_minkowski<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
        let spatial: f64 = (0..N.min(3)).map(|i| a[i] * b[i]).sum();
        if N == 4 {
            spatial - a[N - 1] * b[N - 1]
        } else {
            spatial
        }
    }

    pub fn normalize_minkowski<const N: usize>(x: &mut [f64; N]) -> TransportResult<()> {
        let norm2 = Self::dot_minkowski(x, x);
        scale_to_unit(x, norm2)
    }

    pub fn normalize_null_minkowski(x: &mut [f64; 4]) -> TransportResult<()> {
        let r = (x[0] * x[0] + x[1] * x[1] + x[2] * x[2]).sqrt();
        if !r.is_finite() || r == 0.0 {
            return Err(TransportError::PhysicsViolation(
                "null completion needs a non-zero finite spatial part".to_string(),
            ));
        }
        x[3] = r;
        Ok(())
    }
}

fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn scale_to_unit<const N: usize>(x: &mut [f64; N], norm2: f64) -> TransportResult<()> {
    if !norm2.is_finite() || norm2 == 0.0 {
        return Err(TransportError::PhysicsViolation(format!(
            "cannot normalize a vector with norm {norm2}"
        )));
    }
    let inv = 1.0 / norm2.abs().sqrt();
    x.iter_mut().for_each(|v| *v *= inv);
    Ok(())
}

/// Lower-pair slots: xx, yy, zz, xy, xz, yz, tt, xt, yt, zt.
const PAIR: [[usize; 4]; 4] = [[0, 3, 4, 7], [3, 1, 5, 8], [4, 5, 2, 9], [7, 8, 9, 6]];

/// Connection coefficients `Γ^a_{μν}` for spatial `a`, symmetric in `μν`.
/// Entries with a time upper index are not stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Christoffel {
    pub data: [f64; 30],
}

impl Default for Christoffel {
    fn default() -> Self {
        Christoffel { data: [0.0; 30] }
    }
}

impl Christoffel {
    pub fn index(a: usize, mu: usize, nu: usize) -> Option<usize> {
        if a >= 3 || mu >= 4 || nu >= 4 {
            return None;
        }
        Some(a * 10 + PAIR[mu][nu])
    }

    pub fn get(&self, a: usize, mu: usize, nu: usize) -> f64 {
        Self::index(a, mu, nu).map_or(0.0, |i| self.data[i])
    }

    /// Geodesic acceleration `-Γ^a_{μν} k^μ k^ν` for the spatial components.
    pub fn contract2(&self, k: [f64; 4]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (a, slot) in out.iter_mut().enumerate() {
            let g = &self.data[a * 10..a * 10 + 10];
            let diag = g[0] * k[0] * k[0]
                + g[1] * k[1] * k[1]
                + g[2] * k[2] * k[2]
                + g[6] * k[3] * k[3];
            let off = g[3] * k[0] * k[1]
                + g[4] * k[0] * k[2]
                + g[5] * k[1] * k[2]
                + g[7] * k[0] * k[3]
                + g[8] * k[1] * k[3]
                + g[9] * k[2] * k[3];
            *slot = -(diag + 2.0 * off);
        }
        out
    }

    /// Stationary connection from the metric and its spatial gradients.
    /// `dbetaup[d]` and `dgamma[d]` are derivatives along coordinate `d`.
    pub fn from_metric_derivatives(
        g: &Metric,
        dalpha: [f64; 3],
        dbetaup: [[f64; 3]; 3],
        dgamma: [ThreeMetric; 3],
    ) -> TransportResult<Self> {
        let finite = dalpha.iter().all(|v| v.is_finite())
            && dbetaup.iter().flatten().all(|v| v.is_finite())
            && dgamma
                .iter()
                .all(|m| m.to_array().iter().all(|v| v.is_finite()));
        if !finite {
            return Err(TransportError::DegenerateMetric(
                "metric derivatives must be finite".to_string(),
            ));
        }

        // dg[d][mu][nu] = ∂_d g_{mu nu}; time derivatives vanish.
        let mut dg = [[[0.0; 4]; 4]; 4];
        for d in 0..3 {
            let dbetalow: [f64; 3] = {
                let from_gamma = dgamma[d].lower(g.betaup);
                let from_shift = g.gammalow.lower(dbetaup[d]);
                [
                    from_gamma[0] + from_shift[0],
                    from_gamma[1] + from_shift[1],
                    from_gamma[2] + from_shift[2],
                ]
            };
            for i in 0..3 {
                for j in 0..3 {
                    dg[d][i][j] = dgamma[d].component(i, j);
                }
                dg[d][i][3] = dbetalow[i];
                dg[d][3][i] = dbetalow[i];
            }
            dg[d][3][3] = -2.0 * g.alpha * dalpha[d]
                + dot3(dbetalow, g.betaup)
                + dot3(g.betalow, dbetaup[d]);
        }

        let mut out = Christoffel::default();
        for a in 0..3 {
            for mu in 0..4 {
                for nu in mu..4 {
                    let value: f64 = (0..4)
                        .map(|b| {
                            g.inverse_component(a, b)
                                * (dg[mu][b][nu] + dg[nu][mu][b] - dg[b][mu][nu])
                        })
                        .sum();
                    out.data[a * 10 + PAIR[mu][nu]] = 0.5 * value;
                }
            }
        }
        Ok(out)
    }
}

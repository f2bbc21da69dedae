// ─────────────────────────────────────────────────────────────────────
// Nutrans — CDF Array
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Tabulated cumulative distribution over an [`Axis`], inverted for
//! Monte Carlo sampling of bins and continuous values.
//!
//! Values are filled as raw (non-cumulative) weights with `set_value`, then
//! `normalize` turns them into a CDF ending at exactly 1. Sampling takes a
//! uniform draw `z` in `[0, 1)`.

use nutrans_types::error::{TransportError, TransportResult};
use rand::Rng;
use tracing::debug;

use crate::axis::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationOrder {
    /// Sampled values sit at bin centres.
    Constant,
    /// Uniform within the located bin.
    Linear,
    /// Monotone cubic Hermite through the inverse CDF.
    Cubic,
}

impl InterpolationOrder {
    pub fn from_order(order: u8) -> TransportResult<Self> {
        match order {
            0 => Ok(InterpolationOrder::Constant),
            1 => Ok(InterpolationOrder::Linear),
            2 => Ok(InterpolationOrder::Cubic),
            _ => Err(TransportError::InvalidCdf(format!(
                "interpolation order must be 0, 1 or 2, got {order}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CdfArray {
    order: InterpolationOrder,
    y: Vec<f64>,
    norm: f64,
    normalized: bool,
}

impl CdfArray {
    pub fn new(order: InterpolationOrder) -> Self {
        CdfArray {
            order,
            y: Vec::new(),
            norm: 0.0,
            normalized: false,
        }
    }

    pub fn with_len(order: InterpolationOrder, n: usize) -> Self {
        let mut cdf = Self::new(order);
        cdf.resize(n);
        cdf
    }

    pub fn resize(&mut self, n: usize) {
        self.y.resize(n, 0.0);
        self.normalized = false;
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn order(&self) -> InterpolationOrder {
        self.order
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Sum of the raw weights that survived the cutoff.
    pub fn normalization(&self) -> f64 {
        self.norm
    }

    /// Stored value: raw weight before `normalize`, cumulative after.
    ///
    /// # Panics
    /// If `i >= len()`.
    pub fn get(&self, i: usize) -> f64 {
        self.y[i]
    }

    /// Overwrites the stored value directly and marks the table as raw
    /// weights again, so the next `normalize` rebuilds it.
    ///
    /// # Panics
    /// If `i >= len()`. `set_value` is the checked form.
    pub fn set(&mut self, i: usize, value: f64) {
        self.y[i] = value;
        self.normalized = false;
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    /// Store a raw (non-cumulative) weight for bin `i`.
    pub fn set_value(&mut self, i: usize, raw: f64) -> TransportResult<()> {
        if i >= self.y.len() {
            return Err(TransportError::InvalidCdf(format!(
                "set_value index {i} out of range for {} bins",
                self.y.len()
            )));
        }
        if !raw.is_finite() || raw < 0.0 {
            return Err(TransportError::InvalidCdf(format!(
                "raw weight for bin {i} must be finite and >= 0, got {raw}"
            )));
        }
        self.y[i] = raw;
        self.normalized = false;
        Ok(())
    }

    /// Raw weight of bin `i`, recovered from the CDF once normalized.
    pub fn get_value(&self, i: usize) -> f64 {
        if !self.normalized {
            return self.y[i];
        }
        let below = if i == 0 { 0.0 } else { self.y[i - 1] };
        (self.y[i] - below) * self.norm
    }

    /// Reset every bin to zero weight.
    pub fn wipe(&mut self) {
        self.y.iter_mut().for_each(|v| *v = 0.0);
        self.norm = 0.0;
        self.normalized = false;
    }

    /// Convert raw weights into a CDF ending at exactly 1.
    ///
    /// Weights contributing less than `cutoff` of the total are dropped.
    /// An all-zero table becomes uniform.
    pub fn normalize(&mut self, cutoff: f64) -> TransportResult<()> {
        if self.normalized {
            return Ok(());
        }
        if self.y.is_empty() {
            return Err(TransportError::InvalidCdf(
                "cannot normalize an empty CDF".to_string(),
            ));
        }
        if !cutoff.is_finite() || !(0.0..1.0).contains(&cutoff) {
            return Err(TransportError::InvalidCdf(format!(
                "cutoff must lie in [0, 1), got {cutoff}"
            )));
        }
        if let Some((i, v)) = self
            .y
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(TransportError::InvalidCdf(format!(
                "raw weight for bin {i} must be finite and >= 0, got {v}"
            )));
        }

        let mut total: f64 = self.y.iter().sum();
        if total <= 0.0 {
            debug!(bins = self.y.len(), "all-zero CDF weights, using uniform fallback");
            self.y.iter_mut().for_each(|v| *v = 1.0);
            total = self.y.len() as f64;
        }

        if cutoff > 0.0 {
            let kept: f64 = self.y.iter().filter(|&&v| v / total >= cutoff).sum();
            if kept > 0.0 {
                self.y
                    .iter_mut()
                    .filter(|v| **v / total < cutoff)
                    .for_each(|v| *v = 0.0);
                total = kept;
            } else {
                debug!(cutoff, "cutoff would remove every bin, keeping all weights");
            }
        }

        let mut running = 0.0;
        for v in self.y.iter_mut() {
            running += *v;
            *v = (running / total).min(1.0);
        }
        if let Some(last) = self.y.last_mut() {
            *last = 1.0;
        }
        self.norm = total;
        self.normalized = true;
        Ok(())
    }

    fn check_draw(&self, z: f64) -> TransportResult<()> {
        if !self.normalized {
            return Err(TransportError::InvalidCdf(
                "CDF must be normalized before sampling".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&z) {
            return Err(TransportError::InvalidCdf(format!(
                "uniform draw must lie in [0, 1), got {z}"
            )));
        }
        Ok(())
    }

    fn check_axis(&self, axis: &Axis) -> TransportResult<()> {
        if axis.size() != self.y.len() {
            return Err(TransportError::InvalidCdf(format!(
                "axis has {} bins but CDF has {}",
                axis.size(),
                self.y.len()
            )));
        }
        Ok(())
    }

    fn lower(&self, i: usize) -> f64 {
        if i == 0 {
            0.0
        } else {
            self.y[i - 1]
        }
    }

    /// Bin `i` with `y[i-1] <= z < y[i]`, so zero-weight bins are never drawn.
    pub fn get_index(&self, z: f64) -> TransportResult<usize> {
        self.check_draw(z)?;
        Ok(self.y.partition_point(|&v| v <= z))
    }

    fn bin_for(&self, z: f64, hint: Option<usize>) -> TransportResult<usize> {
        match hint {
            None => self.get_index(z),
            Some(i) => {
                self.check_draw(z)?;
                if i >= self.y.len() || z < self.lower(i) || z > self.y[i] {
                    return Err(TransportError::InvalidCdf(format!(
                        "hint bin {i} does not bracket z={z}"
                    )));
                }
                Ok(i)
            }
        }
    }

    /// Continuous value from a draw, uniform within the located bin.
    pub fn invert_linear(&self, z: f64, axis: &Axis, hint: Option<usize>) -> TransportResult<f64> {
        self.check_axis(axis)?;
        let i = self.bin_for(z, hint)?;
        Ok(self.linear_in_bin(z, axis, i))
    }

    fn linear_in_bin(&self, z: f64, axis: &Axis, i: usize) -> f64 {
        let y0 = self.lower(i);
        let y1 = self.y[i];
        let x0 = axis.bottom(i);
        let x1 = axis.top(i);
        if y1 <= y0 {
            return x0;
        }
        let x = x0 + (z - y0) / (y1 - y0) * (x1 - x0);
        x.clamp(x0, x1)
    }

    /// Continuous value from a draw using a monotone cubic Hermite fit of
    /// the inverse CDF. Falls back to linear when a neighbouring bin carries
    /// no weight or the cubic leaves the bin.
    pub fn invert_cubic(&self, z: f64, axis: &Axis, hint: Option<usize>) -> TransportResult<f64> {
        self.check_axis(axis)?;
        let i = self.bin_for(z, hint)?;
        let n = self.y.len();

        // Nodes k = 0..=n at (Y_k, X_k); bin i spans nodes i and i + 1.
        let node_y = |k: usize| if k == 0 { 0.0 } else { self.y[k - 1] };
        let node_x = |k: usize| if k == 0 { axis.min() } else { axis.top(k - 1) };
        let secant = |k: usize| (node_x(k + 1) - node_x(k)) / (node_y(k + 1) - node_y(k));

        let s = secant(i);
        let s_left = if i > 0 { secant(i - 1) } else { s };
        let s_right = if i + 1 < n { secant(i + 1) } else { s };
        if !s.is_finite() || !s_left.is_finite() || !s_right.is_finite() {
            debug!(bin = i, "cubic CDF inversion ill-conditioned, using linear");
            return Ok(self.linear_in_bin(z, axis, i));
        }

        let mut m0 = 0.5 * (s_left + s);
        let mut m1 = 0.5 * (s + s_right);
        // Fritsch-Carlson limiter keeps x(y) monotone on this interval.
        let a = m0 / s;
        let b = m1 / s;
        let r2 = a * a + b * b;
        if r2 > 9.0 {
            let tau = 3.0 / r2.sqrt();
            m0 = tau * a * s;
            m1 = tau * b * s;
        }

        let y0 = node_y(i);
        let h = node_y(i + 1) - y0;
        let t = (z - y0) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        let x0 = node_x(i);
        let x1 = node_x(i + 1);
        let x = h00 * x0 + h10 * h * m0 + h01 * x1 + h11 * h * m1;

        if !x.is_finite() || x < x0 || x > x1 {
            debug!(bin = i, x, "cubic CDF inversion left the bin, using linear");
            return Ok(self.linear_in_bin(z, axis, i));
        }
        Ok(x)
    }

    /// Inversion using the configured interpolation order.
    pub fn invert(&self, z: f64, axis: &Axis) -> TransportResult<f64> {
        match self.order {
            InterpolationOrder::Constant => {
                self.check_axis(axis)?;
                let i = self.get_index(z)?;
                Ok(axis.center(i))
            }
            InterpolationOrder::Linear => self.invert_linear(z, axis, None),
            InterpolationOrder::Cubic => self.invert_cubic(z, axis, None),
        }
    }

    /// Forward CDF at `x`, linear within bins.
    pub fn evaluate(&self, x: f64, axis: &Axis) -> TransportResult<f64> {
        self.check_axis(axis)?;
        if !self.normalized {
            return Err(TransportError::InvalidCdf(
                "CDF must be normalized before evaluation".to_string(),
            ));
        }
        if x <= axis.min() {
            return Ok(0.0);
        }
        let i = axis.locate(x);
        if i >= axis.size() {
            return Ok(1.0);
        }
        let y0 = self.lower(i);
        let frac = (x - axis.bottom(i)) / axis.delta(i);
        Ok(y0 + frac * (self.y[i] - y0))
    }

    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> TransportResult<usize> {
        self.get_index(rng.gen::<f64>())
    }

    pub fn sample_value<R: Rng + ?Sized>(&self, rng: &mut R, axis: &Axis) -> TransportResult<f64> {
        self.invert(rng.gen::<f64>(), axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filled(order: InterpolationOrder, raw: &[f64]) -> CdfArray {
        let mut cdf = CdfArray::with_len(order, raw.len());
        for (i, &v) in raw.iter().enumerate() {
            cdf.set_value(i, v).unwrap();
        }
        cdf
    }

    #[test]
    fn test_uniform_weights_normalize() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 1.0, 1.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        let expected = [0.25, 0.5, 0.75, 1.0];
        for (got, want) in cdf.values().iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        assert_eq!(cdf.get_index(0.9).unwrap(), 3);
        assert_eq!(cdf.get_index(0.1).unwrap(), 0);
        assert!((cdf.normalization() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_get_value_recovers_raw_weights() {
        let mut cdf = filled(InterpolationOrder::Linear, &[2.0, 0.0, 6.0]);
        cdf.normalize(0.0).unwrap();
        assert!((cdf.get_value(0) - 2.0).abs() < 1e-12);
        assert!(cdf.get_value(1).abs() < 1e-12);
        assert!((cdf.get_value(2) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_bin_never_drawn() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 0.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        assert_eq!(cdf.get_index(0.5).unwrap(), 2);
        assert_eq!(cdf.get_index(0.4999).unwrap(), 0);
    }

    #[test]
    fn test_cutoff_drops_small_weights() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1e-9, 1.0, 1.0]);
        cdf.normalize(1e-6).unwrap();
        assert_eq!(cdf.get(0), 0.0);
        assert!((cdf.get(1) - 0.5).abs() < 1e-12);
        assert_eq!(cdf.get(2), 1.0);
    }

    #[test]
    fn test_all_zero_falls_back_to_uniform() {
        let mut cdf = filled(InterpolationOrder::Linear, &[0.0, 0.0]);
        cdf.normalize(0.0).unwrap();
        assert!((cdf.get(0) - 0.5).abs() < 1e-12);
        assert_eq!(cdf.get(1), 1.0);
    }

    #[test]
    fn test_sampling_requires_normalization() {
        let cdf = filled(InterpolationOrder::Linear, &[1.0, 2.0]);
        let err = cdf.get_index(0.3).unwrap_err();
        match err {
            TransportError::InvalidCdf(msg) => assert!(msg.contains("normalized")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_draw_outside_unit_interval() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 2.0]);
        cdf.normalize(0.0).unwrap();
        assert!(cdf.get_index(1.0).is_err());
        assert!(cdf.get_index(-0.1).is_err());
        assert!(cdf.get_index(f64::NAN).is_err());
    }

    #[test]
    fn test_set_after_normalize_rebuilds_table() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        cdf.set(0, 3.0);
        cdf.set(1, 1.0);
        assert!(cdf.get_index(0.5).is_err());
        cdf.normalize(0.0).unwrap();
        assert!((cdf.get(0) - 0.75).abs() < 1e-12);
        assert!((cdf.normalization() - 4.0).abs() < 1e-12);
        assert_eq!(cdf.get_index(0.7).unwrap(), 0);
        assert_eq!(cdf.get_index(0.8).unwrap(), 1);
    }

    #[test]
    fn test_rejects_negative_and_empty() {
        let mut cdf = CdfArray::with_len(InterpolationOrder::Linear, 2);
        assert!(cdf.set_value(0, -1.0).is_err());
        assert!(cdf.set_value(5, 1.0).is_err());
        cdf.set(1, -3.0);
        assert!(cdf.normalize(0.0).is_err());
        let mut empty = CdfArray::new(InterpolationOrder::Linear);
        assert!(empty.normalize(0.0).is_err());
    }

    #[test]
    fn test_invert_linear_midpoint() {
        let axis = Axis::uniform(0.0, 4.0, 4).unwrap();
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 1.0, 1.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        let x = cdf.invert_linear(0.375, &axis, None).unwrap();
        assert!((x - 1.5).abs() < 1e-12);
        let x = cdf.invert_linear(0.375, &axis, Some(1)).unwrap();
        assert!((x - 1.5).abs() < 1e-12);
        assert!(cdf.invert_linear(0.375, &axis, Some(3)).is_err());
        assert!((cdf.evaluate(1.5, &axis).unwrap() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_invert_cubic_exact_for_uniform() {
        let axis = Axis::uniform(0.0, 4.0, 4).unwrap();
        let mut cdf = filled(InterpolationOrder::Cubic, &[1.0, 1.0, 1.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        for &z in &[0.0, 0.1, 0.37, 0.5, 0.8, 0.999] {
            let x = cdf.invert_cubic(z, &axis, None).unwrap();
            assert!((x - 4.0 * z).abs() < 1e-10, "z={z}, x={x}");
        }
    }

    #[test]
    fn test_invert_cubic_stays_in_bin() {
        let axis = Axis::from_edges(0.0, vec![1.0, 2.0, 5.0, 6.0, 20.0]).unwrap();
        let mut cdf = filled(InterpolationOrder::Cubic, &[10.0, 0.1, 3.0, 40.0, 0.5]);
        cdf.normalize(0.0).unwrap();
        for k in 0..200 {
            let z = k as f64 / 200.0;
            let i = cdf.get_index(z).unwrap();
            let x = cdf.invert_cubic(z, &axis, None).unwrap();
            assert!(x >= axis.bottom(i) && x <= axis.top(i), "z={z}, x={x}, bin={i}");
        }
    }

    #[test]
    fn test_invert_cubic_falls_back_next_to_empty_bin() {
        let axis = Axis::uniform(0.0, 3.0, 3).unwrap();
        let mut cdf = filled(InterpolationOrder::Cubic, &[1.0, 0.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        let cubic = cdf.invert_cubic(0.25, &axis, None).unwrap();
        let linear = cdf.invert_linear(0.25, &axis, None).unwrap();
        assert!((cubic - linear).abs() < 1e-12);
    }

    #[test]
    fn test_constant_order_returns_centre() {
        let axis = Axis::uniform(0.0, 4.0, 4).unwrap();
        let mut cdf = filled(InterpolationOrder::Constant, &[1.0, 1.0, 1.0, 1.0]);
        cdf.normalize(0.0).unwrap();
        assert!((cdf.invert(0.6, &axis).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_sample_index_matches_weights() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 3.0]);
        cdf.normalize(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let hits = (0..n)
            .filter(|_| cdf.sample_index(&mut rng).unwrap() == 1)
            .count();
        let frac = hits as f64 / n as f64;
        assert!((frac - 0.75).abs() < 0.02, "frac = {frac}");
    }

    #[test]
    fn test_wipe_resets_state() {
        let mut cdf = filled(InterpolationOrder::Linear, &[1.0, 2.0]);
        cdf.normalize(0.0).unwrap();
        cdf.wipe();
        assert!(!cdf.is_normalized());
        assert_eq!(cdf.values(), &[0.0, 0.0]);
        assert_eq!(cdf.normalization(), 0.0);
    }

    #[test]
    fn test_order_from_config_value() {
        assert_eq!(InterpolationOrder::from_order(2).unwrap(), InterpolationOrder::Cubic);
        assert!(InterpolationOrder::from_order(7).is_err());
    }
}

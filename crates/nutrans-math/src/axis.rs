// ─────────────────────────────────────────────────────────────────────
// Nutrans — Axis
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Monotonic bin-edge axis with O(log n) lookup.
//!
//! Bin `i` spans `[bottom(i), top(i))` where `bottom(0) = min` and
//! `bottom(i) = top(i - 1)`. `locate` keeps the raw contract of returning
//! `size()` at or beyond the last edge; callers pick `bin_clamped` or
//! `bin_checked` to say what that means for them.

use nutrans_types::config::AxisSpec;
use nutrans_types::error::{TransportError, TransportResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    min: f64,
    top: Vec<f64>,
    mid: Vec<f64>,
}

impl Default for Axis {
    fn default() -> Self {
        Axis {
            min: 0.0,
            top: Vec::new(),
            mid: Vec::new(),
        }
    }
}

fn validate_edges(min: f64, top: &[f64], label: &str) -> TransportResult<()> {
    if !min.is_finite() {
        return Err(TransportError::InvalidAxis(format!(
            "{label} min must be finite, got {min}"
        )));
    }
    let mut prev = min;
    for (i, &edge) in top.iter().enumerate() {
        if !edge.is_finite() || edge <= prev {
            return Err(TransportError::InvalidAxis(format!(
                "{label} edges must be finite and strictly increasing: edge[{i}]={edge}, previous={prev}"
            )));
        }
        prev = edge;
    }
    Ok(())
}

impl Axis {
    /// `n` equal-width bins spanning `[start, stop]`.
    pub fn uniform(start: f64, stop: f64, n: usize) -> TransportResult<Self> {
        if n == 0 || !start.is_finite() || !stop.is_finite() || stop <= start {
            return Err(TransportError::InvalidAxis(format!(
                "uniform axis needs n > 0 and finite stop > start, got n={n}, start={start}, stop={stop}"
            )));
        }
        let width = (stop - start) / n as f64;
        let mut top: Vec<f64> = (1..=n).map(|i| start + i as f64 * width).collect();
        top[n - 1] = stop;
        Self::from_edges(start, top)
    }

    /// Bins of width `delta` starting at `start`; the final bin is truncated at `stop`.
    pub fn with_step(start: f64, stop: f64, delta: f64) -> TransportResult<Self> {
        if !start.is_finite() || !stop.is_finite() || stop <= start {
            return Err(TransportError::InvalidAxis(format!(
                "stepped axis needs finite stop > start, got start={start}, stop={stop}"
            )));
        }
        if !delta.is_finite() || delta <= 0.0 {
            return Err(TransportError::InvalidAxis(format!(
                "stepped axis delta must be finite and > 0, got {delta}"
            )));
        }
        let n = (((stop - start) / delta) * (1.0 - 1e-12)).ceil().max(1.0) as usize;
        let mut top: Vec<f64> = (1..=n)
            .map(|i| (start + i as f64 * delta).min(stop))
            .collect();
        top[n - 1] = stop;
        Self::from_edges(start, top)
    }

    /// Explicit upper edges; midpoints are the arithmetic bin centres.
    pub fn from_edges(min: f64, top: Vec<f64>) -> TransportResult<Self> {
        validate_edges(min, &top, "axis")?;
        let mut mid = Vec::with_capacity(top.len());
        let mut bottom = min;
        for &t in &top {
            mid.push(0.5 * (bottom + t));
            bottom = t;
        }
        Ok(Axis { min, top, mid })
    }

    /// Explicit upper edges and midpoints, e.g. log-centred frequency bins.
    pub fn from_edges_and_mid(min: f64, top: Vec<f64>, mid: Vec<f64>) -> TransportResult<Self> {
        validate_edges(min, &top, "axis")?;
        if mid.len() != top.len() {
            return Err(TransportError::InvalidAxis(format!(
                "axis needs one midpoint per bin, got {} edges and {} midpoints",
                top.len(),
                mid.len()
            )));
        }
        let mut bottom = min;
        for (i, (&t, &m)) in top.iter().zip(mid.iter()).enumerate() {
            if !m.is_finite() || m < bottom || m >= t {
                return Err(TransportError::InvalidAxis(format!(
                    "axis midpoint {i} must lie in [{bottom}, {t}), got {m}"
                )));
            }
            bottom = t;
        }
        Ok(Axis { min, top, mid })
    }

    pub fn from_spec(spec: &AxisSpec) -> TransportResult<Self> {
        match spec {
            AxisSpec::Uniform { start, stop, n } => Self::uniform(*start, *stop, *n),
            AxisSpec::Step { start, stop, delta } => Self::with_step(*start, *stop, *delta),
            AxisSpec::Edges { min, edges } => Self::from_edges(*min, edges.clone()),
            AxisSpec::EdgesWithMid { min, edges, mid } => {
                Self::from_edges_and_mid(*min, edges.clone(), mid.clone())
            }
        }
    }

    /// Number of bins.
    pub fn size(&self) -> usize {
        self.top.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    /// Last edge, or `min` for an empty axis.
    pub fn max(&self) -> f64 {
        self.top.last().copied().unwrap_or(self.min)
    }

    /// Upper edge of bin `i`.
    ///
    /// # Panics
    /// If `i >= size()`; `bin_checked` gives a checked bin first.
    pub fn top(&self, i: usize) -> f64 {
        self.top[i]
    }

    pub fn tops(&self) -> &[f64] {
        &self.top
    }

    /// Lower edge of bin `i`.
    ///
    /// # Panics
    /// If `i >= size()` and `i > 0`.
    pub fn bottom(&self, i: usize) -> f64 {
        if i == 0 {
            self.min
        } else {
            self.top[i - 1]
        }
    }

    /// # Panics
    /// If `i >= size()`.
    pub fn center(&self, i: usize) -> f64 {
        self.mid[i]
    }

    /// Width of bin `i`.
    ///
    /// # Panics
    /// If `i >= size()`.
    pub fn delta(&self, i: usize) -> f64 {
        self.top[i] - self.bottom(i)
    }

    /// Index `i` with `top(i-1) <= x < top(i)`. Values below `min` land in
    /// bin 0; values at or past the last edge return `size()`.
    pub fn locate(&self, x: f64) -> usize {
        self.top.partition_point(|&edge| edge <= x)
    }

    /// Out-of-range values clamp to the first/last bin.
    pub fn bin_clamped(&self, x: f64) -> usize {
        self.locate(x).min(self.size().saturating_sub(1))
    }

    /// `None` unless `min <= x < max()`.
    pub fn bin_checked(&self, x: f64) -> Option<usize> {
        if x.is_nan() || x < self.min {
            return None;
        }
        let i = self.locate(x);
        (i < self.size()).then_some(i)
    }

    /// Linear interpolation of bin-centred `values`, held constant
    /// beyond the first and last centres.
    pub fn value_at(&self, x: f64, values: &[f64]) -> TransportResult<f64> {
        let n = self.size();
        if values.len() != n || n == 0 {
            return Err(TransportError::InvalidAxis(format!(
                "value_at needs one value per bin, got {} values for {n} bins",
                values.len()
            )));
        }
        if x <= self.mid[0] {
            return Ok(values[0]);
        }
        if x >= self.mid[n - 1] {
            return Ok(values[n - 1]);
        }
        let upper = self.mid.partition_point(|&m| m <= x);
        let lower = upper - 1;
        let t = (x - self.mid[lower]) / (self.mid[upper] - self.mid[lower]);
        Ok(values[lower] + t * (values[upper] - values[lower]))
    }
}

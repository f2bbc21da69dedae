// ─────────────────────────────────────────────────────────────────────
// Nutrans — Escape Spectrum
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Energy tally of escaping packets binned in frequency and lab direction.
//!
//! Bins are laid out `nu × mu × phi`, phi fastest. `mu` is the z component
//! of the direction and `phi = atan2(D_y, D_x)` on `[-π, π)`.

use std::f64::consts::PI;

use nutrans_math::axis::Axis;
use nutrans_types::config::TransportConfig;
use nutrans_types::constants::MU_EDGE_EPS;
use nutrans_types::error::{TransportError, TransportResult};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumArray {
    nu: Axis,
    mu: Axis,
    phi: Axis,
    flux: Vec<f64>,
}

impl SpectrumArray {
    /// Uniform mu on [-1, 1] and phi on [-π, π].
    pub fn new(nu: Axis, n_mu: usize, n_phi: usize) -> TransportResult<Self> {
        Self::from_axes(nu, Axis::uniform(-1.0, 1.0, n_mu)?, Axis::uniform(-PI, PI, n_phi)?)
    }

    pub fn from_axes(nu: Axis, mu: Axis, phi: Axis) -> TransportResult<Self> {
        if nu.is_empty() || mu.is_empty() || phi.is_empty() {
            return Err(TransportError::InvalidAxis(format!(
                "spectrum needs non-empty axes, got nu={}, mu={}, phi={}",
                nu.size(),
                mu.size(),
                phi.size()
            )));
        }
        let n = nu.size() * mu.size() * phi.size();
        Ok(SpectrumArray {
            nu,
            mu,
            phi,
            flux: vec![0.0; n],
        })
    }

    pub fn from_config(config: &TransportConfig) -> TransportResult<Self> {
        Self::new(
            Axis::from_spec(config.spectrum_nu_axis())?,
            config.spectrum.n_mu,
            config.spectrum.n_phi,
        )
    }

    pub fn len(&self) -> usize {
        self.flux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }

    pub fn nu_axis(&self) -> &Axis {
        &self.nu
    }

    pub fn mu_axis(&self) -> &Axis {
        &self.mu
    }

    pub fn phi_axis(&self) -> &Axis {
        &self.phi
    }

    pub fn index(&self, nu_bin: usize, mu_bin: usize, phi_bin: usize) -> TransportResult<usize> {
        if nu_bin >= self.nu.size() || mu_bin >= self.mu.size() || phi_bin >= self.phi.size() {
            return Err(TransportError::InvalidAxis(format!(
                "spectrum bin ({nu_bin}, {mu_bin}, {phi_bin}) out of range ({}, {}, {})",
                self.nu.size(),
                self.mu.size(),
                self.phi.size()
            )));
        }
        Ok((nu_bin * self.mu.size() + mu_bin) * self.phi.size() + phi_bin)
    }

    /// (nu, mu, phi) bins of a flat index.
    pub fn bins(&self, index: usize) -> TransportResult<[usize; 3]> {
        if index >= self.flux.len() {
            return Err(TransportError::InvalidAxis(format!(
                "spectrum index {index} out of range for {} bins",
                self.flux.len()
            )));
        }
        let n_phi = self.phi.size();
        let n_mu = self.mu.size();
        Ok([index / (n_mu * n_phi), (index / n_phi) % n_mu, index % n_phi])
    }

    /// Energy in flat bin `index`.
    ///
    /// # Panics
    /// If `index >= len()`. Indices from `index()` are always in range.
    pub fn get(&self, index: usize) -> f64 {
        self.flux[index]
    }

    pub fn values(&self) -> &[f64] {
        &self.flux
    }

    /// Raw accumulator for an external cross-rank reduction.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.flux
    }

    pub fn wipe(&mut self) {
        self.flux.iter_mut().for_each(|f| *f = 0.0);
    }

    /// Tally energy `e` leaving in lab direction `d` at frequency `nu`.
    /// Returns `false` when the direction falls off the angular grid.
    pub fn count(&mut self, d: [f64; 3], nu: f64, e: f64) -> TransportResult<bool> {
        if !e.is_finite() || e < 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "packet energy must be finite and >= 0, got {e}"
            )));
        }
        if !nu.is_finite() || d.iter().any(|c| !c.is_finite()) {
            return Err(TransportError::PhysicsViolation(format!(
                "packet direction and frequency must be finite, got d={d:?}, nu={nu}"
            )));
        }
        let mu = d[2].clamp(-1.0 + MU_EDGE_EPS, 1.0 - MU_EDGE_EPS);
        let mut phi = d[1].atan2(d[0]);
        if phi >= PI {
            phi -= 2.0 * PI;
        }

        let (Some(mu_bin), Some(phi_bin)) = (self.mu.bin_checked(mu), self.phi.bin_checked(phi))
        else {
            debug!(mu, phi, "packet direction off the spectrum grid; not counted");
            return Ok(false);
        };
        let nu_bin = self.nu.bin_clamped(nu);
        let i = self.index(nu_bin, mu_bin, phi_bin)?;
        self.flux[i] += e;
        Ok(true)
    }

    pub fn merge(&mut self, other: &SpectrumArray) -> TransportResult<()> {
        if self.nu != other.nu || self.mu != other.mu || self.phi != other.phi {
            return Err(TransportError::InvalidAxis(
                "cannot merge spectra with different binning".to_string(),
            ));
        }
        for (a, b) in self.flux.iter_mut().zip(&other.flux) {
            *a += b;
        }
        Ok(())
    }

    pub fn rescale(&mut self, r: f64) {
        self.flux.iter_mut().for_each(|f| *f *= r);
    }

    pub fn integrate(&self) -> f64 {
        self.flux.iter().sum()
    }

    /// Energy per frequency bin summed over all directions.
    pub fn integrate_over_direction(&self) -> Vec<f64> {
        let per_nu = self.mu.size() * self.phi.size();
        self.flux
            .chunks_exact(per_nu)
            .map(|chunk| chunk.iter().sum())
            .collect()
    }

    /// Energy-weighted mean of the bin-centre frequencies; zero for an empty tally.
    pub fn average_nu(&self) -> f64 {
        let per_nu = self.integrate_over_direction();
        let total: f64 = per_nu.iter().sum();
        let weighted: f64 = per_nu
            .iter()
            .enumerate()
            .map(|(i, e)| e * self.nu.center(i))
            .sum();
        let avg = weighted / total;
        if avg >= 0.0 {
            avg
        } else {
            0.0
        }
    }

    /// Bin value per unit frequency and solid angle [erg/Hz/sr].
    pub fn specific_value(&self, index: usize) -> TransportResult<f64> {
        let [nu_bin, mu_bin, phi_bin] = self.bins(index)?;
        let solid_angle = self.mu.delta(mu_bin) * self.phi.delta(phi_bin);
        Ok(self.flux[index] / (self.nu.delta(nu_bin) * solid_angle))
    }

    /// Install the externally summed accumulator and average over ranks.
    /// Reapplying the same sums leaves the result unchanged.
    pub fn apply_reduced_sum(&mut self, summed: &[f64], nranks: usize) -> TransportResult<()> {
        if summed.len() != self.flux.len() || nranks == 0 {
            return Err(TransportError::PhysicsViolation(format!(
                "reduced spectrum needs {} values and nranks >= 1, got {} values, nranks={nranks}",
                self.flux.len(),
                summed.len()
            )));
        }
        let inv = 1.0 / nranks as f64;
        for (f, s) in self.flux.iter_mut().zip(summed) {
            *f = s * inv;
        }
        Ok(())
    }
}

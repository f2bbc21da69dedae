// ─────────────────────────────────────────────────────────────────────
// Nutrans — Opacity Table
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-zone, per-frequency-bin absorption and scattering opacities.
//!
//! Values are produced by an external microphysics service and written
//! during a setup phase; transport only reads them. Frequencies past the
//! last edge use the last bin.

use ndarray::{Array2, ArrayView2};
use nutrans_math::axis::Axis;
use nutrans_types::config::TransportConfig;
use nutrans_types::error::{TransportError, TransportResult};

use crate::einstein::EinsteinHelper;

#[derive(Debug, Clone)]
pub struct OpacityTable {
    nu: Axis,
    abs: Array2<f64>,  // [n_zones, n_nu], 1/cm
    scat: Array2<f64>, // [n_zones, n_nu], 1/cm
}

impl OpacityTable {
    pub fn new(nu: Axis, n_zones: usize) -> TransportResult<Self> {
        if nu.is_empty() || n_zones == 0 {
            return Err(TransportError::InvalidAxis(format!(
                "opacity table needs >= 1 frequency bin and >= 1 zone, got {} bins, {n_zones} zones",
                nu.size()
            )));
        }
        let shape = (n_zones, nu.size());
        Ok(OpacityTable {
            nu,
            abs: Array2::zeros(shape),
            scat: Array2::zeros(shape),
        })
    }

    pub fn from_config(config: &TransportConfig, n_zones: usize) -> TransportResult<Self> {
        Self::new(Axis::from_spec(&config.frequency_axis)?, n_zones)
    }

    pub fn frequency_axis(&self) -> &Axis {
        &self.nu
    }

    pub fn n_zones(&self) -> usize {
        self.abs.nrows()
    }

    fn check(&self, z: usize, bin: usize) -> TransportResult<()> {
        if z >= self.n_zones() {
            return Err(TransportError::ZoneIndex {
                index: z,
                n_zones: self.n_zones(),
            });
        }
        if bin >= self.nu.size() {
            return Err(TransportError::InvalidAxis(format!(
                "frequency bin {bin} out of range for {} bins",
                self.nu.size()
            )));
        }
        Ok(())
    }

    pub fn set(&mut self, z: usize, bin: usize, abs: f64, scat: f64) -> TransportResult<()> {
        self.check(z, bin)?;
        if !abs.is_finite() || abs < 0.0 || !scat.is_finite() || scat < 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "opacities must be finite and >= 0, got abs={abs}, scat={scat}"
            )));
        }
        self.abs[[z, bin]] = abs;
        self.scat[[z, bin]] = scat;
        Ok(())
    }

    /// Fill one zone's spectrum.
    pub fn set_zone(&mut self, z: usize, abs: &[f64], scat: &[f64]) -> TransportResult<()> {
        let n = self.nu.size();
        if abs.len() != n || scat.len() != n {
            return Err(TransportError::PhysicsViolation(format!(
                "zone {z} opacity spectra need {n} bins, got abs={}, scat={}",
                abs.len(),
                scat.len()
            )));
        }
        for (bin, (&a, &s)) in abs.iter().zip(scat).enumerate() {
            self.set(z, bin, a, s)?;
        }
        Ok(())
    }

    /// Frequency bin and (absorption, scattering) opacity at comoving frequency `nu`.
    pub fn lookup(&self, z: usize, nu: f64) -> TransportResult<(usize, f64, f64)> {
        if !nu.is_finite() || nu < 0.0 {
            return Err(TransportError::PhysicsViolation(format!(
                "frequency must be finite and >= 0, got {nu}"
            )));
        }
        let bin = self.nu.bin_clamped(nu);
        self.check(z, bin)?;
        Ok((bin, self.abs[[z, bin]], self.scat[[z, bin]]))
    }

    /// Load the opacities seen by the particle into the helper.
    pub fn apply(&self, eh: &mut EinsteinHelper) -> TransportResult<()> {
        let z = eh.z_ind.ok_or_else(|| {
            TransportError::PhysicsViolation("opacity lookup for a particle off the grid".to_string())
        })?;
        let (bin, abs, scat) = self.lookup(z, eh.comoving_frequency())?;
        eh.eas_ind = Some(bin);
        eh.absopac = abs;
        eh.scatopac = scat;
        Ok(())
    }

    pub fn wipe(&mut self) {
        self.abs.fill(0.0);
        self.scat.fill(0.0);
    }

    pub fn absorption(&self) -> ArrayView2<'_, f64> {
        self.abs.view()
    }

    pub fn scattering(&self) -> ArrayView2<'_, f64> {
        self.scat.view()
    }

    /// Replace local values with the cross-rank sums. Each zone is filled by
    /// exactly one rank, so the sums are the final values and reapplying the
    /// same sums is a no-op.
    pub fn apply_reduced_sum(
        &mut self,
        abs: ArrayView2<'_, f64>,
        scat: ArrayView2<'_, f64>,
    ) -> TransportResult<()> {
        if abs.dim() != self.abs.dim() || scat.dim() != self.scat.dim() {
            return Err(TransportError::PhysicsViolation(format!(
                "reduced opacity shape mismatch: abs={:?}, scat={:?}, expected {:?}",
                abs.dim(),
                scat.dim(),
                self.abs.dim()
            )));
        }
        self.abs.assign(&abs);
        self.scat.assign(&scat);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutrans_types::constants::C_LIGHT_CGS;
    use std::f64::consts::PI;

    fn table() -> OpacityTable {
        let mut t = OpacityTable::new(Axis::uniform(0.0, 3.0e20, 3).unwrap(), 2).unwrap();
        t.set_zone(0, &[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]).unwrap();
        t.set_zone(1, &[4.0, 5.0, 6.0], &[40.0, 50.0, 60.0]).unwrap();
        t
    }

    #[test]
    fn test_lookup_clamps_high_frequency() {
        let t = table();
        assert_eq!(t.lookup(0, 1.5e20).unwrap(), (1, 2.0, 20.0));
        assert_eq!(t.lookup(1, 9.0e20).unwrap(), (2, 6.0, 60.0));
        assert_eq!(t.lookup(1, 0.0).unwrap(), (0, 4.0, 40.0));
        assert!(t.lookup(2, 1.0e20).is_err());
    }

    #[test]
    fn test_negative_opacity_rejected() {
        let mut t = table();
        let err = t.set(0, 0, -1.0, 0.0).unwrap_err();
        match err {
            TransportError::PhysicsViolation(msg) => assert!(msg.contains(">= 0")),
            other => panic!("Unexpected error: {other:?}"),
        }
        assert!(t.set_zone(0, &[1.0], &[1.0]).is_err());
    }

    #[test]
    fn test_apply_sets_helper_fields() {
        let t = table();
        let mut eh = EinsteinHelper::new([0.0; 4], [1.0, 0.0, 0.0, 1.0]);
        let nu = 2.5e20;
        let k = 2.0 * PI * nu / C_LIGHT_CGS;
        eh.kup_tet = [k, 0.0, 0.0, k];
        eh.z_ind = Some(1);
        t.apply(&mut eh).unwrap();
        assert_eq!(eh.eas_ind, Some(2));
        assert_eq!(eh.absopac, 6.0);
        assert_eq!(eh.scatopac, 60.0);

        eh.z_ind = None;
        assert!(t.apply(&mut eh).is_err());
    }

    #[test]
    fn test_reduced_sum_is_idempotent() {
        let mut t = table();
        let summed_abs = t.absorption().to_owned() * 2.0;
        let summed_scat = t.scattering().to_owned() * 2.0;
        t.apply_reduced_sum(summed_abs.view(), summed_scat.view()).unwrap();
        t.apply_reduced_sum(summed_abs.view(), summed_scat.view()).unwrap();
        assert_eq!(t.lookup(0, 0.5e20).unwrap(), (0, 2.0, 20.0));
        t.wipe();
        assert_eq!(t.lookup(0, 0.5e20).unwrap(), (0, 0.0, 0.0));
    }
}

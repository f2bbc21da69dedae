// ─────────────────────────────────────────────────────────────────────
// Nutrans — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Speed of light (cm/s)
pub const C_LIGHT_CGS: f64 = 2.99792458e10;

/// Boltzmann constant (erg/K)
pub const K_BOLTZMANN_CGS: f64 = 1.380658e-16;

/// Neutron mass (g)
pub const M_NEUTRON_CGS: f64 = 1.67492735e-24;

/// Erg per MeV
pub const MEV_TO_ERG: f64 = 1.60217733e-6;

/// Largest Lorentz factor a zone velocity may carry before it is clamped.
pub const MAX_LORENTZ_FACTOR: f64 = 2.0;

/// Tolerance for tetrad orthonormality and null-norm checks.
pub const TINY: f64 = 1e-10;

/// Mu bins are kept away from the poles by this much when tallying.
pub const MU_EDGE_EPS: f64 = 1e-8;

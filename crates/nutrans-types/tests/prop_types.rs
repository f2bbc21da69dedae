// ─────────────────────────────────────────────────────────────────────
// Nutrans — Property-Based Tests (proptest) for nutrans-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for nutrans-types using proptest.
//!
//! Covers: fluid/spacetime container shapes, metric positivity checks,
//! configuration serialization roundtrip.

use ndarray::{Array1, Array2};
use nutrans_types::config::{AxisSpec, RankContext};
use nutrans_types::state::{FluidState, SpacetimeFields};
use proptest::prelude::*;

proptest! {
    /// Uniform fluid containers carry one row per zone.
    #[test]
    fn fluid_shapes_match(n in 1usize..256, rho in 0.0f64..1e15, ye in 0.0f64..1.0) {
        let fluid = FluidState::uniform(n, rho, 1.0e10, ye);
        prop_assert_eq!(fluid.n_zones(), n);
        prop_assert_eq!(fluid.velocity.dim(), (n, 3));
        prop_assert!(fluid.validate(n).is_ok());
    }

    /// Diagonal metrics with positive entries always pass validation.
    #[test]
    fn diagonal_metric_is_positive_definite(
        gxx in 0.1f64..10.0,
        gyy in 0.1f64..10.0,
        gzz in 0.1f64..10.0,
        alpha in 0.05f64..1.0,
    ) {
        let mut g = Array2::zeros((1, 6));
        g[[0, 0]] = gxx;
        g[[0, 1]] = gyy;
        g[[0, 2]] = gzz;
        let fields = SpacetimeFields::from_arrays(
            Array1::from_elem(1, alpha),
            Array2::zeros((1, 3)),
            g,
        );
        prop_assert!(fields.is_ok());
    }

    /// An off-diagonal term larger than the geometric mean breaks positivity.
    #[test]
    fn large_off_diagonal_is_rejected(gxx in 0.1f64..10.0, gyy in 0.1f64..10.0, excess in 1.01f64..5.0) {
        let mut g = Array2::zeros((1, 6));
        g[[0, 0]] = gxx;
        g[[0, 1]] = gyy;
        g[[0, 2]] = 1.0;
        g[[0, 3]] = excess * (gxx * gyy).sqrt();
        let fields = SpacetimeFields::from_arrays(Array1::ones(1), Array2::zeros((1, 3)), g);
        prop_assert!(fields.is_err());
    }

    /// Rank contexts are valid exactly when rank < nranks.
    #[test]
    fn rank_context_bounds(rank in 0usize..64, nranks in 1usize..64) {
        let ctx = RankContext::new(rank, nranks);
        prop_assert_eq!(ctx.is_ok(), rank < nranks);
    }

    /// Axis specs survive a JSON roundtrip.
    #[test]
    fn axis_spec_roundtrip(start in -1000i32..1000, width in 1i32..1000, n in 1usize..512) {
        let start = f64::from(start);
        let spec = AxisSpec::Uniform { start, stop: start + f64::from(width), n };
        let json = serde_json::to_string(&spec).unwrap();
        let back: AxisSpec = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, spec);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Nutrans — Property-Based Tests (proptest) for nutrans-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for nutrans-math using proptest.
//!
//! Covers: axis monotonicity and locate/centre consistency, CDF
//! monotonicity and index bracketing, inversion roundtrips, interpolation
//! of constant fields.

use nutrans_math::axis::Axis;
use nutrans_math::cdf::{CdfArray, InterpolationOrder};
use nutrans_math::interp::InterpolationCube;
use proptest::prelude::*;

fn random_edges() -> impl Strategy<Value = (f64, Vec<f64>)> {
    (
        -100.0f64..100.0,
        prop::collection::vec(1e-3f64..10.0, 1..48),
    )
        .prop_map(|(min, widths)| {
            let mut edges = Vec::with_capacity(widths.len());
            let mut x = min;
            for w in widths {
                x += w;
                edges.push(x);
            }
            (min, edges)
        })
}

fn normalized_cdf(weights: &[f64], order: InterpolationOrder) -> CdfArray {
    let mut cdf = CdfArray::with_len(order, weights.len());
    for (i, &w) in weights.iter().enumerate() {
        cdf.set_value(i, w).unwrap();
    }
    cdf.normalize(0.0).unwrap();
    cdf
}

// ── Axis ─────────────────────────────────────────────────────────────

proptest! {
    /// Edges are strictly increasing and every centre locates to its own bin.
    #[test]
    fn axis_locate_centre_roundtrip((min, edges) in random_edges()) {
        let axis = Axis::from_edges(min, edges).unwrap();
        let mut prev = axis.min();
        for i in 0..axis.size() {
            prop_assert!(axis.top(i) > prev);
            prev = axis.top(i);
            prop_assert_eq!(axis.locate(axis.center(i)), i);
            prop_assert!(axis.delta(i) > 0.0);
        }
    }

    /// Uniform axes also satisfy the centre roundtrip.
    #[test]
    fn uniform_axis_roundtrip(start in -1e6f64..1e6, width in 1e-3f64..1e6, n in 1usize..500) {
        let axis = Axis::uniform(start, start + width, n).unwrap();
        prop_assert_eq!(axis.size(), n);
        for i in 0..n {
            prop_assert_eq!(axis.locate(axis.center(i)), i);
        }
    }

    /// `bin_checked` agrees with `locate` inside the axis and is `None` outside.
    #[test]
    fn bin_checked_contract((min, edges) in random_edges(), t in -0.5f64..1.5) {
        let axis = Axis::from_edges(min, edges).unwrap();
        let x = axis.min() + t * (axis.max() - axis.min());
        match axis.bin_checked(x) {
            Some(i) => {
                prop_assert!(x >= axis.bottom(i) && x < axis.top(i));
                prop_assert_eq!(axis.bin_clamped(x), i);
            }
            None => prop_assert!(x < axis.min() || x >= axis.max()),
        }
    }
}

// ── CDF ──────────────────────────────────────────────────────────────

proptest! {
    /// Normalized CDFs are non-decreasing, end at 1 and bracket every draw.
    #[test]
    fn cdf_index_brackets_draw(
        weights in prop::collection::vec(0.0f64..10.0, 1..64),
        z in 0.0f64..1.0,
    ) {
        let cdf = normalized_cdf(&weights, InterpolationOrder::Linear);
        let y = cdf.values();
        for w in y.windows(2) {
            prop_assert!(w[1] >= w[0]);
        }
        prop_assert_eq!(y[y.len() - 1], 1.0);

        let i = cdf.get_index(z).unwrap();
        let lower = if i == 0 { 0.0 } else { y[i - 1] };
        prop_assert!(lower <= z && z <= y[i], "lower={}, z={}, y[i]={}", lower, z, y[i]);
    }

    /// Linear inversion followed by forward evaluation reproduces the draw.
    #[test]
    fn linear_inversion_roundtrip(
        (min, edges) in random_edges(),
        seed_weights in prop::collection::vec(0.1f64..10.0, 48),
        z in 0.001f64..0.999,
    ) {
        let axis = Axis::from_edges(min, edges).unwrap();
        let cdf = normalized_cdf(&seed_weights[..axis.size()], InterpolationOrder::Linear);
        let x = cdf.invert_linear(z, &axis, None).unwrap();
        let back = cdf.evaluate(x, &axis).unwrap();
        prop_assert!((back - z).abs() < 1e-9, "z={}, back={}", z, back);
    }

    /// Cubic inversion always lands inside the bin chosen by `get_index`.
    #[test]
    fn cubic_inversion_stays_in_bin(
        (min, edges) in random_edges(),
        seed_weights in prop::collection::vec(0.0f64..10.0, 48),
        z in 0.0f64..1.0,
    ) {
        let axis = Axis::from_edges(min, edges).unwrap();
        let cdf = normalized_cdf(&seed_weights[..axis.size()], InterpolationOrder::Cubic);
        let i = cdf.get_index(z).unwrap();
        let x = cdf.invert_cubic(z, &axis, None).unwrap();
        prop_assert!(x >= axis.bottom(i) - 1e-9 && x <= axis.top(i) + 1e-9);
    }
}

// ── Interpolation ────────────────────────────────────────────────────

proptest! {
    /// Constant fields interpolate to themselves with zero gradient.
    #[test]
    fn constant_field_is_preserved(
        (min, edges) in random_edges(),
        t in -0.2f64..1.2,
        c in -1e3f64..1e3,
    ) {
        let axis = Axis::from_edges(min, edges).unwrap();
        let x = axis.min() + t * (axis.max() - axis.min());
        let cube = InterpolationCube::new([&axis, &axis], [x, x]);
        prop_assert!((cube.interpolate(|_| c) - c).abs() < 1e-9 * c.abs().max(1.0));
        let grad = cube.slopes(|_| c);
        prop_assert!(grad[0].abs() < 1e-6 && grad[1].abs() < 1e-6);
    }
}

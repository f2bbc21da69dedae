use criterion::{criterion_group, criterion_main, Criterion};
use nutrans_core::einstein::EinsteinHelper;
use nutrans_core::grid::{Cartesian3D, Grid, ZoneGeometry};
use nutrans_math::axis::Axis;
use nutrans_types::constants::C_LIGHT_CGS;
use nutrans_types::state::{FluidState, SpacetimeFields};
use std::hint::black_box;

fn curved_box(n: usize) -> Grid {
    let axes = [
        Axis::uniform(0.0, 1.0e7, n).unwrap(),
        Axis::uniform(0.0, 1.0e7, n).unwrap(),
        Axis::uniform(0.0, 1.0e7, n).unwrap(),
    ];
    let nz = n * n * n;
    let mut st = SpacetimeFields::flat(nz);
    let mut fluid = FluidState::uniform(nz, 1.0e12, 1.0e11, 0.3);
    for z in 0..nz {
        let r = z as f64 / nz as f64;
        st.lapse[z] = 0.8 + 0.2 * r;
        st.shift[[z, 0]] = 0.01 * r;
        st.three_metric[[z, 0]] = 1.0 + 0.1 * r;
        fluid.velocity[[z, 1]] = 0.1 * r * C_LIGHT_CGS;
    }
    Grid::Cartesian3D(Cartesian3D::new(axes, fluid, Some(st), Default::default()).unwrap())
}

fn bench_step(c: &mut Criterion) {
    let grid = curved_box(16);
    let start = EinsteinHelper::new([3.3e6, 4.1e6, 5.7e6, 0.0], [0.3, 0.5, -0.8, 0.0]);

    c.bench_function("update_einstein_helper_16cubed", |b| {
        b.iter(|| {
            let mut eh = start.clone();
            black_box(grid.update_einstein_helper(&mut eh).unwrap());
            black_box(eh.kup_tet)
        })
    });

    c.bench_function("boundary_and_step_16cubed", |b| {
        let mut eh = start.clone();
        grid.update_einstein_helper(&mut eh).unwrap();
        b.iter(|| {
            let mut step = eh.clone();
            step.ds_com = 0.5 * grid.d_boundary(&step).unwrap();
            step.integrate_geodesic().unwrap();
            black_box(step.xup)
        })
    });
}

criterion_group!(benches, bench_step);
criterion_main!(benches);

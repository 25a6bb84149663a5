use std::f64::consts::PI;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use gridflux::algs::communicator::NoComm;
use gridflux::implicit::JacobianAction;
use gridflux::physics::ModelConfig;
use gridflux::reconstruction::Limiting;
use gridflux::solver::{Solver, SolverConfig};

fn euler2d(n: usize, reconstruction: &str) -> Solver<NoComm> {
    let cfg = SolverConfig {
        model: ModelConfig::Euler2D { gamma: 1.4 },
        size: vec![n, n],
        periodic: vec![true, true],
        reconstruction: reconstruction.into(),
        ..Default::default()
    };
    Solver::new(cfg, NoComm).unwrap()
}

fn vortex(x: &[f64], v: &mut [f64]) {
    let rho = 1.0 + 0.1 * (2.0 * PI * x[0]).sin() * (2.0 * PI * x[1]).sin();
    let (vx, vy, p) = (0.5, -0.25, 1.0);
    v.copy_from_slice(&[rho, rho * vx, rho * vy, p / 0.4 + 0.5 * rho * (vx * vx + vy * vy)]);
}

fn bench_rhs(c: &mut Criterion) {
    let mut group = c.benchmark_group("rhs");
    for recon in ["1", "weno5"] {
        for &n in &[32usize, 64] {
            let mut solver = euler2d(n, recon);
            let mut u = solver.field_from_fn(vortex);
            solver.apply_boundaries(&mut u).unwrap();
            let mut rhs = solver.new_field();
            group.bench_with_input(BenchmarkId::new(recon, n), &n, |b, _| {
                b.iter(|| solver.rhs(&mut rhs, &u, Limiting::Recompute).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_jacobian(c: &mut Criterion) {
    let mut solver = euler2d(32, "weno5");
    let mut j = JacobianAction::for_solver(&solver).unwrap();
    let u0 = solver.field_from_fn(vortex);
    j.set_shift(&mut solver, 10.0, 0.0);
    j.set_reference(&mut solver, &u0, 0.0).unwrap();
    let n = solver.layout().interior_len();
    let y: Vec<f64> = (0..n).map(|k| ((k % 17) as f64 - 8.0) * 1e-3).collect();
    let mut out = vec![0.0; n];
    c.bench_function("jacobian_action/weno5/32", |b| {
        b.iter(|| j.apply(&mut solver, &y, &mut out).unwrap())
    });
}

criterion_group!(benches, bench_rhs, bench_jacobian);
criterion_main!(benches);

#![allow(dead_code)]
use gridflux::{
    algs::communicator::RayonComm,
    physics::{Euler1D, ModelConfig},
    solver::SolverConfig,
};

/// Sod shock-tube states `(rho, u, p)`: `(1, 0, 1)` and `(0.125, 0, 0.1)`.
pub fn sod(m: &Euler1D) -> ([f64; 3], [f64; 3]) {
    (m.conserved(1.0, 0.0, 1.0), m.conserved(0.125, 0.0, 0.1))
}

/// Run `f` on `n` thread-ranks of a fresh in-process world, results by rank.
pub fn on_ranks<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(RayonComm) -> T + Send + Sync + Clone + 'static,
{
    let handles: Vec<_> = RayonComm::world(n)
        .into_iter()
        .map(|comm| {
            let f = f.clone();
            std::thread::spawn(move || f(comm))
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("rank panicked"))
        .collect()
}

/// Scalar linear advection-diffusion-reaction on a periodic box.
pub fn adr_config(size: &[usize], advection: &[f64], diffusion: Vec<Vec<f64>>, reaction: f64) -> SolverConfig {
    SolverConfig {
        model: ModelConfig::LinearAdr {
            advection: advection.to_vec(),
            diffusion,
            reaction,
            nvars: 1,
        },
        size: size.to_vec(),
        periodic: vec![true; size.len()],
        ..Default::default()
    }
}

/// Periodic 1D Euler problem with the given scheme names.
pub fn euler_config(n: usize, upwinding: &str, reconstruction: &str) -> SolverConfig {
    SolverConfig {
        size: vec![n],
        periodic: vec![true],
        upwinding: upwinding.into(),
        reconstruction: reconstruction.into(),
        ..Default::default()
    }
}

/// `|a - b| <= tol * max(1, |b|)` component-wise.
pub fn assert_close(got: &[f64], want: &[f64], tol: f64) {
    assert_eq!(got.len(), want.len());
    for (k, (a, b)) in got.iter().zip(want).enumerate() {
        assert!(
            (a - b).abs() <= tol * b.abs().max(1.0),
            "component {k}: got {a}, want {b} (tol {tol})\n got={got:?}\nwant={want:?}"
        );
    }
}

//! Every upwind scheme reduces to the physical flux when both sides agree.

use gridflux::flux::{UpwindScheme, UpwindWorkspace};
use gridflux::physics::{Euler1D, Euler2D, LinearAdr, PhysicsModel, ShallowWater1D};
use proptest::prelude::*;

mod util;
use util::assert_close;

fn check_all_schemes(m: &dyn PhysicsModel, u: &[f64], dir: usize) {
    let n = m.nvars();
    let mut f = vec![0.0; n];
    m.flux(u, dir, &mut f);
    let mut ws = UpwindWorkspace::new(n);
    let mut out = vec![0.0; n];
    for scheme in UpwindScheme::ALL {
        if scheme.check_model(m).is_err() {
            continue;
        }
        scheme
            .interface_flux(m, dir, &f, &f, u, u, &mut ws, &mut out)
            .unwrap();
        assert_close(&out, &f, 1e-10);
    }
}

proptest! {
    #[test]
    fn euler1d_consistency(rho in 0.05f64..10.0, vel in -5.0f64..5.0, p in 0.05f64..10.0) {
        let m = Euler1D::new(1.4).unwrap();
        check_all_schemes(&m, &m.conserved(rho, vel, p), 0);
    }

    #[test]
    fn euler2d_consistency(
        rho in 0.05f64..10.0,
        vx in -5.0f64..5.0,
        vy in -5.0f64..5.0,
        p in 0.05f64..10.0,
        dir in 0usize..2,
    ) {
        let m = Euler2D::new(1.4).unwrap();
        check_all_schemes(&m, &m.conserved(rho, vx, vy, p), dir);
    }

    #[test]
    fn shallow_water_consistency(h in 0.01f64..10.0, vel in -5.0f64..5.0) {
        let m = ShallowWater1D::new(9.81).unwrap();
        check_all_schemes(&m, &[h, h * vel], 0);
    }

    #[test]
    fn linear_consistency(a in -3.0f64..3.0, u in -10.0f64..10.0) {
        let m = LinearAdr::new(1, vec![a], vec![], 0.0).unwrap();
        check_all_schemes(&m, &[u], 0);
    }
}

#[test]
fn roe_is_bitwise_consistent() {
    let m = Euler1D::new(1.4).unwrap();
    let u = m.conserved(0.7, -1.3, 2.1);
    let mut f = [0.0; 3];
    m.flux(&u, 0, &mut f);
    let mut ws = UpwindWorkspace::new(3);
    let mut out = [0.0; 3];
    UpwindScheme::Roe
        .interface_flux(&m, 0, &f, &f, &u, &u, &mut ws, &mut out)
        .unwrap();
    assert_eq!(out, f);
}

//! Characteristic-wise Roe-Fixed and local Lax-Friedrichs fluxes.

use crate::flux::UpwindWorkspace;
use crate::grid_error::GridError;
use crate::physics::PhysicsModel;

/// Both schemes project `fL, fR, uL, uR` with `L` at the Roe average and
/// compare eigenvalue `k` at the left, right and averaged states. With
/// `sign_check`, a field whose three eigenvalues share a strict sign takes the
/// upwind characteristic flux; every other field (all fields without
/// `sign_check`) gets `0.5 (fcL + fcR + alpha (ucL - ucR))`, `alpha` the
/// largest of the three magnitudes.
#[allow(clippy::too_many_arguments)]
pub(super) fn flux(
    model: &dyn PhysicsModel,
    dir: usize,
    fl: &[f64],
    fr: &[f64],
    ul: &[f64],
    ur: &[f64],
    ws: &mut UpwindWorkspace,
    out: &mut [f64],
    sign_check: bool,
) -> Result<(), GridError> {
    model.roe_average(ul, ur, dir, &mut ws.avg)?;
    model.eigen(&ws.avg, dir, &mut ws.eig)?;
    model.eigenvalues(ul, dir, &mut ws.lam_l)?;
    model.eigenvalues(ur, dir, &mut ws.lam_r)?;

    let UpwindWorkspace {
        eig, a, b, c, d, lam_l, lam_r, ..
    } = ws;
    // a: fcL, b: fcR, c: ucL, d: ucR
    eig.to_characteristic(fl, a);
    eig.to_characteristic(fr, b);
    eig.to_characteristic(ul, c);
    eig.to_characteristic(ur, d);

    for k in 0..eig.nvars() {
        let (el, ec, er) = (lam_l[k], eig.lambda[k], lam_r[k]);
        a[k] = if sign_check && el > 0.0 && ec > 0.0 && er > 0.0 {
            a[k]
        } else if sign_check && el < 0.0 && ec < 0.0 && er < 0.0 {
            b[k]
        } else {
            let alpha = el.abs().max(ec.abs()).max(er.abs());
            0.5 * (a[k] + b[k] + alpha * (c[k] - d[k]))
        };
    }
    eig.from_characteristic(a, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ShallowWater1D;

    #[test]
    fn llf_adds_dissipation_where_rf_upwinds() {
        let m = ShallowWater1D::new(1.0).unwrap();
        // Supercritical flow to the right: every eigenvalue is positive.
        let ul = [1.0, 3.0];
        let ur = [1.1, 3.2];
        let (mut fl, mut fr) = ([0.0; 2], [0.0; 2]);
        m.flux(&ul, 0, &mut fl);
        m.flux(&ur, 0, &mut fr);
        let mut ws = UpwindWorkspace::new(2);
        let (mut rf, mut llf) = ([0.0; 2], [0.0; 2]);
        flux(&m, 0, &fl, &fr, &ul, &ur, &mut ws, &mut rf, true).unwrap();
        flux(&m, 0, &fl, &fr, &ul, &ur, &mut ws, &mut llf, false).unwrap();
        for k in 0..2 {
            assert!((rf[k] - fl[k]).abs() < 1e-12);
        }
        assert!((llf[0] - rf[0]).abs() > 1e-6);
    }
}

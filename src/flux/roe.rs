use crate::flux::UpwindWorkspace;
use crate::grid_error::GridError;
use crate::physics::PhysicsModel;

/// Roe flux `0.5 (fL + fR) - R|D|L (uR - uL) / 2`.
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
) -> Result<(), GridError> {
    model.roe_average(ul, ur, dir, &mut ws.avg)?;
    model.eigen(&ws.avg, dir, &mut ws.eig)?;
    for ((d, &l), &r) in ws.a.iter_mut().zip(ul).zip(ur) {
        *d = 0.5 * (r - l);
    }
    ws.eig.apply_fn(f64::abs, &ws.a, &mut ws.b);
    for (k, o) in out.iter_mut().enumerate() {
        *o = 0.5 * (fl[k] + fr[k]) - ws.b[k];
    }
    Ok(())
}

use crate::flux::UpwindWorkspace;
use crate::grid_error::GridError;
use crate::physics::PhysicsModel;

/// `F+(uL) + F-(uR)` with `F+- = R D+- L u` evaluated at each side's own state.
pub(super) fn flux(
    model: &dyn PhysicsModel,
    dir: usize,
    ul: &[f64],
    ur: &[f64],
    ws: &mut UpwindWorkspace,
    out: &mut [f64],
) -> Result<(), GridError> {
    model.eigen(ul, dir, &mut ws.eig)?;
    ws.eig.apply_fn(|l| l.max(0.0), ul, &mut ws.a);
    model.eigen(ur, dir, &mut ws.eig)?;
    ws.eig.apply_fn(|l| l.min(0.0), ur, &mut ws.b);
    for ((o, &p), &m) in out.iter_mut().zip(&ws.a).zip(&ws.b) {
        *o = p + m;
    }
    Ok(())
}

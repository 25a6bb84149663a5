use itertools::izip;

use crate::grid::Field;
use crate::grid_error::GridError;

/// `rhs = -hyp + par + source`, the sign convention of every time integrator.
pub fn assemble_rhs(
    rhs: &mut Field,
    hyp: &Field,
    par: &Field,
    source: &Field,
) -> Result<(), GridError> {
    let layout = rhs.layout().clone();
    for f in [hyp, par, source] {
        layout.check_len(f.as_slice().len())?;
    }
    for (r, &h, &p, &s) in izip!(
        rhs.as_mut_slice(),
        hyp.as_slice(),
        par.as_slice(),
        source.as_slice()
    ) {
        *r = -h + p + s;
    }
    Ok(())
}

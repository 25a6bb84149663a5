use crate::grid::Field;
use crate::grid_error::GridError;
use crate::reconstruction::{Bias, Limiting, Reconstruction, Slot, check_args, for_each_interface};

/// Piecewise-constant interpolation: the interface takes its upwind cell value.
#[derive(Copy, Clone, Debug, Default)]
pub struct FirstOrderUpwind;

impl Reconstruction for FirstOrderUpwind {
    fn name(&self) -> &'static str {
        "1"
    }

    fn ghosts_required(&self) -> usize {
        1
    }

    fn interpolate(
        &mut self,
        src: &Field,
        dir: usize,
        bias: Bias,
        _slot: Slot,
        _limiting: Limiting,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        check_args(src, dir, self.ghosts_required(), out)?;
        let nvars = src.layout().nvars();
        for_each_interface(src, dir, bias, |o, cell, _| {
            out[o..o + nvars].copy_from_slice(src.at(cell));
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridLayout;

    #[test]
    fn interfaces_copy_the_upwind_cell() {
        let l = GridLayout::new(&[3], 1, 1).unwrap();
        let f = Field::from_fn(&l, |i, v| v[0] = i[0] as f64);
        let mut left = vec![0.0; 4];
        let mut right = vec![0.0; 4];
        let mut r = FirstOrderUpwind;
        r.interpolate(&f, 0, Bias::Left, Slot::State, Limiting::Recompute, &mut left)
            .unwrap();
        r.interpolate(&f, 0, Bias::Right, Slot::State, Limiting::Recompute, &mut right)
            .unwrap();
        assert_eq!(left, vec![-1.0, 0.0, 1.0, 2.0]);
        assert_eq!(right, vec![0.0, 1.0, 2.0, 3.0]);
    }
}

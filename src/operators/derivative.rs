//! Undivided finite-difference derivatives along one grid dimension.
//!
//! Results are not scaled by the grid spacing; callers multiply by the
//! inverse spacing of the point.

use std::str::FromStr;

use crate::grid::{Field, IndexBox};
use crate::grid_error::GridError;

/// First-derivative stencil.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FirstDerivativeScheme {
    /// Two-point biased difference.
    FirstOrder,
    #[default]
    Central2,
    Central4,
}

/// Second-derivative stencil.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SecondDerivativeScheme {
    #[default]
    Central2,
    Central4,
}

impl FromStr for FirstDerivativeScheme {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::FirstOrder),
            "2" => Ok(Self::Central2),
            "4" => Ok(Self::Central4),
            other => Err(GridError::Config(format!(
                "unknown first derivative scheme `{other}`"
            ))),
        }
    }
}

impl FromStr for SecondDerivativeScheme {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" => Ok(Self::Central2),
            "4" => Ok(Self::Central4),
            other => Err(GridError::Config(format!(
                "unknown second derivative scheme `{other}`"
            ))),
        }
    }
}

impl FirstDerivativeScheme {
    /// Points a padded line must hold for the one-sided closures.
    fn min_line(self) -> usize {
        match self {
            Self::FirstOrder => 2,
            Self::Central2 => 3,
            Self::Central4 => 5,
        }
    }
}

impl SecondDerivativeScheme {
    pub fn ghosts_required(self) -> usize {
        match self {
            Self::Central2 => 1,
            Self::Central4 => 2,
        }
    }
}

fn check_pair(out: &Field, src: &Field, dir: usize) -> Result<(), GridError> {
    if out.layout() != src.layout() {
        return Err(GridError::LayoutMismatch {
            expected: out.layout().len(),
            found: src.layout().len(),
        });
    }
    if dir >= src.layout().ndims() {
        return Err(GridError::Config(format!(
            "derivative direction {dir} on a {}-dimensional grid",
            src.layout().ndims()
        )));
    }
    Ok(())
}

/// First derivative of `src` along `dir` at every point of `region`.
///
/// `bias > 0` selects the backward difference for the first-order scheme,
/// otherwise the forward difference; central schemes ignore it. Stencils
/// that would leave the padded range switch to one-sided closures, so
/// `region` may span the ghost layers along `dir`.
pub fn first_derivative(
    scheme: FirstDerivativeScheme,
    out: &mut Field,
    src: &Field,
    dir: usize,
    bias: i32,
    region: &IndexBox,
) -> Result<(), GridError> {
    check_pair(out, src, dir)?;
    let layout = src.layout().clone();
    let g = layout.ghosts() as isize;
    let lo = -g;
    let hi = layout.dim_local()[dir] as isize + g;
    if ((hi - lo) as usize) < scheme.min_line() {
        return Err(GridError::Config(format!(
            "padded line of {} points is too short for the derivative stencil",
            hi - lo
        )));
    }
    let nvars = layout.nvars();
    let step = (layout.stride(dir) * nvars) as isize;
    let (rlo, rhi) = (region.lo()[dir], region.hi()[dir]);
    let f = src.as_slice();
    let df = out.as_mut_slice();

    region.for_each_line(dir, |start| {
        // Offset of the padded-line origin (index `lo` along `dir`).
        let origin = layout.offset(start) as isize - (rlo - lo) * step;
        for i in rlo..rhi {
            let at = |k: isize| (origin + (k - lo) * step) as usize;
            for v in 0..nvars {
                let x = |k: isize| f[at(k) + v];
                df[at(i) + v] = match scheme {
                    FirstDerivativeScheme::FirstOrder => {
                        if (bias > 0 && i > lo) || i == hi - 1 {
                            x(i) - x(i - 1)
                        } else {
                            x(i + 1) - x(i)
                        }
                    }
                    FirstDerivativeScheme::Central2 => {
                        if i == lo {
                            0.5 * (-3.0 * x(i) + 4.0 * x(i + 1) - x(i + 2))
                        } else if i == hi - 1 {
                            0.5 * (3.0 * x(i) - 4.0 * x(i - 1) + x(i - 2))
                        } else {
                            0.5 * (x(i + 1) - x(i - 1))
                        }
                    }
                    FirstDerivativeScheme::Central4 => {
                        const C: f64 = 1.0 / 12.0;
                        if i == lo {
                            C * (-25.0 * x(i) + 48.0 * x(i + 1) - 36.0 * x(i + 2)
                                + 16.0 * x(i + 3)
                                - 3.0 * x(i + 4))
                        } else if i == lo + 1 {
                            C * (-3.0 * x(i - 1) - 10.0 * x(i) + 18.0 * x(i + 1)
                                - 6.0 * x(i + 2)
                                + x(i + 3))
                        } else if i == hi - 2 {
                            C * (3.0 * x(i + 1) + 10.0 * x(i) - 18.0 * x(i - 1)
                                + 6.0 * x(i - 2)
                                - x(i - 3))
                        } else if i == hi - 1 {
                            C * (25.0 * x(i) - 48.0 * x(i - 1) + 36.0 * x(i - 2)
                                - 16.0 * x(i - 3)
                                + 3.0 * x(i - 4))
                        } else {
                            C * (x(i - 2) - 8.0 * x(i - 1) + 8.0 * x(i + 1) - x(i + 2))
                        }
                    }
                };
            }
        }
    });
    Ok(())
}

/// Second derivative of `src` along `dir` on the physical region.
pub fn second_derivative(
    scheme: SecondDerivativeScheme,
    out: &mut Field,
    src: &Field,
    dir: usize,
) -> Result<(), GridError> {
    check_pair(out, src, dir)?;
    let layout = src.layout().clone();
    layout.require_ghosts(scheme.ghosts_required())?;
    let nvars = layout.nvars();
    let step = (layout.stride(dir) * nvars) as isize;
    let f = src.as_slice();
    let df = out.as_mut_slice();
    layout.interior().for_each(|i| {
        let o = layout.offset(i) as isize;
        let x = |k: isize, v: usize| f[(o + k * step) as usize + v];
        for v in 0..nvars {
            df[o as usize + v] = match scheme {
                SecondDerivativeScheme::Central2 => x(1, v) - 2.0 * x(0, v) + x(-1, v),
                SecondDerivativeScheme::Central4 => {
                    (-x(-2, v) + 16.0 * x(-1, v) - 30.0 * x(0, v) + 16.0 * x(1, v) - x(2, v))
                        / 12.0
                }
            };
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridLayout;

    fn quadratic(layout: &GridLayout) -> Field {
        Field::from_fn(layout, |i, v| {
            let (x, y) = (i[0] as f64, i[1] as f64);
            v[0] = x * x + 3.0 * x * y - y;
        })
    }

    #[test]
    fn central_first_derivative_is_exact_for_quadratics_including_closures() {
        let l = GridLayout::new(&[5, 4], 1, 2).unwrap();
        let f = quadratic(&l);
        for scheme in [FirstDerivativeScheme::Central2, FirstDerivativeScheme::Central4] {
            let mut d = Field::zeros(&l);
            first_derivative(scheme, &mut d, &f, 0, 1, &l.padded_along(0)).unwrap();
            l.padded_along(0).for_each(|i| {
                let want = 2.0 * i[0] as f64 + 3.0 * i[1] as f64;
                assert!((d.at(i)[0] - want).abs() < 1e-10, "{scheme:?} at {i:?}");
            });
        }
    }

    #[test]
    fn biased_first_order_difference() {
        let l = GridLayout::new(&[4], 1, 1).unwrap();
        let f = Field::from_fn(&l, |i, v| v[0] = (i[0] * i[0]) as f64);
        let mut back = Field::zeros(&l);
        let mut fwd = Field::zeros(&l);
        first_derivative(FirstDerivativeScheme::FirstOrder, &mut back, &f, 0, 1, &l.interior()).unwrap();
        first_derivative(FirstDerivativeScheme::FirstOrder, &mut fwd, &f, 0, -1, &l.interior()).unwrap();
        assert_eq!(back.at(&[2])[0], 4.0 - 1.0);
        assert_eq!(fwd.at(&[2])[0], 9.0 - 4.0);
    }

    #[test]
    fn second_derivative_of_quadratic_is_constant() {
        let l = GridLayout::new(&[5, 4], 1, 2).unwrap();
        let f = quadratic(&l);
        for scheme in [SecondDerivativeScheme::Central2, SecondDerivativeScheme::Central4] {
            let mut d = Field::zeros(&l);
            second_derivative(scheme, &mut d, &f, 0).unwrap();
            l.interior().for_each(|i| assert!((d.at(i)[0] - 2.0).abs() < 1e-12));
            second_derivative(scheme, &mut d, &f, 1).unwrap();
            l.interior().for_each(|i| assert!(d.at(i)[0].abs() < 1e-12));
        }
    }

    #[test]
    fn fourth_order_needs_two_ghosts() {
        let l = GridLayout::new(&[4], 1, 1).unwrap();
        let f = Field::zeros(&l);
        let mut d = Field::zeros(&l);
        assert_eq!(
            second_derivative(SecondDerivativeScheme::Central4, &mut d, &f, 0),
            Err(GridError::InsufficientGhosts {
                required: 2,
                available: 1
            })
        );
    }
}

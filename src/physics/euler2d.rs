//! Two-dimensional Euler equations, conserved variables `[rho, rho*u, rho*v, E]`.
//!
//! The eigenstructure is written for a unit normal `(nx, ny)`; grid dimension
//! 0 uses `(1, 0)` and dimension 1 uses `(0, 1)`.

use crate::grid_error::GridError;
use crate::physics::{Eigensystem, PhysicsModel};

#[derive(Clone, Debug, PartialEq)]
pub struct Euler2D {
    gamma: f64,
}

struct Primitive {
    rho: f64,
    u: f64,
    v: f64,
    c: f64,
    h: f64,
}

#[inline]
fn normal(dir: usize) -> (f64, f64) {
    if dir == 0 { (1.0, 0.0) } else { (0.0, 1.0) }
}

impl Euler2D {
    pub fn new(gamma: f64) -> Result<Self, GridError> {
        if !(gamma > 1.0) {
            return Err(GridError::Config(format!(
                "ratio of specific heats must exceed 1, got {gamma}"
            )));
        }
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    pub fn pressure(&self, u: &[f64]) -> f64 {
        (self.gamma - 1.0) * (u[3] - 0.5 * (u[1] * u[1] + u[2] * u[2]) / u[0])
    }

    pub fn conserved(&self, rho: f64, vx: f64, vy: f64, p: f64) -> [f64; 4] {
        [
            rho,
            rho * vx,
            rho * vy,
            p / (self.gamma - 1.0) + 0.5 * rho * (vx * vx + vy * vy),
        ]
    }

    fn primitive(&self, u: &[f64]) -> Result<Primitive, GridError> {
        let rho = u[0];
        if !(rho > 0.0) {
            return Err(GridError::NonPhysicalState(format!("density {rho}")));
        }
        let p = self.pressure(u);
        if !(p > 0.0) {
            return Err(GridError::NonPhysicalState(format!("pressure {p}")));
        }
        Ok(Primitive {
            rho,
            u: u[1] / rho,
            v: u[2] / rho,
            c: (self.gamma * p / rho).sqrt(),
            h: (u[3] + p) / rho,
        })
    }
}

impl PhysicsModel for Euler2D {
    fn name(&self) -> &'static str {
        "euler2d"
    }

    fn nvars(&self) -> usize {
        4
    }

    fn ndims(&self) -> usize {
        2
    }

    fn flux(&self, u: &[f64], dir: usize, out: &mut [f64]) {
        let (nx, ny) = normal(dir);
        let p = self.pressure(u);
        let un = (u[1] * nx + u[2] * ny) / u[0];
        out[0] = u[0] * un;
        out[1] = u[1] * un + p * nx;
        out[2] = u[2] * un + p * ny;
        out[3] = (u[3] + p) * un;
    }

    fn roe_average(
        &self,
        ul: &[f64],
        ur: &[f64],
        _dir: usize,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        let l = self.primitive(ul)?;
        let r = self.primitive(ur)?;
        let (sl, sr) = (l.rho.sqrt(), r.rho.sqrt());
        let w = 1.0 / (sl + sr);
        let rho = sl * sr;
        let u = (sl * l.u + sr * r.u) * w;
        let v = (sl * l.v + sr * r.v) * w;
        let h = (sl * l.h + sr * r.h) * w;
        let g = self.gamma;
        out[0] = rho;
        out[1] = rho * u;
        out[2] = rho * v;
        out[3] = rho * h / g + rho * (g - 1.0) * (u * u + v * v) / (2.0 * g);
        Ok(())
    }

    fn eigen(&self, u: &[f64], dir: usize, eig: &mut Eigensystem) -> Result<(), GridError> {
        let Primitive { u, v, c, h, .. } = self.primitive(u)?;
        let (nx, ny) = normal(dir);
        let un = u * nx + v * ny;
        let ut = -u * ny + v * nx;
        let q2 = u * u + v * v;
        let b = (self.gamma - 1.0) / (c * c);
        let k = 0.5 * b * q2;

        eig.lambda.copy_from_slice(&[un - c, un, un + c, un]);

        eig.right.set_col(0, &[1.0, u - c * nx, v - c * ny, h - un * c]);
        eig.right.set_col(1, &[1.0, u, v, 0.5 * q2]);
        eig.right.set_col(2, &[1.0, u + c * nx, v + c * ny, h + un * c]);
        eig.right.set_col(3, &[0.0, -ny, nx, ut]);

        eig.left.set_row(
            0,
            &[
                0.5 * (k + un / c),
                -0.5 * (b * u + nx / c),
                -0.5 * (b * v + ny / c),
                0.5 * b,
            ],
        );
        eig.left.set_row(1, &[1.0 - k, b * u, b * v, -b]);
        eig.left.set_row(
            2,
            &[
                0.5 * (k - un / c),
                -0.5 * (b * u - nx / c),
                -0.5 * (b * v - ny / c),
                0.5 * b,
            ],
        );
        eig.left.set_row(3, &[-ut, -ny, nx, 0.0]);
        Ok(())
    }

    fn eigenvalues(&self, u: &[f64], dir: usize, out: &mut [f64]) -> Result<(), GridError> {
        let p = self.primitive(u)?;
        let (nx, ny) = normal(dir);
        let un = p.u * nx + p.v * ny;
        out.copy_from_slice(&[un - p.c, un, un + p.c, un]);
        Ok(())
    }

    fn homogeneous_flux(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_and_right_eigenvectors_are_inverse_in_both_directions() {
        let m = Euler2D::new(1.4).unwrap();
        let u = m.conserved(1.1, 0.3, -0.7, 2.0);
        let mut eig = Eigensystem::new(4);
        for dir in 0..2 {
            m.eigen(&u, dir, &mut eig).unwrap();
            assert!(eig.orthonormality_defect() < 1e-12, "dir {dir}");
        }
    }

    #[test]
    fn closed_form_eigenvalues_match_the_eigensystem() {
        let m = Euler2D::new(1.4).unwrap();
        let u = m.conserved(0.8, -0.4, 1.2, 1.5);
        let mut eig = Eigensystem::new(4);
        let mut lambda = [0.0; 4];
        for dir in 0..2 {
            m.eigen(&u, dir, &mut eig).unwrap();
            m.eigenvalues(&u, dir, &mut lambda).unwrap();
            assert_eq!(&lambda[..], &eig.lambda[..], "dir {dir}");
        }
    }

    #[test]
    fn flux_along_y_swaps_momentum_roles() {
        let m = Euler2D::new(1.4).unwrap();
        let u = m.conserved(1.0, 0.0, 2.0, 1.0);
        let mut f = [0.0; 4];
        m.flux(&u, 1, &mut f);
        assert!((f[0] - 2.0).abs() < 1e-14);
        assert!(f[1].abs() < 1e-14);
        assert!((f[2] - 5.0).abs() < 1e-14);
    }
}

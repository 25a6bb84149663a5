//! Serializable solver configuration.
//!
//! Scheme choices are plain strings, parsed and checked by
//! [`SolverConfig::validate`] before anything is allocated.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryZone;
use crate::flux::UpwindScheme;
use crate::grid_error::GridError;
use crate::implicit::JacobianConfig;
use crate::operators::{FirstDerivativeScheme, SecondDerivativeScheme};
use crate::physics::ModelConfig;
use crate::reconstruction::ReconstructionKind;

/// Everything needed to build a [`Solver`](crate::solver::Solver) on one rank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub model: ModelConfig,
    /// Global number of grid points per dimension.
    pub size: Vec<usize>,
    /// Ranks per dimension; empty means one rank per dimension.
    pub iproc: Vec<usize>,
    /// Periodicity per dimension; empty means non-periodic.
    pub periodic: Vec<bool>,
    pub ghosts: usize,
    /// Physical domain `[xmin, xmax]` per dimension; empty means the unit box.
    pub xmin: Vec<f64>,
    pub xmax: Vec<f64>,
    pub upwinding: String,
    pub reconstruction: String,
    pub first_derivative: String,
    pub second_derivative: String,
    pub boundaries: Vec<BoundaryZone>,
    pub jacobian: JacobianConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            size: vec![64],
            iproc: Vec::new(),
            periodic: Vec::new(),
            ghosts: 3,
            xmin: Vec::new(),
            xmax: Vec::new(),
            upwinding: "roe".into(),
            reconstruction: "1".into(),
            first_derivative: "2".into(),
            second_derivative: "2".into(),
            boundaries: Vec::new(),
            jacobian: JacobianConfig::default(),
        }
    }
}

/// A validated configuration with every string choice parsed.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub ndims: usize,
    pub nvars: usize,
    pub iproc: Vec<usize>,
    pub periodic: Vec<bool>,
    pub xmin: Vec<f64>,
    pub xmax: Vec<f64>,
    pub upwind: UpwindScheme,
    pub reconstruction: ReconstructionKind,
    pub first: FirstDerivativeScheme,
    pub second: SecondDerivativeScheme,
}

fn per_dim<T: Clone>(what: &str, v: &[T], ndims: usize, fill: T) -> Result<Vec<T>, GridError> {
    match v.len() {
        0 => Ok(vec![fill; ndims]),
        n if n == ndims => Ok(v.to_vec()),
        n => Err(GridError::Config(format!(
            "{what} has {n} entries for a {ndims}-dimensional grid"
        ))),
    }
}

impl SolverConfig {
    /// Check every configuration choice; the first failure is fatal.
    pub fn validate(&self) -> Result<ResolvedConfig, GridError> {
        let ndims = self.size.len();
        if ndims == 0 || self.size.contains(&0) {
            return Err(GridError::Config(format!("invalid grid size {:?}", self.size)));
        }
        let nvars = self.model.nvars();
        let model = self.model.build(ndims, nvars)?;

        let iproc = per_dim("iproc", &self.iproc, ndims, 1)?;
        if iproc.contains(&0) {
            return Err(GridError::Config(format!("invalid process grid {iproc:?}")));
        }
        let periodic = per_dim("periodic", &self.periodic, ndims, false)?;
        let xmin = per_dim("xmin", &self.xmin, ndims, 0.0)?;
        let xmax = per_dim("xmax", &self.xmax, ndims, 1.0)?;
        if let Some(d) = (0..ndims).find(|&d| !(xmin[d] < xmax[d])) {
            return Err(GridError::Config(format!("empty domain along dimension {d}")));
        }

        let upwind: UpwindScheme = self.upwinding.parse()?;
        upwind.check_model(model.as_ref())?;
        let reconstruction: ReconstructionKind = self.reconstruction.parse()?;
        let first: FirstDerivativeScheme = self.first_derivative.parse()?;
        let second: SecondDerivativeScheme = self.second_derivative.parse()?;

        let needed = reconstruction
            .build()
            .ghosts_required()
            .max(second.ghosts_required());
        if self.ghosts < needed {
            return Err(GridError::InsufficientGhosts {
                required: needed,
                available: self.ghosts,
            });
        }
        // The thinnest block of the partition must still fill a whole ghost slab.
        for d in 0..ndims {
            let points = self.size[d] / iproc[d];
            if points < self.ghosts {
                return Err(GridError::SubdomainTooThin {
                    dim: d,
                    points,
                    ghosts: self.ghosts,
                });
            }
        }
        for zone in &self.boundaries {
            zone.validate(ndims, nvars)?;
            if periodic[zone.dim()] && !zone.is_sponge() {
                log::warn!(
                    "boundary zone on periodic dimension {} is ignored",
                    zone.dim()
                );
            }
        }
        self.jacobian.validate()?;

        Ok(ResolvedConfig {
            ndims,
            nvars,
            iproc,
            periodic,
            xmin,
            xmax,
            upwind,
            reconstruction,
            first,
            second,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let r = SolverConfig::default().validate().unwrap();
        assert_eq!((r.ndims, r.nvars), (1, 3));
        assert_eq!(r.upwind, UpwindScheme::Roe);
        assert_eq!(r.iproc, vec![1]);
    }

    #[test]
    fn unknown_upwind_name_is_fatal() {
        let cfg = SolverConfig {
            upwinding: "muscl".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(GridError::Config(_))));
    }

    #[test]
    fn steger_warming_on_shallow_water_is_rejected() {
        let cfg = SolverConfig {
            model: ModelConfig::ShallowWater1D { gravity: 9.81 },
            upwinding: "steger-warming".into(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(GridError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn weno_needs_three_ghosts() {
        let cfg = SolverConfig {
            reconstruction: "weno5".into(),
            ghosts: 2,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate().unwrap_err(),
            GridError::InsufficientGhosts {
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn subdomains_thinner_than_the_halo_are_rejected() {
        let split = SolverConfig {
            size: vec![8],
            iproc: vec![4],
            reconstruction: "weno5".into(),
            ..Default::default()
        };
        assert_eq!(
            split.validate().unwrap_err(),
            GridError::SubdomainTooThin {
                dim: 0,
                points: 2,
                ghosts: 3
            }
        );
        let tiny = SolverConfig {
            size: vec![2],
            periodic: vec![true],
            ..Default::default()
        };
        assert!(matches!(
            tiny.validate(),
            Err(GridError::SubdomainTooThin { points: 2, .. })
        ));
        let uneven = SolverConfig {
            size: vec![7],
            iproc: vec![2],
            ..Default::default()
        };
        assert!(uneven.validate().is_ok());
    }
}

//! Physical models: fluxes, characteristic decompositions, diffusion and sources.
//!
//! Each model is one implementation of [`PhysicsModel`]. Capabilities a model
//! lacks (no diffusion, no source) make the matching operator evaluate to
//! zero rather than fail.

pub mod eigen;
pub mod euler1d;
pub mod euler2d;
pub mod linear_adr;
pub mod shallow_water1d;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::grid_error::GridError;

pub use eigen::{Eigensystem, SquareMatrix};
pub use euler1d::Euler1D;
pub use euler2d::Euler2D;
pub use linear_adr::LinearAdr;
pub use shallow_water1d::ShallowWater1D;

/// Capability set of a hyperbolic-parabolic system.
///
/// All methods work on single points: `u` holds the `nvars` conserved
/// variables, `dir` is a grid dimension.
pub trait PhysicsModel: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn nvars(&self) -> usize;
    fn ndims(&self) -> usize;

    /// Whether the model has a hyperbolic flux.
    fn has_flux(&self) -> bool {
        true
    }

    /// Physical flux `F_dir(u)`.
    fn flux(&self, u: &[f64], dir: usize, out: &mut [f64]);

    /// Roe-averaged state of `ul` and `ur`.
    fn roe_average(&self, ul: &[f64], ur: &[f64], dir: usize, out: &mut [f64])
    -> Result<(), GridError>;

    /// Eigenvalues and left/right eigenvectors of `dF_dir/du` at `u`.
    fn eigen(&self, u: &[f64], dir: usize, eig: &mut Eigensystem) -> Result<(), GridError>;

    /// Eigenvalues only, in the same order as [`PhysicsModel::eigen`].
    fn eigenvalues(&self, u: &[f64], dir: usize, out: &mut [f64]) -> Result<(), GridError> {
        let mut eig = Eigensystem::new(self.nvars());
        self.eigen(u, dir, &mut eig)?;
        out.copy_from_slice(&eig.lambda);
        Ok(())
    }

    /// Whether `F(u) = A(u) u`, a prerequisite for Steger-Warming splitting.
    fn homogeneous_flux(&self) -> bool {
        false
    }

    fn has_diffusion(&self) -> bool {
        false
    }

    /// Diffusion flux `h_{d1,d2}(u)`; the parabolic term is
    /// `sum_{d1,d2} d/dx_d2 ( d h_{d1,d2} / dx_d1 )`.
    fn diffusion_flux(&self, u: &[f64], d1: usize, d2: usize, out: &mut [f64]) {
        let _ = (u, d1, d2);
        out.iter_mut().for_each(|x| *x = 0.0);
    }

    fn has_source(&self) -> bool {
        false
    }

    /// Point-wise model source; added to the source term.
    fn source(&self, u: &[f64], out: &mut [f64]) {
        let _ = u;
        out.iter_mut().for_each(|x| *x = 0.0);
    }
}

fn default_gamma() -> f64 {
    1.4
}

fn default_gravity() -> f64 {
    9.81
}

fn default_nvars() -> usize {
    1
}

/// Serializable model choice; [`ModelConfig::build`] is the model factory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum ModelConfig {
    #[serde(rename = "euler1d")]
    Euler1D {
        #[serde(default = "default_gamma")]
        gamma: f64,
    },
    #[serde(rename = "euler2d")]
    Euler2D {
        #[serde(default = "default_gamma")]
        gamma: f64,
    },
    #[serde(rename = "shallow-water1d")]
    ShallowWater1D {
        #[serde(default = "default_gravity")]
        gravity: f64,
    },
    #[serde(rename = "linear-adr")]
    LinearAdr {
        advection: Vec<f64>,
        /// Row `d1`, column `d2`; empty means no diffusion.
        #[serde(default)]
        diffusion: Vec<Vec<f64>>,
        #[serde(default)]
        reaction: f64,
        #[serde(default = "default_nvars")]
        nvars: usize,
    },
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Euler1D {
            gamma: default_gamma(),
        }
    }
}

impl ModelConfig {
    /// Number of conserved variables of the configured model.
    pub fn nvars(&self) -> usize {
        match self {
            ModelConfig::Euler1D { .. } => 3,
            ModelConfig::Euler2D { .. } => 4,
            ModelConfig::ShallowWater1D { .. } => 2,
            ModelConfig::LinearAdr { nvars, .. } => *nvars,
        }
    }

    /// Build the model, checking it against the grid's dimension and variable counts.
    pub fn build(&self, ndims: usize, nvars: usize) -> Result<Arc<dyn PhysicsModel>, GridError> {
        let model: Arc<dyn PhysicsModel> = match self {
            ModelConfig::Euler1D { gamma } => Arc::new(Euler1D::new(*gamma)?),
            ModelConfig::Euler2D { gamma } => Arc::new(Euler2D::new(*gamma)?),
            ModelConfig::ShallowWater1D { gravity } => Arc::new(ShallowWater1D::new(*gravity)?),
            ModelConfig::LinearAdr {
                advection,
                diffusion,
                reaction,
                nvars,
            } => Arc::new(LinearAdr::new(
                *nvars,
                advection.clone(),
                diffusion.clone(),
                *reaction,
            )?),
        };
        if model.ndims() != ndims {
            return Err(GridError::Config(format!(
                "model {} is {}-dimensional, grid has {ndims} dimensions",
                model.name(),
                model.ndims()
            )));
        }
        if model.nvars() != nvars {
            return Err(GridError::Config(format!(
                "model {} has {} variables, grid has {nvars}",
                model.name(),
                model.nvars()
            )));
        }
        Ok(model)
    }
}

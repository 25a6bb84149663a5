#![cfg_attr(docsrs, feature(doc_cfg))]
//! # gridflux
//!
//! gridflux evaluates the spatial discretization of hyperbolic-parabolic PDEs
//! on a distributed, ghost-padded structured grid, and exposes it as the
//! right-hand side of a semi-discrete ODE for explicit or implicit time
//! integrators.
//!
//! ## Features
//! - Characteristic decompositions and Roe averages for Euler (1D, 2D),
//!   shallow water and linear advection-diffusion-reaction models
//! - Upwind interface fluxes: Roe, Roe-fixed, local Lax-Friedrichs and
//!   Steger-Warming splitting
//! - First-order and WENO5 interface interpolation with frozen weights
//! - Diffusion terms with cross derivatives, synchronized across subdomains
//! - Sponge-zone forcing and ghost boundary conditions
//! - Matrix-free Jacobian-vector products for Newton-Krylov solves
//! - Pluggable communication backends (serial, in-process threads, MPI)
//!
//! ## Sign convention
//!
//! Every evaluation follows `rhs = -hyperbolic(u) + parabolic(u) + source(u)`.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! gridflux = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```

pub mod algs;
pub mod boundary;
pub mod flux;
pub mod grid;
pub mod grid_error;
pub mod implicit;
pub mod operators;
pub mod physics;
pub mod reconstruction;
pub mod solver;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, NoComm, RayonComm};
    pub use crate::algs::halo::{HaloExchange, ProcessGrid, Side};
    pub use crate::boundary::BoundaryZone;
    pub use crate::flux::UpwindScheme;
    pub use crate::grid::{Coordinates, Field, GridLayout};
    pub use crate::grid_error::GridError;
    pub use crate::implicit::{
        JacobianAction, JacobianConfig, JacobianMode, JacobianOperator, LinearOperator,
    };
    pub use crate::physics::{ModelConfig, PhysicsModel};
    pub use crate::reconstruction::{Limiting, ReconstructionKind};
    pub use crate::solver::{Counters, Solver, SolverConfig};
}

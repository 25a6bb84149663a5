//! Communication and distributed algorithms: halo exchange and reductions.

pub mod communicator;
pub mod halo;
pub mod reduction;
pub mod wire;

pub use communicator::{CommTag, Communicator, NoComm, RayonComm, Wait};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use halo::{HaloExchange, ProcessGrid, Side};
pub use reduction::{global_norm2, global_sum};

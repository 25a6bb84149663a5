//! GridError: Unified error type for gridflux public APIs
//!
//! Every spatial operator returns `Result<_, GridError>`. A returned error is an
//! immediate-return signal: partially computed derivatives are never used, and
//! nothing in the crate retries. Errors raised by the halo exchange
//! (`HaloSizeMismatch`, `CommError`, `SubdomainTooThin`) are agreed on
//! collectively: when one rank fails, every rank's exchange returns an error.

use thiserror::Error;

/// Unified error type for gridflux operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Invalid or inconsistent configuration detected at initialization.
    #[error("configuration error: {0}")]
    Config(String),
    /// The requested upwind scheme is not offered by the physical model.
    #[error("upwind scheme `{scheme}` is not supported by model `{model}`")]
    UnsupportedScheme {
        scheme: &'static str,
        model: &'static str,
    },
    /// A field or scratch buffer was sized for a different layout.
    #[error("layout mismatch: expected {expected} values, found {found}")]
    LayoutMismatch { expected: usize, found: usize },
    /// A stencil needs more ghost layers than the grid carries.
    #[error("stencil requires {required} ghost layers, grid has {available}")]
    InsufficientGhosts { required: usize, available: usize },
    /// A subdomain has fewer points along a dimension than there are ghost layers.
    #[error("dimension {dim}: subdomain of {points} points is thinner than {ghosts} ghost layers")]
    SubdomainTooThin {
        dim: usize,
        points: usize,
        ghosts: usize,
    },
    /// A halo message from a neighbour had the wrong length.
    #[error("halo message from rank {neighbor}: expected {expected} bytes, got {found}")]
    HaloSizeMismatch {
        neighbor: usize,
        expected: usize,
        found: usize,
    },
    /// Communication with a neighbour failed.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// The exchange succeeded locally but failed on other ranks.
    #[error("halo exchange failed on {failed} other rank(s)")]
    PeerFailure { failed: usize },
    /// Frozen reconstruction weights were requested before any were computed.
    #[error("no frozen reconstruction weights for direction {dir}")]
    MissingFrozenWeights { dir: usize },
    /// A state outside the model's admissible set (negative density, depth, ...).
    #[error("non-physical state: {0}")]
    NonPhysicalState(String),
    /// An operation was invoked before its required setup step.
    #[error("not initialized: {0}")]
    NotInitialized(&'static str),
}

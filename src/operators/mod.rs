//! Spatial operators: derivative stencils and the hyperbolic, parabolic and
//! source terms of the semi-discrete right-hand side.

pub mod derivative;
pub mod hyperbolic;
pub mod parabolic;
pub mod rhs;
pub mod source;

pub use derivative::{
    FirstDerivativeScheme, SecondDerivativeScheme, first_derivative, second_derivative,
};
pub use hyperbolic::HyperbolicEvaluator;
pub use parabolic::ParabolicEvaluator;
pub use rhs::assemble_rhs;
pub use source::evaluate_source;

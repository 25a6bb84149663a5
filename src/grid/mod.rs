//! Grid/state descriptor, ghost-padded fields and coordinates.

pub mod coordinates;
pub mod field;
pub mod layout;

pub use coordinates::Coordinates;
pub use field::Field;
pub use layout::{GridLayout, IndexBox, InterfaceLayout};

//! Hardpoints: declared, lazily-resolved relationship slots.
//!
//! A ref type declares its hardpoints once, at construction. Each slot moves
//! through `Unresolved -> Resolving -> Resolved | Failed` exactly once.

mod set;
mod slot;
mod template;
mod value;

pub use set::HardpointSet;
pub use slot::{Hardpoint, HardpointState, HardpointStatus};
pub use template::{RefFactory, Template};
pub use value::{HardpointValue, RawValue};

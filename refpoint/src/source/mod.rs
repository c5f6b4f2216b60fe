//! Remote source abstraction layer.
//!
//! Transport is not part of this crate. Callers plug in any client that can
//! answer search calls; `MockSource` covers tests and demos.

pub mod mock;
pub mod traits;

pub use mock::MockSource;
pub use traits::{RemoteQuery, RemoteSource};

//! Hardpoint loaders.
//!
//! A loader knows how to fetch one or more named hardpoints for a batch of
//! refs from a remote source.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::hardpoint::RawValue;
use crate::reference::RefHandle;
use crate::source::RemoteSource;

/// Result for a single ref in a batch.
pub type LoadOutcome = Result<RawValue, SourceError>;

/// Fetches hardpoint data for batches of refs.
///
/// `load` must return exactly one outcome per ref, in the order the refs
/// were given. Returning `Err` fails the whole batch; per-ref errors fail
/// only that ref's slot.
#[async_trait]
pub trait HardpointLoader: Send + Sync {
    /// Hardpoint names this loader serves.
    fn hardpoints(&self) -> &[&'static str];

    /// Load `hardpoint` for every ref in `refs` with as few calls as possible.
    async fn load(
        &self,
        source: &dyn RemoteSource,
        hardpoint: &str,
        refs: &[RefHandle],
    ) -> Result<Vec<LoadOutcome>, SourceError>;
}

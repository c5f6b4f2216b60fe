//! Hardpoint resolution.
//!
//! The `Resolver` fills hardpoint slots from a remote source:
//! - claims every unresolved slot it is asked for (at most one fetch per slot)
//! - groups claimed slots by hardpoint name into one loader call per group
//! - converts raw records into typed refs through each slot's template
//! - lets callers that find a slot already in flight wait on that fetch
//!
//! ```text
//! get_hardpoint / resolve_batch / flush
//!            │
//!            ▼
//!   ┌─────────────────┐  claim (Unresolved → Resolving)
//!   │    Resolver     │──────────────────────────────┐
//!   └────────┬────────┘                              │
//!            │ one spawned task per (hardpoint, chunk)│
//!            ▼                                       ▼
//!   ┌─────────────────┐    search     ┌──────────────────────┐
//!   │ HardpointLoader │──────────────►│     RemoteSource     │
//!   └────────┬────────┘               └──────────────────────┘
//!            │ per-ref outcomes → Template::build → slot
//!            ▼
//!       Resolved | Failed
//! ```
//!
//! Fetches run on spawned tasks, so a caller that gives up (deadline, drop)
//! never leaves a slot stuck in `Resolving` for everyone else.

mod config;
mod loader;

pub use config::ResolverConfig;

use config::duration_ms;
pub use loader::{HardpointLoader, LoadOutcome};

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{RefError, Result};
use crate::hardpoint::{HardpointStatus, HardpointValue, RawValue};
use crate::reference::{RefHandle, RefType};
use crate::source::RemoteSource;

// =============================================================================
// Requests
// =============================================================================

/// One `(ref, hardpoint)` pair to resolve.
#[derive(Debug, Clone)]
pub struct HardpointRequest {
    target: RefHandle,
    hardpoint: String,
}

impl HardpointRequest {
    pub fn new(target: &RefHandle, hardpoint: impl Into<String>) -> Self {
        Self {
            target: target.clone(),
            hardpoint: hardpoint.into(),
        }
    }

    pub fn target(&self) -> &RefHandle {
        &self.target
    }

    pub fn hardpoint(&self) -> &str {
        &self.hardpoint
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves hardpoints against a remote source.
///
/// Passed explicitly to whatever needs to read relationships; there is no
/// global instance.
pub struct Resolver {
    config: ResolverConfig,
    source: Arc<dyn RemoteSource>,
    /// Hardpoint name -> loader serving it
    loaders: HashMap<String, Arc<dyn HardpointLoader>>,
    /// Requests queued by `defer`, drained by `flush`
    deferred: Mutex<Vec<HardpointRequest>>,
}

impl Resolver {
    /// Create a resolver with no loaders.
    pub fn new(source: Arc<dyn RemoteSource>) -> Self {
        debug!(source = source.id(), "Creating hardpoint resolver");
        Self {
            config: ResolverConfig::default(),
            source,
            loaders: HashMap::new(),
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a loader for every hardpoint it serves.
    pub fn with_loader(self, loader: impl HardpointLoader + 'static) -> Self {
        self.with_shared_loader(Arc::new(loader))
    }

    /// Register a shared loader.
    ///
    /// A later registration for the same hardpoint replaces the earlier one.
    pub fn with_shared_loader(mut self, loader: Arc<dyn HardpointLoader>) -> Self {
        for hardpoint in loader.hardpoints() {
            if self
                .loaders
                .insert(hardpoint.to_string(), loader.clone())
                .is_some()
            {
                warn!(hardpoint = %hardpoint, "Replacing previously registered loader");
            }
        }
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn RemoteSource> {
        &self.source
    }

    /// Whether a loader is registered for `hardpoint`.
    pub fn serves(&self, hardpoint: &str) -> bool {
        self.loaders.contains_key(hardpoint)
    }

    // =========================================================================
    // Single hardpoint access
    // =========================================================================

    /// Get a hardpoint value, resolving it first if needed.
    ///
    /// Cached values return without I/O. Undeclared names fail with
    /// `MissingHardpoint` before anything is fetched. When the config sets a
    /// default timeout it applies here.
    pub async fn get_hardpoint(
        &self,
        target: &RefHandle,
        hardpoint: &str,
    ) -> Result<HardpointValue> {
        match self.config.default_timeout() {
            Some(timeout) => self.get_hardpoint_within(target, hardpoint, timeout).await,
            None => self.fetch_one(target, hardpoint).await,
        }
    }

    /// Like [`Resolver::get_hardpoint`] with a caller-side deadline.
    ///
    /// Expiry reports `Timeout` to this caller only; the fetch keeps running
    /// and other callers still see its result.
    pub async fn get_hardpoint_within(
        &self,
        target: &RefHandle,
        hardpoint: &str,
        timeout: Duration,
    ) -> Result<HardpointValue> {
        target.hardpoints().require(target.ref_type(), hardpoint)?;

        let fetch = self.fetch_one(target, hardpoint);
        match tokio::time::timeout(timeout, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let timeout_ms = duration_ms(timeout);
                warn!(
                    hardpoint = %hardpoint,
                    monogram = %target.monogram(),
                    timeout_ms,
                    "Deadline expired waiting for hardpoint"
                );
                Err(RefError::Timeout {
                    name: hardpoint.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    /// Get a single-object hardpoint as a concrete ref type.
    pub async fn get_object<T: RefType>(
        &self,
        target: &RefHandle,
        hardpoint: &str,
    ) -> Result<Option<Arc<T>>> {
        let value = self.get_hardpoint(target, hardpoint).await?;
        Ok(value.object::<T>())
    }

    /// Get an object-list hardpoint as concrete refs, in source order.
    pub async fn get_objects<T: RefType>(
        &self,
        target: &RefHandle,
        hardpoint: &str,
    ) -> Result<Vec<Arc<T>>> {
        let value = self.get_hardpoint(target, hardpoint).await?;
        Ok(value.objects::<T>())
    }

    async fn fetch_one(&self, target: &RefHandle, hardpoint: &str) -> Result<HardpointValue> {
        let slot = target.hardpoints().require(target.ref_type(), hardpoint)?;
        if let Some(outcome) = slot.settled() {
            return outcome;
        }

        self.resolve_batch(vec![HardpointRequest::new(target, hardpoint)])
            .await
            .pop()
            .unwrap_or_else(|| Err(RefError::illegal(hardpoint, "resolver produced no outcome")))
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Resolve one hardpoint across many refs in as few calls as possible.
    pub async fn resolve_all(
        &self,
        targets: &[RefHandle],
        hardpoint: &str,
    ) -> Vec<Result<HardpointValue>> {
        let requests = targets
            .iter()
            .map(|target| HardpointRequest::new(target, hardpoint))
            .collect();
        self.resolve_batch(requests).await
    }

    /// Resolve a set of requests; one outcome per request, in order.
    ///
    /// Requests sharing a hardpoint name are merged into one loader call
    /// (chunked by `max_batch_size`). Repeated `(ref, hardpoint)` pairs, and
    /// slots already being fetched elsewhere, wait on the single fetch.
    pub async fn resolve_batch(
        &self,
        requests: Vec<HardpointRequest>,
    ) -> Vec<Result<HardpointValue>> {
        let mut outcomes: Vec<Option<Result<HardpointValue>>> = vec![None; requests.len()];
        let mut groups: Vec<(String, Vec<RefHandle>)> = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            let target = &request.target;
            let required = target
                .hardpoints()
                .require(target.ref_type(), &request.hardpoint);
            let slot = match required {
                Ok(slot) => slot,
                Err(error) => {
                    outcomes[index] = Some(Err(error));
                    continue;
                }
            };

            if let Some(outcome) = slot.settled() {
                outcomes[index] = Some(outcome);
                continue;
            }

            if !slot.try_claim() {
                // In flight, either earlier in this batch or elsewhere.
                continue;
            }

            match groups
                .iter_mut()
                .find(|(name, _)| *name == request.hardpoint)
            {
                Some((_, refs)) => refs.push(target.clone()),
                None => groups.push((request.hardpoint.clone(), vec![target.clone()])),
            }
        }

        let mut tasks = Vec::new();
        for (hardpoint, refs) in groups {
            let Some(loader) = self.loaders.get(&hardpoint).cloned() else {
                warn!(
                    hardpoint = %hardpoint,
                    refs = refs.len(),
                    "No loader registered for hardpoint"
                );
                for target in &refs {
                    settle(target, &hardpoint, Err(RefError::NoLoader(hardpoint.clone())));
                }
                continue;
            };

            for chunk in refs.chunks(self.config.effective_batch_size()) {
                tasks.push(tokio::spawn(load_batch(
                    self.source.clone(),
                    loader.clone(),
                    hardpoint.clone(),
                    chunk.to_vec(),
                )));
            }
        }

        if !tasks.is_empty() {
            debug!(
                batches = tasks.len(),
                requests = requests.len(),
                "Dispatched hardpoint batches"
            );
        }
        for joined in join_all(tasks).await {
            if let Err(error) = joined {
                warn!(error = %error, "Hardpoint load task did not complete");
            }
        }

        let mut results = Vec::with_capacity(requests.len());
        for (request, outcome) in requests.iter().zip(outcomes) {
            let result = match outcome {
                Some(outcome) => outcome,
                None => match request
                    .target
                    .hardpoints()
                    .require(request.target.ref_type(), &request.hardpoint)
                {
                    Ok(slot) => slot.wait().await,
                    Err(error) => Err(error),
                },
            };
            results.push(result);
        }
        results
    }

    // =========================================================================
    // Deferred requests
    // =========================================================================

    /// Queue a request for the next [`Resolver::flush`].
    pub fn defer(&self, target: &RefHandle, hardpoint: impl Into<String>) {
        self.deferred
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(HardpointRequest::new(target, hardpoint));
    }

    /// Number of queued requests.
    pub fn pending(&self) -> usize {
        self.deferred
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Resolve everything queued so far as a single batch.
    ///
    /// Outcomes are returned in the order the requests were deferred.
    pub async fn flush(&self) -> Vec<Result<HardpointValue>> {
        let requests = std::mem::take(
            &mut *self
                .deferred
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        debug!(requests = requests.len(), "Flushing deferred hardpoint requests");
        self.resolve_batch(requests).await
    }
}

// =============================================================================
// Batch execution
// =============================================================================

/// Slots claimed for one loader call.
///
/// Dropping the guard fails any slot still `Resolving`, so a panicking or
/// cancelled load never strands waiters.
struct ClaimGuard {
    hardpoint: String,
    refs: Vec<RefHandle>,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        for target in &self.refs {
            let Some(slot) = target.hardpoints().get(&self.hardpoint) else {
                continue;
            };
            if slot.status() == HardpointStatus::Resolving {
                let _ = slot.fail(RefError::illegal(
                    &self.hardpoint,
                    "load aborted before completion",
                ));
            }
        }
    }
}

async fn load_batch(
    source: Arc<dyn RemoteSource>,
    loader: Arc<dyn HardpointLoader>,
    hardpoint: String,
    refs: Vec<RefHandle>,
) {
    let claim = ClaimGuard { hardpoint, refs };
    debug!(
        hardpoint = %claim.hardpoint,
        refs = claim.refs.len(),
        source = source.id(),
        "Loading hardpoint batch"
    );

    let loaded = loader
        .load(source.as_ref(), &claim.hardpoint, &claim.refs)
        .await;
    match loaded {
        Ok(results) if results.len() == claim.refs.len() => {
            for (target, result) in claim.refs.iter().zip(results) {
                let outcome = match result {
                    Ok(raw) => convert(target, &claim.hardpoint, raw),
                    Err(error) => Err(RefError::RemoteFetch(error)),
                };
                settle(target, &claim.hardpoint, outcome);
            }
        }
        Ok(results) => {
            warn!(
                hardpoint = %claim.hardpoint,
                expected = claim.refs.len(),
                actual = results.len(),
                "Loader returned the wrong number of outcomes"
            );
            let error = RefError::illegal(
                &claim.hardpoint,
                format!(
                    "loader returned {} outcomes for {} refs",
                    results.len(),
                    claim.refs.len()
                ),
            );
            for target in &claim.refs {
                settle(target, &claim.hardpoint, Err(error.clone()));
            }
        }
        Err(error) => {
            warn!(
                hardpoint = %claim.hardpoint,
                refs = claim.refs.len(),
                error = %error,
                "Hardpoint batch failed"
            );
            for target in &claim.refs {
                settle(target, &claim.hardpoint, Err(RefError::RemoteFetch(error.clone())));
            }
        }
    }
}

fn convert(target: &RefHandle, hardpoint: &str, raw: RawValue) -> Result<HardpointValue> {
    let slot = target.hardpoints().require(target.ref_type(), hardpoint)?;
    slot.template()
        .build(raw)
        .map_err(|reason| RefError::illegal(hardpoint, reason))
}

fn settle(target: &RefHandle, hardpoint: &str, outcome: Result<HardpointValue>) {
    let Some(slot) = target.hardpoints().get(hardpoint) else {
        return;
    };
    let stored = match outcome {
        Ok(value) => slot.resolve(value),
        Err(error) => slot.fail(error),
    };
    if let Err(error) = stored {
        warn!(
            hardpoint = %hardpoint,
            monogram = %target.monogram(),
            error = %error,
            "Could not store hardpoint outcome"
        );
    }
}

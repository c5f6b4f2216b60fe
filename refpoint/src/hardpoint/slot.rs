//! Write-once hardpoint slots.
//!
//! Slot state lives in a `watch` channel so that the claim transition is
//! atomic and any number of callers can wait on the one in-flight fetch.

use std::fmt;
use tokio::sync::watch;

use super::template::Template;
use super::value::HardpointValue;
use crate::error::{RefError, Result};

/// Current state of a slot.
#[derive(Debug, Clone)]
pub enum HardpointState {
    Unresolved,
    /// A resolver owns the slot and a fetch is in flight
    Resolving,
    Resolved(HardpointValue),
    Failed(RefError),
}

impl HardpointState {
    pub fn status(&self) -> HardpointStatus {
        match self {
            HardpointState::Unresolved => HardpointStatus::Unresolved,
            HardpointState::Resolving => HardpointStatus::Resolving,
            HardpointState::Resolved(_) => HardpointStatus::Resolved,
            HardpointState::Failed(_) => HardpointStatus::Failed,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, HardpointState::Resolved(_) | HardpointState::Failed(_))
    }

    fn outcome(&self) -> Option<Result<HardpointValue>> {
        match self {
            HardpointState::Resolved(value) => Some(Ok(value.clone())),
            HardpointState::Failed(error) => Some(Err(error.clone())),
            _ => None,
        }
    }
}

/// Value-free view of [`HardpointState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardpointStatus {
    Unresolved,
    Resolving,
    Resolved,
    Failed,
}

/// A named, typed, lazily-resolved relationship slot.
pub struct Hardpoint {
    name: String,
    template: Template,
    state: watch::Sender<HardpointState>,
}

impl Hardpoint {
    /// Declare an unresolved slot.
    pub fn declare(name: impl Into<String>, template: Template) -> Self {
        let (state, _) = watch::channel(HardpointState::Unresolved);
        Self {
            name: name.into(),
            template,
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> HardpointState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> HardpointStatus {
        self.state.borrow().status()
    }

    /// Cached outcome, if the slot has settled.
    pub fn settled(&self) -> Option<Result<HardpointValue>> {
        self.state.borrow().outcome()
    }

    /// Atomically move `Unresolved` to `Resolving`.
    ///
    /// Returns `true` if the caller now owns the resolution and must
    /// eventually call [`Hardpoint::resolve`] or [`Hardpoint::fail`].
    pub fn try_claim(&self) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, HardpointState::Unresolved) {
                *state = HardpointState::Resolving;
                true
            } else {
                false
            }
        })
    }

    /// Store the resolved value.
    ///
    /// Re-resolving with an equal value is a no-op; anything else on a
    /// settled slot is an illegal transition.
    pub fn resolve(&self, value: HardpointValue) -> Result<()> {
        if !self.template.accepts(&value) {
            return Err(RefError::illegal(
                &self.name,
                format!(
                    "{} value does not fit {} template",
                    value.shape(),
                    self.template.shape()
                ),
            ));
        }

        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match state {
            HardpointState::Unresolved | HardpointState::Resolving => {
                *state = HardpointState::Resolved(value);
                true
            }
            HardpointState::Resolved(existing) if *existing == value => false,
            HardpointState::Resolved(_) => {
                outcome = Err(RefError::illegal(
                    &self.name,
                    "already resolved with a different value",
                ));
                false
            }
            HardpointState::Failed(_) => {
                outcome = Err(RefError::illegal(&self.name, "cannot resolve a failed slot"));
                false
            }
        });
        outcome
    }

    /// Record a failure. Later reads surface this error; there is no retry.
    pub fn fail(&self, error: RefError) -> Result<()> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match state {
            HardpointState::Unresolved | HardpointState::Resolving => {
                *state = HardpointState::Failed(error);
                true
            }
            settled => {
                outcome = Err(RefError::illegal(
                    &self.name,
                    format!("cannot fail a slot that is {:?}", settled.status()),
                ));
                false
            }
        });
        outcome
    }

    /// Wait until the slot is resolved or failed.
    ///
    /// Does not start a resolution; pair with a resolver or a claim.
    pub async fn wait(&self) -> Result<HardpointValue> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(HardpointState::is_settled)
            .await
            .map_err(|_| RefError::illegal(&self.name, "slot dropped while waiting"))?;
        match state.outcome() {
            Some(outcome) => outcome,
            None => Err(RefError::illegal(&self.name, "woke on an unsettled slot")),
        }
    }
}

impl fmt::Debug for Hardpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hardpoint")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("status", &self.status())
            .finish()
    }
}

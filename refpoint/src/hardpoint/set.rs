//! The fixed set of hardpoints a ref type declares.

use tracing::debug;

use super::slot::Hardpoint;
use super::template::Template;
use crate::error::{RefError, Result};

/// Hardpoints owned by one ref, in declaration order.
#[derive(Debug, Default)]
pub struct HardpointSet {
    slots: Vec<Hardpoint>,
}

impl HardpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a hardpoint. Declaring a name twice keeps the first slot.
    pub fn declare(mut self, name: impl Into<String>, template: Template) -> Self {
        let name = name.into();
        if self.get(&name).is_some() {
            debug!(hardpoint = %name, "Hardpoint already declared, keeping first declaration");
            return self;
        }
        self.slots.push(Hardpoint::declare(name, template));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Hardpoint> {
        self.slots.iter().find(|slot| slot.name() == name)
    }

    /// Look up a slot, failing fast if `ref_type` never declared it.
    pub fn require(&self, ref_type: &str, name: &str) -> Result<&Hardpoint> {
        self.get(name).ok_or_else(|| RefError::MissingHardpoint {
            ref_type: ref_type.to_string(),
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(Hardpoint::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hardpoint> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

//! Core trait for remote sources.
//!
//! This module defines the `RemoteSource` trait - the only seam between the
//! ref machinery and whatever transport actually talks to the remote API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SourceError;
use crate::record::RemoteRecord;

/// Core trait for remote sources.
///
/// A source answers "give me the objects of this type matching these
/// constraints". Records are returned in source order and carry their own
/// identifiers.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Get the source identifier (e.g. host name).
    fn id(&self) -> &str;

    /// Run a search call.
    ///
    /// Returns every record matching the query, up to `query.limit` when
    /// set. Sources backed by a paged API must follow cursors until the
    /// result set is exhausted; loaders slice these records per ref and
    /// treat anything missing as absent.
    async fn search(&self, query: RemoteQuery) -> Result<Vec<RemoteRecord>, SourceError>;
}

/// A search call against a remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteQuery {
    /// Method or object type to search (e.g. "harbormaster.build.search")
    pub method: String,
    /// Constraint name to value (usually a list of identifiers)
    pub constraints: Map<String, Value>,
    /// Page size limit
    pub limit: Option<u32>,
}

impl RemoteQuery {
    /// Create a query for a search method with no constraints.
    pub fn search(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            constraints: Map::new(),
            limit: None,
        }
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }

    /// Constrain by a list of string identifiers.
    pub fn with_identifiers<I, S>(self, key: impl Into<String>, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = identifiers
            .into_iter()
            .map(|id| Value::String(id.into()))
            .collect();
        self.with_constraint(key, Value::Array(values))
    }

    /// Set the page size limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Get a constraint value.
    pub fn constraint(&self, key: &str) -> Option<&Value> {
        self.constraints.get(key)
    }
}

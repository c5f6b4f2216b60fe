//! Mock remote source for testing.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::traits::*;
use crate::error::SourceError;
use crate::record::RemoteRecord;

/// Mock source for testing.
///
/// Serves canned records per method, filtered by bound constraints, and
/// records every call it receives.
pub struct MockSource {
    source_id: String,
    available: AtomicBool,
    /// Method -> canned records, in source order
    records: DashMap<String, Vec<RemoteRecord>>,
    /// Constraint name -> record field path it filters on
    bindings: DashMap<String, Vec<String>>,
    /// Method -> injected failure
    failures: DashMap<String, SourceError>,
    latency: Option<Duration>,
    call_count: AtomicU32,
    calls: Mutex<Vec<RemoteQuery>>,
}

impl MockSource {
    /// Create a new mock source.
    ///
    /// `phids` and `ids` constraints are bound to the record's own
    /// identifiers out of the box.
    pub fn new(source_id: impl Into<String>) -> Self {
        let source = Self {
            source_id: source_id.into(),
            available: AtomicBool::new(true),
            records: DashMap::new(),
            bindings: DashMap::new(),
            failures: DashMap::new(),
            latency: None,
            call_count: AtomicU32::new(0),
            calls: Mutex::new(Vec::new()),
        };
        source.bind("phids", &["phid"]);
        source.bind("ids", &["id"]);
        source
    }

    /// Add canned records for a method.
    pub fn with_records(self, method: impl Into<String>, records: Vec<RemoteRecord>) -> Self {
        self.records
            .entry(method.into())
            .or_default()
            .extend(records);
        self
    }

    /// Bind a constraint name to a record field path.
    pub fn with_binding(self, constraint: impl Into<String>, path: &[&str]) -> Self {
        self.bind(constraint, path);
        self
    }

    /// Make every call to a method fail.
    pub fn with_failure(self, method: impl Into<String>, error: SourceError) -> Self {
        self.failures.insert(method.into(), error);
        self
    }

    /// Delay every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Get the number of times search was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get the queries received so far.
    pub fn calls(&self) -> Vec<RemoteQuery> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Reset the call count and log.
    pub fn reset_calls(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn bind(&self, constraint: impl Into<String>, path: &[&str]) {
        self.bindings.insert(
            constraint.into(),
            path.iter().map(|segment| segment.to_string()).collect(),
        );
    }

    fn matches(&self, record: &RemoteRecord, query: &RemoteQuery) -> bool {
        query.constraints.iter().all(|(constraint, wanted)| {
            let Some(path) = self.bindings.get(constraint) else {
                return true;
            };
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            let Some(actual) = record.get_path(&path) else {
                return false;
            };
            match wanted {
                Value::Array(items) => items.iter().any(|item| same_key(item, actual)),
                single => same_key(single, actual),
            }
        })
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new("mock-source")
    }
}

/// Identifier comparison that treats `42` and `"42"` as equal.
fn same_key(a: &Value, b: &Value) -> bool {
    fn key(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
    a == b || key(a) == key(b)
}

#[async_trait]
impl RemoteSource for MockSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    async fn search(&self, query: RemoteQuery) -> Result<Vec<RemoteRecord>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("Mock source disabled".to_string()));
        }

        if let Some(error) = self.failures.get(&query.method) {
            return Err(error.clone());
        }

        let records = self
            .records
            .get(&query.method)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| self.matches(record, &query))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(match query.limit {
            Some(limit) => records.into_iter().take(limit as usize).collect(),
            None => records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RemoteRecord {
        RemoteRecord::from_value(value).unwrap()
    }

    fn build(id: u64, buildable: u64) -> RemoteRecord {
        record(json!({
            "id": id,
            "phid": format!("PHID-HMBD-{id}"),
            "fields": { "buildablePHID": format!("PHID-HMBB-{buildable}") }
        }))
    }

    fn builds() -> Vec<RemoteRecord> {
        vec![build(1, 1), build(2, 2), build(3, 1)]
    }

    #[tokio::test]
    async fn test_mock_source_filters_by_binding() {
        let source = MockSource::new("test")
            .with_records("harbormaster.build.search", builds())
            .with_binding("buildables", &["fields", "buildablePHID"]);

        let found = source
            .search(
                RemoteQuery::search("harbormaster.build.search")
                    .with_identifiers("buildables", ["PHID-HMBB-1"]),
            )
            .await
            .unwrap();

        let ids: Vec<_> = found.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![Some(1), Some(3)]);
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.calls()[0].method, "harbormaster.build.search");
    }

    #[tokio::test]
    async fn test_mock_source_ids_match_numbers_and_strings() {
        let source =
            MockSource::default().with_records("harbormaster.build.search", builds());

        let found = source
            .search(
                RemoteQuery::search("harbormaster.build.search")
                    .with_constraint("ids", json!(["2"])),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some(2));
    }

    #[tokio::test]
    async fn test_mock_source_limit_and_unknown_method() {
        let source =
            MockSource::default().with_records("harbormaster.build.search", builds());

        let found = source
            .search(
                RemoteQuery::search("harbormaster.build.search")
                    .with_limit(2),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let none = source
            .search(RemoteQuery::search("unknown.search"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mock_source_failures() {
        let source = MockSource::default()
            .with_failure("harbormaster.build.search", SourceError::RequestFailed("boom".into()));

        let err = source
            .search(RemoteQuery::search("harbormaster.build.search"))
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::RequestFailed("boom".into()));

        let offline = MockSource::default().with_available(false);
        assert!(matches!(
            offline.search(RemoteQuery::search("x")).await,
            Err(SourceError::Unavailable(_))
        ));
        assert_eq!(offline.call_count(), 1);

        offline.reset_calls();
        assert_eq!(offline.call_count(), 0);
        assert!(offline.calls().is_empty());
    }
}

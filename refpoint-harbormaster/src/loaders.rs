//! Batched loaders for the harbormaster hardpoints.
//!
//! Each loader answers a whole batch of refs with a single search call and
//! then slices the results back out per ref.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use refpoint::{
    downcast_handle, HardpointLoader, LoadOutcome, RawValue, RefHandle, RemoteQuery, RemoteRecord,
    RemoteSource, Resolver, SourceError,
};

use crate::build::{BuildRef, HARDPOINT_BUILDPLAN};
use crate::buildable::HARDPOINT_BUILDREFS;

pub const BUILD_SEARCH: &str = "harbormaster.build.search";
pub const BUILD_PLAN_SEARCH: &str = "harbormaster.buildplan.search";

/// Resolver with every harbormaster loader registered.
pub fn harbormaster_resolver(source: Arc<dyn RemoteSource>) -> Resolver {
    Resolver::new(source)
        .with_loader(BuildRefsLoader)
        .with_loader(BuildPlanLoader)
}

/// Loads `ref.buildable.buildRefs`: builds constrained by buildable PHID.
///
/// One unlimited search per chunk. A chunk of buildables can match far more
/// builds than one page holds, so the source must return the whole result
/// set (see [`RemoteSource::search`]).
#[derive(Debug, Default)]
pub struct BuildRefsLoader;

#[async_trait]
impl HardpointLoader for BuildRefsLoader {
    fn hardpoints(&self) -> &[&'static str] {
        &[HARDPOINT_BUILDREFS]
    }

    async fn load(
        &self,
        source: &dyn RemoteSource,
        _hardpoint: &str,
        refs: &[RefHandle],
    ) -> Result<Vec<LoadOutcome>, SourceError> {
        let phids = distinct(
            refs.iter()
                .filter_map(|buildable| buildable.phid())
                .map(|p| p.as_str()),
        );
        let builds = if phids.is_empty() {
            Vec::new()
        } else {
            let query = RemoteQuery::search(BUILD_SEARCH).with_identifiers("buildables", phids);
            source.search(query).await?
        };
        debug!(buildables = refs.len(), builds = builds.len(), "Loaded builds");

        Ok(refs
            .iter()
            .map(|buildable| {
                let Some(phid) = buildable.phid() else {
                    return Ok(RawValue::Records(Vec::new()));
                };
                Ok(RawValue::Records(matching(
                    &builds,
                    &["fields", "buildablePHID"],
                    phid.as_str(),
                )))
            })
            .collect())
    }
}

/// Loads `ref.build.buildPlan`: the plan named by each build's
/// `buildPlanPHID`.
#[derive(Debug, Default)]
pub struct BuildPlanLoader;

#[async_trait]
impl HardpointLoader for BuildPlanLoader {
    fn hardpoints(&self) -> &[&'static str] {
        &[HARDPOINT_BUILDPLAN]
    }

    async fn load(
        &self,
        source: &dyn RemoteSource,
        _hardpoint: &str,
        refs: &[RefHandle],
    ) -> Result<Vec<LoadOutcome>, SourceError> {
        let plan_phids: Vec<Option<String>> = refs
            .iter()
            .map(|build| {
                downcast_handle::<BuildRef>(build)
                    .and_then(|build| build.build_plan_phid().map(str::to_string))
            })
            .collect();

        let wanted = distinct(plan_phids.iter().flatten().map(String::as_str));
        let plans = if wanted.is_empty() {
            Vec::new()
        } else {
            let query = RemoteQuery::search(BUILD_PLAN_SEARCH).with_identifiers("phids", wanted);
            source.search(query).await?
        };
        debug!(builds = refs.len(), plans = plans.len(), "Loaded build plans");

        Ok(plan_phids
            .into_iter()
            .map(|phid| {
                let plan = phid.and_then(|phid| {
                    plans
                        .iter()
                        .find(|plan| plan.str_at(&["phid"]) == Some(phid.as_str()))
                        .cloned()
                });
                Ok(RawValue::Record(plan))
            })
            .collect())
    }
}

/// Records whose value at `path` equals `key`, in source order.
fn matching(records: &[RemoteRecord], path: &[&str], key: &str) -> Vec<RemoteRecord> {
    records
        .iter()
        .filter(|record| record.str_at(path) == Some(key))
        .cloned()
        .collect()
}

/// First occurrence of each identifier, in input order.
fn distinct<'a>(identifiers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for identifier in identifiers {
        if !seen.iter().any(|s| s == identifier) {
            seen.push(identifier.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_plan::BuildPlanRef;
    use crate::buildable::BuildableRef;
    use refpoint::{MockSource, ObjectRef, RefType};
    use serde_json::json;

    fn record(value: serde_json::Value) -> RemoteRecord {
        RemoteRecord::from_value(value).unwrap()
    }

    fn build(id: u64, buildable: &str, plan: &str) -> RemoteRecord {
        record(json!({
            "id": id,
            "phid": format!("PHID-HMBD-{id}"),
            "fields": { "buildablePHID": buildable, "buildPlanPHID": plan }
        }))
    }

    fn source() -> Arc<MockSource> {
        Arc::new(
            MockSource::new("harbormaster")
                .with_records(
                    BUILD_SEARCH,
                    vec![
                        build(3, "PHID-HMBB-1", "PHID-HMCP-1"),
                        build(1, "PHID-HMBB-2", "PHID-HMCP-1"),
                        build(2, "PHID-HMBB-1", "PHID-HMCP-2"),
                    ],
                )
                .with_records(
                    BUILD_PLAN_SEARCH,
                    vec![record(json!({
                        "id": 1,
                        "phid": "PHID-HMCP-1",
                        "fields": { "name": "Unit tests" }
                    }))],
                )
                .with_binding("buildables", &["fields", "buildablePHID"]),
        )
    }

    fn buildable(id: u64) -> RefHandle {
        BuildableRef::handle_from_remote(record(json!({
            "id": id,
            "phid": format!("PHID-HMBB-{id}")
        })))
    }

    #[tokio::test]
    async fn test_build_refs_sliced_per_buildable() {
        let source = source();
        let refs = vec![buildable(1), buildable(2), buildable(3)];

        let outcomes = BuildRefsLoader
            .load(source.as_ref(), HARDPOINT_BUILDREFS, &refs)
            .await
            .unwrap();

        let ids: Vec<Vec<_>> = outcomes
            .into_iter()
            .map(|outcome| match outcome.unwrap() {
                RawValue::Records(records) => records.iter().map(RemoteRecord::id).collect(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![vec![Some(3), Some(2)], vec![Some(1)], vec![]]);
        assert_eq!(source.call_count(), 1);
        assert_eq!(
            source.calls()[0].constraint("buildables"),
            Some(&json!(["PHID-HMBB-1", "PHID-HMBB-2", "PHID-HMBB-3"]))
        );
    }

    #[tokio::test]
    async fn test_buildables_without_phid_skip_the_call() {
        let source = source();
        let anonymous: RefHandle = BuildableRef::handle_from_remote(record(json!({ "id": 5 })));
        let refs = vec![anonymous];

        let outcomes = BuildRefsLoader
            .load(source.as_ref(), HARDPOINT_BUILDREFS, &refs)
            .await
            .unwrap();

        assert_eq!(outcomes, vec![Ok(RawValue::Records(vec![]))]);
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_build_plans_are_deduplicated() {
        let source = source();
        let resolver = harbormaster_resolver(source.clone());
        let builds: Vec<RefHandle> = [
            build(3, "PHID-HMBB-1", "PHID-HMCP-1"),
            build(1, "PHID-HMBB-2", "PHID-HMCP-1"),
            build(2, "PHID-HMBB-1", "PHID-HMCP-2"),
        ]
        .into_iter()
        .map(|record| -> RefHandle { BuildRef::handle_from_remote(record) })
        .collect();

        let outcomes = resolver.resolve_all(&builds, HARDPOINT_BUILDPLAN).await;

        assert_eq!(source.call_count(), 1);
        assert_eq!(
            source.calls()[0].constraint("phids"),
            Some(&json!(["PHID-HMCP-1", "PHID-HMCP-2"]))
        );
        let plans: Vec<_> = outcomes
            .iter()
            .map(|outcome| {
                let value = outcome.as_ref().unwrap();
                value.object::<BuildPlanRef>().map(|p| p.monogram())
            })
            .collect();
        assert_eq!(plans, vec![Some("PLAN1".to_string()), Some("PLAN1".to_string()), None]);
    }
}

//! # Refpoint Harbormaster
//!
//! Refs for build-system objects served by `harbormaster.*.search` calls:
//!
//! - [`BuildableRef`] (`B42`): the object builds run against; its builds
//!   resolve through the `ref.buildable.buildRefs` hardpoint.
//! - [`BuildRef`]: one build, with its plan behind `ref.build.buildPlan`.
//! - [`BuildPlanRef`]: a build plan.
//!
//! ```ignore
//! let resolver = harbormaster_resolver(source);
//! let buildable = BuildableRef::handle_from_remote(record);
//! for build in buildable.build_refs(&resolver).await? {
//!     println!("{} {:?}", build.monogram(), build.status());
//! }
//! ```

pub mod build;
pub mod build_plan;
pub mod buildable;
pub mod loaders;

pub use build::{BuildFields, BuildRef, BuildStatus, HARDPOINT_BUILDPLAN};
pub use build_plan::{BuildPlanFields, BuildPlanRef};
pub use buildable::{BuildableFields, BuildableRef, HARDPOINT_BUILDREFS};
pub use loaders::{
    harbormaster_resolver, BuildPlanLoader, BuildRefsLoader, BUILD_PLAN_SEARCH, BUILD_SEARCH,
};

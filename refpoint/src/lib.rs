//! # Refpoint
//!
//! Typed, read-only refs to remote objects whose relationships ("hardpoints")
//! are declared up front and resolved lazily, in batches.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   declares    ┌──────────────┐
//! │  ObjectRef   │──────────────►│ HardpointSet │  name -> write-once slot
//! │ (BuildableRef│               └──────┬───────┘
//! │   NoteRef..) │                      │ claim / resolve / fail
//! └──────┬───────┘                      ▼
//!        │ get_hardpoint         ┌──────────────┐   load(batch)   ┌─────────────────┐
//!        └──────────────────────►│   Resolver   │────────────────►│ HardpointLoader │
//!                                └──────────────┘                 └────────┬────────┘
//!                                                                          │ search
//!                                                                          ▼
//!                                                                 ┌─────────────────┐
//!                                                                 │  RemoteSource   │
//!                                                                 └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use refpoint::{Resolver, MockSource};
//!
//! let resolver = Resolver::new(Arc::new(source)).with_loader(MyLoader);
//! let tasks = resolver.get_hardpoint(&note, "note.tasks").await?;
//! ```

pub mod error;
pub mod hardpoint;
pub mod record;
pub mod reference;
pub mod resolver;
pub mod source;

#[cfg(test)]
mod testing;

pub use error::{RefError, Result, SourceError};
pub use hardpoint::{
    Hardpoint, HardpointSet, HardpointState, HardpointStatus, HardpointValue, RawValue,
    RefFactory, Template,
};
pub use record::{Phid, RemoteRecord};
pub use reference::{downcast_handle, same_object, DisplayRef, ObjectRef, RefHandle, RefType};
pub use resolver::{HardpointLoader, HardpointRequest, LoadOutcome, Resolver, ResolverConfig};
pub use source::{MockSource, RemoteQuery, RemoteSource};

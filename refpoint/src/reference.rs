//! Identity-bearing refs.
//!
//! A ref is the local, read-only picture of one remote object: its identity,
//! the raw record it was built from, and the hardpoints its type declares.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::hardpoint::HardpointSet;
use crate::record::{Phid, RemoteRecord};

/// Shared handle to a ref of any type.
pub type RefHandle = Arc<dyn ObjectRef>;

/// Type-erasure helpers so handles can be turned back into concrete refs.
pub trait AsAny: Any + Send + Sync {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Object-safe view of a ref.
///
/// Identity accessors read from the immutable record and never fail;
/// relationships go through [`ObjectRef::hardpoints`] and the resolver.
pub trait ObjectRef: AsAny + fmt::Debug {
    /// Type name used for errors and template matching (e.g. "buildable").
    fn ref_type(&self) -> &'static str;

    /// Local numeric identifier.
    fn id(&self) -> Option<u64>;

    /// Stable global identifier.
    fn phid(&self) -> Option<&Phid>;

    /// Short display identifier, e.g. `B42`.
    fn monogram(&self) -> String;

    /// The raw record this ref was built from.
    fn parameters(&self) -> &RemoteRecord;

    /// Hardpoints declared for this ref type.
    fn hardpoints(&self) -> &HardpointSet;

    /// Display capability, if the type provides one.
    fn as_display(&self) -> Option<&dyn DisplayRef> {
        None
    }
}

/// Static side of a ref type: its name and factory constructor.
///
/// `new_from_remote` is the only way to build a populated ref.
pub trait RefType: ObjectRef + Sized {
    const REF_TYPE: &'static str;

    fn new_from_remote(record: RemoteRecord) -> Self;

    /// Build a shared handle from a record.
    fn handle_from_remote(record: RemoteRecord) -> Arc<Self> {
        Arc::new(Self::new_from_remote(record))
    }
}

/// Presentation capability. Pure: never triggers hardpoint resolution.
pub trait DisplayRef {
    /// Short object name, usually the monogram.
    fn display_object_name(&self) -> String;

    /// Human title, if the record has one.
    fn display_title(&self) -> Option<String>;

    /// Full name, e.g. `Buildable "B42"`.
    fn ref_display_name(&self) -> String;
}

/// Turn a handle back into a concrete ref.
pub fn downcast_handle<T: RefType>(handle: &RefHandle) -> Option<Arc<T>> {
    AsAny::into_any_arc(handle.clone()).downcast::<T>().ok()
}

/// Whether two handles point at the same remote object.
///
/// Refs with a PHID compare by type and PHID, refs with only an id by type
/// and id, and anonymous refs only by pointer.
pub fn same_object(a: &RefHandle, b: &RefHandle) -> bool {
    if handle_addr(a) == handle_addr(b) {
        return true;
    }
    if a.ref_type() != b.ref_type() {
        return false;
    }
    match (a.phid(), b.phid()) {
        (Some(pa), Some(pb)) => pa == pb,
        (None, None) => matches!((a.id(), b.id()), (Some(ia), Some(ib)) if ia == ib),
        _ => false,
    }
}

/// Pointer identity of a handle, for deduplicating requests.
pub(crate) fn handle_addr(handle: &RefHandle) -> usize {
    Arc::as_ptr(handle) as *const () as usize
}

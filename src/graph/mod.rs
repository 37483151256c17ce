//! Object Graph Module
//!
//! The seam through which the size-of engine sees objects. Any object store
//! that can name an object's identity, class, shape and outgoing references
//! can be measured.

mod heap;

use std::fmt;

use crate::sizeof::Shape;

pub use heap::{Handle, Heap, RecordBuilder, Slot};

// == Object Id ==
/// Identity of an object, independent of its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// == Referent ==
/// One outgoing edge of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referent<'g, R> {
    /// Owning field name; `None` for array elements and bare reference cells
    pub field: Option<&'g str>,
    /// Target object; `None` for a null reference
    pub target: Option<R>,
}

// == Object Graph ==
/// Read-only view of a graph of objects.
///
/// Implementations must keep every method cheap: the engine calls each of
/// them at most a constant number of times per visited object or edge.
pub trait ObjectGraph {
    /// Handle to an object of this graph
    type Ref: Clone;

    /// Identity of the object. Two handles to the same object return the same id.
    fn identity(&self, object: &Self::Ref) -> ObjectId;

    /// Runtime class name of the object.
    fn class_name(&self, object: &Self::Ref) -> &str;

    /// Shape of the object, or `None` when it cannot be classified.
    fn shape(&self, object: &Self::Ref) -> Option<Shape>;

    /// Outgoing references, nulls included.
    fn referents(&self, object: &Self::Ref) -> Vec<Referent<'_, Self::Ref>>;
}

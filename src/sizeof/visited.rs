//! Visited Set Module
//!
//! Identity-keyed set of objects already measured by one traversal.

use std::collections::HashSet;

use crate::graph::ObjectId;

// == Visited Set ==
/// Tracks the identities a traversal has measured.
///
/// Owned by a single walk and dropped when it returns.
#[derive(Debug, Default)]
pub struct VisitedSet {
    /// Identities seen so far
    seen: HashSet<ObjectId>,
}

impl VisitedSet {
    // == Constructor ==
    /// Creates a new empty set.
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    // == Insert ==
    /// Records an identity.
    ///
    /// Returns `true` if the identity was not yet present. Membership test and
    /// insertion are the same operation.
    pub fn insert(&mut self, id: ObjectId) -> bool {
        self.seen.insert(id)
    }

    // == Contains ==
    /// Checks whether an identity has been recorded.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.seen.contains(&id)
    }

    // == Length ==
    /// Returns the number of recorded identities.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

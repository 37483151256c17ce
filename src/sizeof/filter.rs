//! Filter Policy Module
//!
//! Pluggable exclusion rules consulted by the walker before it sizes an object
//! or follows an edge. Policies are injected into the engine at construction,
//! so engines with different policies can coexist.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::graph::ObjectId;

// == Object View ==
/// The object under test when deciding object-level exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectView<'a> {
    pub id: ObjectId,
    pub class: &'a str,
}

// == Filter Policy ==
/// Exclusion predicates. All methods must be pure and cheap.
pub trait FilterPolicy: Send + Sync {
    /// Skip the object and everything only reachable through it.
    fn exclude_object(&self, _object: &ObjectView<'_>) -> bool {
        false
    }

    /// Skip a field: it is neither priced in its owner nor followed.
    fn exclude_field(&self, _owner_class: &str, _field: &str) -> bool {
        false
    }

    /// Treat references to objects of this class as zero-size leaves.
    fn exclude_subgraph(&self, _class: &str) -> bool {
        false
    }

    /// Fail the whole measurement when an object of this class cannot be classified.
    fn fail_closed(&self, _class: &str) -> bool {
        false
    }
}

// == No Filter ==
/// Excludes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl FilterPolicy for NoFilter {}

type ObjectPredicate = Box<dyn Fn(&ObjectView<'_>) -> bool + Send + Sync>;

// == Filter Rules ==
/// Rule-based policy assembled with builder methods.
///
/// ```
/// use heap_sizeof::sizeof::FilterRules;
///
/// let rules = FilterRules::new()
///     .ignore_class("ClassLoader")
///     .ignore_field("Session", "threadLocalCache")
///     .fail_closed_class("Socket");
/// ```
#[derive(Default)]
pub struct FilterRules {
    /// Classes treated as zero-size leaves
    ignored_classes: HashSet<String>,
    /// Ignored field names keyed by owner class
    ignored_fields: HashMap<String, HashSet<String>>,
    /// Specific objects skipped with their subgraphs
    excluded_instances: HashSet<ObjectId>,
    /// Arbitrary object-level exclusions
    object_predicates: Vec<ObjectPredicate>,
    /// Classes whose unknown shape fails the measurement
    fail_closed_classes: HashSet<String>,
}

impl FilterRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats every reference to `class` as a zero-size leaf.
    pub fn ignore_class(mut self, class: impl Into<String>) -> Self {
        self.ignored_classes.insert(class.into());
        self
    }

    /// Drops `field` from every object of `owner_class`.
    pub fn ignore_field(mut self, owner_class: impl Into<String>, field: impl Into<String>) -> Self {
        self.ignored_fields
            .entry(owner_class.into())
            .or_default()
            .insert(field.into());
        self
    }

    /// Skips one specific object and its subgraph.
    pub fn exclude_instance(mut self, id: ObjectId) -> Self {
        self.excluded_instances.insert(id);
        self
    }

    /// Skips every object matching `predicate`, with its subgraph.
    pub fn exclude_objects_where<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ObjectView<'_>) -> bool + Send + Sync + 'static,
    {
        self.object_predicates.push(Box::new(predicate));
        self
    }

    /// Makes an unclassifiable object of `class` fail the measurement.
    pub fn fail_closed_class(mut self, class: impl Into<String>) -> Self {
        self.fail_closed_classes.insert(class.into());
        self
    }
}

impl FilterPolicy for FilterRules {
    fn exclude_object(&self, object: &ObjectView<'_>) -> bool {
        self.excluded_instances.contains(&object.id)
            || self.object_predicates.iter().any(|predicate| predicate(object))
    }

    fn exclude_field(&self, owner_class: &str, field: &str) -> bool {
        self.ignored_fields
            .get(owner_class)
            .is_some_and(|fields| fields.contains(field))
    }

    fn exclude_subgraph(&self, class: &str) -> bool {
        self.ignored_classes.contains(class)
    }

    fn fail_closed(&self, class: &str) -> bool {
        self.fail_closed_classes.contains(class)
    }
}

impl fmt::Debug for FilterRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRules")
            .field("ignored_classes", &self.ignored_classes)
            .field("ignored_fields", &self.ignored_fields)
            .field("excluded_instances", &self.excluded_instances)
            .field("object_predicates", &self.object_predicates.len())
            .field("fail_closed_classes", &self.fail_closed_classes)
            .finish()
    }
}

// == Filter Chain ==
/// Ordered combination of policies. A predicate holds if any member says so.
#[derive(Default)]
pub struct FilterChain {
    policies: Vec<Box<dyn FilterPolicy>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a policy to the chain.
    pub fn with<P>(mut self, policy: P) -> Self
    where
        P: FilterPolicy + 'static,
    {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl FilterPolicy for FilterChain {
    fn exclude_object(&self, object: &ObjectView<'_>) -> bool {
        self.policies.iter().any(|p| p.exclude_object(object))
    }

    fn exclude_field(&self, owner_class: &str, field: &str) -> bool {
        self.policies
            .iter()
            .any(|p| p.exclude_field(owner_class, field))
    }

    fn exclude_subgraph(&self, class: &str) -> bool {
        self.policies.iter().any(|p| p.exclude_subgraph(class))
    }

    fn fail_closed(&self, class: &str) -> bool {
        self.policies.iter().any(|p| p.fail_closed(class))
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("policies", &self.policies.len())
            .finish()
    }
}

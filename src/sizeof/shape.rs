//! Shape Descriptor Module
//!
//! Closed classification of an object's memory layout. A shape carries
//! everything the size model needs and nothing about the objects a reference
//! points to.

// == Primitive ==
/// Primitive scalar kinds with fixed declared widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Float,
    Long,
    Double,
}

impl Primitive {
    /// Declared width in bytes.
    pub const fn width(self) -> u64 {
        match self {
            Primitive::Boolean | Primitive::Byte => 1,
            Primitive::Char | Primitive::Short => 2,
            Primitive::Int | Primitive::Float => 4,
            Primitive::Long | Primitive::Double => 8,
        }
    }
}

// == Element Kind ==
/// Kind of a field or array element slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Primitive(Primitive),
    Reference,
}

// == Field Shape ==
/// A named slot of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub name: String,
    pub kind: ElementKind,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Self::new(name, ElementKind::Primitive(primitive))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Reference)
    }
}

// == Shape ==
/// Memory layout of a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A bare primitive value
    Scalar(Primitive),
    /// A bare reference slot (null or not)
    Reference,
    /// Homogeneous array
    Array { element: ElementKind, length: u64 },
    /// Record with named, typed fields
    Aggregate { fields: Vec<FieldShape> },
}

impl Shape {
    /// Builds an aggregate shape from its fields.
    pub fn aggregate(fields: impl IntoIterator<Item = FieldShape>) -> Self {
        Shape::Aggregate {
            fields: fields.into_iter().collect(),
        }
    }

    /// Drops aggregate fields for which `keep` returns false.
    ///
    /// Non-aggregate shapes are left untouched.
    pub fn retain_fields<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        if let Shape::Aggregate { fields } = self {
            fields.retain(|field| keep(&field.name));
        }
    }
}

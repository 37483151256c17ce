//! Heap Arena Module
//!
//! An arena of objects addressed by handles. Each allocation gets its handle
//! as a synthetic identity tag, so aliasing and cycles are expressed by
//! storing handles in reference slots.

use crate::error::{Result, SizeOfError};
use crate::graph::{ObjectGraph, ObjectId, Referent};
use crate::sizeof::{ElementKind, FieldShape, Primitive, Shape};

/// Class reported for a handle that does not belong to the heap.
const DANGLING_CLASS: &str = "<dangling>";

// == Handle ==
/// Reference to an object allocated in a [`Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Identity of the referenced object.
    pub fn id(self) -> ObjectId {
        ObjectId(self.0 as u64)
    }
}

// == Slot ==
/// A field of a record object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Primitive(Primitive),
    Reference(Option<Handle>),
}

#[derive(Debug, Clone)]
enum Body {
    Record(Vec<(String, Slot)>),
    PrimitiveArray { element: Primitive, length: u64 },
    ReferenceArray(Vec<Option<Handle>>),
    Boxed(Primitive),
    Cell(Option<Handle>),
    Opaque,
}

#[derive(Debug, Clone)]
struct HeapObject {
    class: String,
    body: Body,
}

// == Heap ==
/// Arena of measurable objects.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    // == Constructor ==
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // == Allocation ==
    /// Starts a record allocation. Fields are priced in declaration order.
    pub fn record(&mut self, class: impl Into<String>) -> RecordBuilder<'_> {
        RecordBuilder {
            heap: self,
            class: class.into(),
            fields: Vec::new(),
        }
    }

    /// Allocates an array of primitives. Element values are not stored.
    pub fn primitive_array(
        &mut self,
        class: impl Into<String>,
        element: Primitive,
        length: u64,
    ) -> Handle {
        self.alloc(class, Body::PrimitiveArray { element, length })
    }

    /// Allocates an array of references.
    pub fn reference_array(
        &mut self,
        class: impl Into<String>,
        elements: Vec<Option<Handle>>,
    ) -> Handle {
        self.alloc(class, Body::ReferenceArray(elements))
    }

    /// Allocates a bare primitive value.
    pub fn boxed(&mut self, class: impl Into<String>, primitive: Primitive) -> Handle {
        self.alloc(class, Body::Boxed(primitive))
    }

    /// Allocates a bare reference cell.
    pub fn cell(&mut self, class: impl Into<String>, target: Option<Handle>) -> Handle {
        self.alloc(class, Body::Cell(target))
    }

    /// Allocates an object whose layout is unknown to the size model.
    pub fn opaque(&mut self, class: impl Into<String>) -> Handle {
        self.alloc(class, Body::Opaque)
    }

    fn alloc(&mut self, class: impl Into<String>, body: Body) -> Handle {
        let handle = Handle(self.objects.len());
        self.objects.push(HeapObject {
            class: class.into(),
            body,
        });
        handle
    }

    // == Mutation ==
    /// Points a reference field of a record at `target`.
    pub fn set_field(&mut self, owner: Handle, field: &str, target: Option<Handle>) -> Result<()> {
        self.check_target(target)?;
        let object = self.get_mut(owner)?;

        let slot = match &mut object.body {
            Body::Record(fields) => fields
                .iter_mut()
                .find(|(name, _)| name == field)
                .map(|(_, slot)| slot),
            _ => None,
        };

        match slot {
            Some(slot) if matches!(slot, Slot::Reference(_)) => {
                *slot = Slot::Reference(target);
                Ok(())
            }
            _ => Err(SizeOfError::UnknownField {
                class: object.class.clone(),
                field: field.to_string(),
            }),
        }
    }

    /// Points element `index` of a reference array at `target`.
    pub fn set_element(&mut self, array: Handle, index: usize, target: Option<Handle>) -> Result<()> {
        self.check_target(target)?;
        let object = self.get_mut(array)?;

        match &mut object.body {
            Body::ReferenceArray(elements) if index < elements.len() => {
                elements[index] = target;
                Ok(())
            }
            _ => Err(SizeOfError::UnknownField {
                class: object.class.clone(),
                field: format!("[{}]", index),
            }),
        }
    }

    /// Points a reference cell at `target`.
    pub fn set_cell(&mut self, cell: Handle, target: Option<Handle>) -> Result<()> {
        self.check_target(target)?;
        let object = self.get_mut(cell)?;

        match &mut object.body {
            Body::Cell(slot) => {
                *slot = target;
                Ok(())
            }
            _ => Err(SizeOfError::UnknownField {
                class: object.class.clone(),
                field: "value".to_string(),
            }),
        }
    }

    // == Lookup ==
    /// Class name of an allocated object.
    pub fn class_of(&self, handle: Handle) -> Result<&str> {
        self.get(handle).map(|object| object.class.as_str())
    }

    fn get(&self, handle: Handle) -> Result<&HeapObject> {
        self.objects
            .get(handle.0)
            .ok_or(SizeOfError::UnknownObject(handle.id()))
    }

    fn get_mut(&mut self, handle: Handle) -> Result<&mut HeapObject> {
        self.objects
            .get_mut(handle.0)
            .ok_or(SizeOfError::UnknownObject(handle.id()))
    }

    fn check_target(&self, target: Option<Handle>) -> Result<()> {
        match target {
            Some(handle) => self.get(handle).map(|_| ()),
            None => Ok(()),
        }
    }
}

impl ObjectGraph for Heap {
    type Ref = Handle;

    fn identity(&self, object: &Handle) -> ObjectId {
        object.id()
    }

    fn class_name(&self, object: &Handle) -> &str {
        self.objects
            .get(object.0)
            .map(|object| object.class.as_str())
            .unwrap_or(DANGLING_CLASS)
    }

    fn shape(&self, object: &Handle) -> Option<Shape> {
        let object = self.objects.get(object.0)?;

        match &object.body {
            Body::Record(fields) => Some(Shape::aggregate(fields.iter().map(|(name, slot)| {
                match slot {
                    Slot::Primitive(primitive) => FieldShape::primitive(name.as_str(), *primitive),
                    Slot::Reference(_) => FieldShape::reference(name.as_str()),
                }
            }))),
            Body::PrimitiveArray { element, length } => Some(Shape::Array {
                element: ElementKind::Primitive(*element),
                length: *length,
            }),
            Body::ReferenceArray(elements) => Some(Shape::Array {
                element: ElementKind::Reference,
                length: elements.len() as u64,
            }),
            Body::Boxed(primitive) => Some(Shape::Scalar(*primitive)),
            Body::Cell(_) => Some(Shape::Reference),
            Body::Opaque => None,
        }
    }

    fn referents(&self, object: &Handle) -> Vec<Referent<'_, Handle>> {
        let Some(object) = self.objects.get(object.0) else {
            return Vec::new();
        };

        match &object.body {
            Body::Record(fields) => fields
                .iter()
                .filter_map(|(name, slot)| match slot {
                    Slot::Reference(target) => Some(Referent {
                        field: Some(name.as_str()),
                        target: *target,
                    }),
                    Slot::Primitive(_) => None,
                })
                .collect(),
            Body::ReferenceArray(elements) => elements
                .iter()
                .map(|target| Referent {
                    field: None,
                    target: *target,
                })
                .collect(),
            Body::Cell(target) => vec![Referent {
                field: None,
                target: *target,
            }],
            Body::PrimitiveArray { .. } | Body::Boxed(_) | Body::Opaque => Vec::new(),
        }
    }
}

// == Record Builder ==
/// Collects the fields of a record before allocating it.
#[derive(Debug)]
pub struct RecordBuilder<'h> {
    heap: &'h mut Heap,
    class: String,
    fields: Vec<(String, Slot)>,
}

impl RecordBuilder<'_> {
    /// Adds a primitive field.
    pub fn primitive(mut self, name: impl Into<String>, primitive: Primitive) -> Self {
        self.fields.push((name.into(), Slot::Primitive(primitive)));
        self
    }

    /// Adds a reference field.
    pub fn reference(mut self, name: impl Into<String>, target: Option<Handle>) -> Self {
        self.fields.push((name.into(), Slot::Reference(target)));
        self
    }

    /// Allocates the record and returns its handle.
    pub fn alloc(self) -> Handle {
        let RecordBuilder {
            heap,
            class,
            fields,
        } = self;
        heap.alloc(class, Body::Record(fields))
    }
}

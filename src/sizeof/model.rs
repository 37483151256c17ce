//! Size Model Module
//!
//! Prices a single shape in bytes from a platform layout: pointer width,
//! object and array header costs, and the alignment unit. Pricing never looks
//! at the objects a reference points to.

use crate::error::{Result, SizeOfError};
use crate::sizeof::shape::{ElementKind, FieldShape, Primitive, Shape};

// == Size Model ==
/// Deterministic model of per-object memory costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeModel {
    /// Width of a reference slot
    pointer_size: u64,
    /// Fixed cost of an aggregate's header
    object_header: u64,
    /// Fixed cost of an array's header, length word included
    array_header: u64,
    /// Allocation granularity, a power of two
    alignment: u64,
}

impl SizeModel {
    // == Constructor ==
    /// Creates a model from explicit layout parameters.
    ///
    /// # Arguments
    /// * `pointer_size` - Bytes per reference slot (>= 1)
    /// * `object_header` - Bytes of header per aggregate
    /// * `array_header` - Bytes of header per array
    /// * `alignment` - Rounding unit for arrays and aggregates (power of two)
    pub fn new(
        pointer_size: u64,
        object_header: u64,
        array_header: u64,
        alignment: u64,
    ) -> Result<Self> {
        if pointer_size < 1 {
            return Err(SizeOfError::InvalidConfiguration(
                "pointer size must be >= 1".to_string(),
            ));
        }
        if !alignment.is_power_of_two() {
            return Err(SizeOfError::InvalidConfiguration(format!(
                "alignment must be a power of two, got {}",
                alignment
            )));
        }

        Ok(Self {
            pointer_size,
            object_header,
            array_header,
            alignment,
        })
    }

    /// 64-bit layout with compressed references.
    pub const fn compressed_64() -> Self {
        Self {
            pointer_size: 4,
            object_header: 12,
            array_header: 16,
            alignment: 8,
        }
    }

    /// 64-bit layout with full-width references.
    pub const fn uncompressed_64() -> Self {
        Self {
            pointer_size: 8,
            object_header: 16,
            array_header: 24,
            alignment: 8,
        }
    }

    /// 32-bit layout.
    pub const fn x32() -> Self {
        Self {
            pointer_size: 4,
            object_header: 8,
            array_header: 12,
            alignment: 8,
        }
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    pub fn object_header(&self) -> u64 {
        self.object_header
    }

    pub fn array_header(&self) -> u64 {
        self.array_header
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    // == Width Of ==
    /// Bytes taken by one slot of the given kind.
    pub fn width_of(&self, kind: ElementKind) -> u64 {
        match kind {
            ElementKind::Primitive(primitive) => primitive.width(),
            ElementKind::Reference => self.pointer_size,
        }
    }

    // == Size Of ==
    /// Prices a shape.
    ///
    /// Scalars and bare references cost their width with no padding. Arrays
    /// and aggregates pay a header and are rounded up to the alignment unit.
    /// Saturates at `u64::MAX`.
    pub fn size_of(&self, shape: &Shape) -> u64 {
        match shape {
            Shape::Scalar(primitive) => primitive.width(),
            Shape::Reference => self.pointer_size,
            Shape::Array { element, length } => {
                let body = self.width_of(*element).saturating_mul(*length);
                self.align(self.array_header.saturating_add(body))
            }
            Shape::Aggregate { fields } => {
                let body = fields
                    .iter()
                    .fold(0u64, |acc, field| acc.saturating_add(self.width_of(field.kind)));
                self.align(self.object_header.saturating_add(body))
            }
        }
    }

    // == Entry Overhead ==
    /// Cost of the mapping node a hash-based store allocates per entry.
    ///
    /// Priced as an aggregate holding the hash and the key, value and next
    /// references.
    pub fn entry_overhead(&self) -> u64 {
        self.size_of(&Shape::aggregate([
            FieldShape::primitive("hash", Primitive::Int),
            FieldShape::reference("key"),
            FieldShape::reference("value"),
            FieldShape::reference("next"),
        ]))
    }

    fn align(&self, size: u64) -> u64 {
        let mask = self.alignment - 1;
        match size.checked_add(mask) {
            Some(padded) => padded & !mask,
            None => u64::MAX,
        }
    }
}

impl Default for SizeModel {
    fn default() -> Self {
        Self::compressed_64()
    }
}

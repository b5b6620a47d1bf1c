//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: two values with the same attributes are
/// interchangeable. Barcodes are the canonical example here, `"978-4-06-519351-1"`
/// and `"9784065193511"` normalize to the same identifying code.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Symbol(String);
///
/// impl ValueObject for Symbol {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

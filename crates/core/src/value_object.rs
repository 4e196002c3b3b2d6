//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** — two value
/// objects with the same attributes are the same value. `Size` and money
/// breakdowns are value objects; `Order` is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attributes.
/// A storage placement is one: two placements naming the same cabinet, shelf,
/// container and sub-location are the same place.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct ShelfSlot {
///     cabinet: u32,
///     shelf: u32,
/// }
///
/// impl ValueObject for ShelfSlot {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::ComponentId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// The placement field a rejected location request is blamed on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationField {
    StorageType,
    CabinetNumber,
    ShelfNumber,
    ContainerId,
    DrawerIndex,
    StorageBoxIndex,
    LocationType,
    LocationIndex,
}

impl LocationField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationField::StorageType => "storage_type",
            LocationField::CabinetNumber => "cabinet_number",
            LocationField::ShelfNumber => "shelf_number",
            LocationField::ContainerId => "container_id",
            LocationField::DrawerIndex => "drawer_index",
            LocationField::StorageBoxIndex => "storage_box_index",
            LocationField::LocationType => "location_type",
            LocationField::LocationIndex => "location_index",
        }
    }
}

impl core::fmt::Display for LocationField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level error.
///
/// Every variant is a rejected operation: the state the operation would have
/// touched is left exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A placement request was malformed or contradictory.
    #[error("invalid location ({field}): {reason}")]
    InvalidLocation { field: LocationField, reason: String },

    /// Stock would shrink below what is currently out on loan.
    #[error("quantity conflict: {0}")]
    QuantityConflict(String),

    /// A borrow asked for more than is available.
    #[error("insufficient availability for component {component_id}: requested {requested}, available {available}")]
    InsufficientAvailability {
        component_id: ComponentId,
        requested: u32,
        available: u32,
    },

    /// A return exceeded the outstanding quantity.
    #[error("over-return: requested {requested}, outstanding {outstanding}")]
    OverReturn { requested: u32, outstanding: u32 },

    /// A referenced component, transaction, item or container does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A controlled-item state change was attempted without admin approval.
    #[error("controlled item guard: {0}")]
    ControlledItemGuard(String),

    /// A value failed validation (e.g. missing required field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A conflict occurred (stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Shared state could not be accessed (e.g. a poisoned lock).
    #[error("internal: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_location(field: LocationField, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            field,
            reason: reason.into(),
        }
    }

    pub fn quantity_conflict(msg: impl Into<String>) -> Self {
        Self::QuantityConflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn controlled(msg: impl Into<String>) -> Self {
        Self::ControlledItemGuard(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The offending field, for location errors.
    pub fn location_field(&self) -> Option<LocationField> {
        match self {
            DomainError::InvalidLocation { field, .. } => Some(*field),
            _ => None,
        }
    }
}

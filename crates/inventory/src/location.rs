//! Storage placement of a component.
//!
//! A [`StorageLocation`] is always canonical: it is only ever produced by
//! [`crate::LocationResolver::resolve`], and its shape makes the
//! contradictory combinations (a sub-location on a bare shelf, a container on
//! shelf 0, a sub-location inside a storage box) unrepresentable.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::{ContainerId, DomainError, LocationField, ValueObject};

/// Highest box/partition index inside a container or drawer.
pub const MAX_SUB_LOCATION_INDEX: u8 = 15;

/// Top-level placement scheme.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    Cabinet,
    Drawer,
    StorageBox,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Cabinet => "CABINET",
            StorageType::Drawer => "DRAWER",
            StorageType::StorageBox => "STORAGE_BOX",
        }
    }
}

impl core::fmt::Display for StorageType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CABINET" => Ok(StorageType::Cabinet),
            "DRAWER" => Ok(StorageType::Drawer),
            "STORAGE_BOX" => Ok(StorageType::StorageBox),
            other => Err(DomainError::invalid_location(
                LocationField::StorageType,
                format!("unknown storage type '{other}'"),
            )),
        }
    }
}

/// Requested kind of subdivision inside a container or drawer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubLocationKind {
    #[default]
    None,
    Box,
    Partition,
}

impl FromStr for SubLocationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "NONE" => Ok(SubLocationKind::None),
            "BOX" => Ok(SubLocationKind::Box),
            "PARTITION" => Ok(SubLocationKind::Partition),
            other => Err(DomainError::invalid_location(
                LocationField::LocationType,
                format!("unknown location type '{other}'"),
            )),
        }
    }
}

/// A box or partition nested in a container or drawer (index 1..=15).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "index", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubLocation {
    #[default]
    None,
    Box(u8),
    Partition(u8),
}

impl SubLocation {
    pub fn kind(&self) -> SubLocationKind {
        match self {
            SubLocation::None => SubLocationKind::None,
            SubLocation::Box(_) => SubLocationKind::Box,
            SubLocation::Partition(_) => SubLocationKind::Partition,
        }
    }

    pub fn index(&self) -> Option<u8> {
        match self {
            SubLocation::None => None,
            SubLocation::Box(i) | SubLocation::Partition(i) => Some(*i),
        }
    }

    /// Short suffix used after a container code, e.g. "b1" or "p12".
    fn code_suffix(&self) -> Option<String> {
        match self {
            SubLocation::None => None,
            SubLocation::Box(i) => Some(format!("b{i}")),
            SubLocation::Partition(i) => Some(format!("p{i}")),
        }
    }

    /// Long form used after a drawer, e.g. "(Box 2)".
    fn spelled_out(&self) -> Option<String> {
        match self {
            SubLocation::None => None,
            SubLocation::Box(i) => Some(format!("(Box {i})")),
            SubLocation::Partition(i) => Some(format!("(Partition {i})")),
        }
    }
}

/// The container a cabinet placement refers to, with its code for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef {
    pub id: ContainerId,
    pub code: String,
}

/// Where inside a cabinet a component sits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum CabinetSlot {
    /// Shelf 0: in the cabinet but not on a shelf.
    Unshelved,
    /// Directly on a shelf, outside any container.
    Shelf { shelf_number: u32 },
    /// Inside a container on a shelf, optionally in one of its boxes/partitions.
    Container {
        shelf_number: u32,
        container: ContainerRef,
        sub: SubLocation,
    },
}

/// Canonical storage placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "storage_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageLocation {
    Cabinet { cabinet_number: u32, slot: CabinetSlot },
    Drawer { drawer_index: u32, sub: SubLocation },
    StorageBox { storage_box_index: u32 },
}

impl ValueObject for StorageLocation {}

impl StorageLocation {
    pub fn storage_type(&self) -> StorageType {
        match self {
            StorageLocation::Cabinet { .. } => StorageType::Cabinet,
            StorageLocation::Drawer { .. } => StorageType::Drawer,
            StorageLocation::StorageBox { .. } => StorageType::StorageBox,
        }
    }

    pub fn cabinet_number(&self) -> Option<u32> {
        match self {
            StorageLocation::Cabinet { cabinet_number, .. } => Some(*cabinet_number),
            _ => None,
        }
    }

    /// Shelf number for cabinet placements (0 when unshelved).
    pub fn shelf_number(&self) -> Option<u32> {
        match self {
            StorageLocation::Cabinet { slot, .. } => Some(match slot {
                CabinetSlot::Unshelved => 0,
                CabinetSlot::Shelf { shelf_number } => *shelf_number,
                CabinetSlot::Container { shelf_number, .. } => *shelf_number,
            }),
            _ => None,
        }
    }

    pub fn container(&self) -> Option<&ContainerRef> {
        match self {
            StorageLocation::Cabinet {
                slot: CabinetSlot::Container { container, .. },
                ..
            } => Some(container),
            _ => None,
        }
    }

    pub fn drawer_index(&self) -> Option<u32> {
        match self {
            StorageLocation::Drawer { drawer_index, .. } => Some(*drawer_index),
            _ => None,
        }
    }

    pub fn storage_box_index(&self) -> Option<u32> {
        match self {
            StorageLocation::StorageBox { storage_box_index } => Some(*storage_box_index),
            _ => None,
        }
    }

    pub fn sub_location(&self) -> SubLocation {
        match self {
            StorageLocation::Cabinet {
                slot: CabinetSlot::Container { sub, .. },
                ..
            } => *sub,
            StorageLocation::Drawer { sub, .. } => *sub,
            _ => SubLocation::None,
        }
    }

    /// Human-readable placement, e.g. "Cabinet 1 Shelf 2 A2-b1",
    /// "Drawer 3 (Box 2)" or "Storage Box 4".
    pub fn label(&self) -> String {
        match self {
            StorageLocation::Cabinet {
                cabinet_number,
                slot,
            } => match slot {
                CabinetSlot::Unshelved => format!("Cabinet {cabinet_number} (No Shelf)"),
                CabinetSlot::Shelf { shelf_number } => {
                    format!("Cabinet {cabinet_number} Shelf {shelf_number}")
                }
                CabinetSlot::Container {
                    shelf_number,
                    container,
                    sub,
                } => match sub.code_suffix() {
                    Some(suffix) => format!(
                        "Cabinet {cabinet_number} Shelf {shelf_number} {}-{suffix}",
                        container.code
                    ),
                    None => format!("Cabinet {cabinet_number} Shelf {shelf_number} {}", container.code),
                },
            },
            StorageLocation::Drawer { drawer_index, sub } => match sub.spelled_out() {
                Some(sub) => format!("Drawer {drawer_index} {sub}"),
                None => format!("Drawer {drawer_index}"),
            },
            StorageLocation::StorageBox { storage_box_index } => {
                format!("Storage Box {storage_box_index}")
            }
        }
    }
}

impl core::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Loosely-typed placement request, as it arrives from a form or an import.
///
/// Fields that do not belong to `storage_type` are ignored by the resolver;
/// everything else is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequest {
    pub storage_type: StorageType,
    #[serde(default)]
    pub cabinet_number: Option<i64>,
    #[serde(default)]
    pub shelf_number: Option<i64>,
    #[serde(default)]
    pub container_id: Option<ContainerId>,
    #[serde(default)]
    pub drawer_index: Option<i64>,
    #[serde(default)]
    pub storage_box_index: Option<i64>,
    #[serde(default)]
    pub location_type: SubLocationKind,
    #[serde(default)]
    pub location_index: Option<i64>,
}

impl LocationRequest {
    fn empty(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            cabinet_number: None,
            shelf_number: None,
            container_id: None,
            drawer_index: None,
            storage_box_index: None,
            location_type: SubLocationKind::None,
            location_index: None,
        }
    }

    pub fn cabinet(cabinet_number: i64, shelf_number: i64) -> Self {
        Self {
            cabinet_number: Some(cabinet_number),
            shelf_number: Some(shelf_number),
            ..Self::empty(StorageType::Cabinet)
        }
    }

    pub fn drawer(drawer_index: i64) -> Self {
        Self {
            drawer_index: Some(drawer_index),
            ..Self::empty(StorageType::Drawer)
        }
    }

    pub fn storage_box(storage_box_index: i64) -> Self {
        Self {
            storage_box_index: Some(storage_box_index),
            ..Self::empty(StorageType::StorageBox)
        }
    }

    pub fn in_container(mut self, container_id: ContainerId) -> Self {
        self.container_id = Some(container_id);
        self
    }

    pub fn with_sub(mut self, kind: SubLocationKind, index: i64) -> Self {
        self.location_type = kind;
        self.location_index = Some(index);
        self
    }
}

//! Validation and canonicalisation of placement requests.

use stockroom_core::{DomainError, DomainResult, LocationField};

use crate::container::{CabinetLayout, ContainerDirectory};
use crate::location::{
    CabinetSlot, ContainerRef, LocationRequest, MAX_SUB_LOCATION_INDEX, StorageLocation, StorageType,
    SubLocation, SubLocationKind,
};

/// Single choke point that turns a [`LocationRequest`] into a canonical
/// [`StorageLocation`] or rejects it, naming the offending field.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    containers: ContainerDirectory,
}

impl LocationResolver {
    pub fn new(containers: ContainerDirectory) -> Self {
        Self { containers }
    }

    pub fn containers(&self) -> &ContainerDirectory {
        &self.containers
    }

    pub fn layout(&self) -> &CabinetLayout {
        self.containers.layout()
    }

    pub fn resolve(&self, request: &LocationRequest) -> DomainResult<StorageLocation> {
        match request.storage_type {
            StorageType::Cabinet => self.resolve_cabinet(request),
            StorageType::Drawer => {
                let drawer_index = positive(request.drawer_index, LocationField::DrawerIndex)?;
                let sub = sub_location(request)?;
                Ok(StorageLocation::Drawer { drawer_index, sub })
            }
            StorageType::StorageBox => {
                let storage_box_index =
                    positive(request.storage_box_index, LocationField::StorageBoxIndex)?;
                if request.location_type != SubLocationKind::None {
                    return Err(DomainError::invalid_location(
                        LocationField::LocationType,
                        "storage boxes cannot hold a box or partition",
                    ));
                }
                Ok(StorageLocation::StorageBox { storage_box_index })
            }
        }
    }

    /// Display label for a resolved location.
    pub fn label(&self, location: &StorageLocation) -> String {
        location.label()
    }

    fn resolve_cabinet(&self, request: &LocationRequest) -> DomainResult<StorageLocation> {
        let layout = self.layout();

        let cabinet_number = required(request.cabinet_number, LocationField::CabinetNumber)?;
        let cabinet_number = u32::try_from(cabinet_number)
            .ok()
            .filter(|n| layout.has_cabinet(*n))
            .ok_or_else(|| {
                DomainError::invalid_location(
                    LocationField::CabinetNumber,
                    format!("cabinet {cabinet_number} is not one of 1..={}", layout.cabinets),
                )
            })?;

        let shelf_number = required(request.shelf_number, LocationField::ShelfNumber)?;
        let shelf_number = u32::try_from(shelf_number)
            .ok()
            .filter(|n| layout.has_shelf(*n))
            .ok_or_else(|| {
                DomainError::invalid_location(
                    LocationField::ShelfNumber,
                    format!(
                        "shelf {shelf_number} is not one of 0..={}",
                        layout.shelves_per_cabinet
                    ),
                )
            })?;

        let Some(container_id) = request.container_id else {
            if request.location_type != SubLocationKind::None {
                return Err(DomainError::invalid_location(
                    LocationField::LocationType,
                    "a box or partition requires a container",
                ));
            }
            let slot = if shelf_number == 0 {
                CabinetSlot::Unshelved
            } else {
                CabinetSlot::Shelf { shelf_number }
            };
            return Ok(StorageLocation::Cabinet {
                cabinet_number,
                slot,
            });
        };

        if shelf_number == 0 {
            return Err(DomainError::invalid_location(
                LocationField::ContainerId,
                "no container can be selected without a shelf",
            ));
        }

        let container = self.containers.get(container_id).ok_or_else(|| {
            DomainError::invalid_location(
                LocationField::ContainerId,
                format!("container {container_id} does not exist"),
            )
        })?;

        if container.cabinet_number != cabinet_number || container.shelf_number != shelf_number {
            return Err(DomainError::invalid_location(
                LocationField::ContainerId,
                format!(
                    "container {} is on cabinet {} shelf {}, not cabinet {} shelf {}",
                    container.code,
                    container.cabinet_number,
                    container.shelf_number,
                    cabinet_number,
                    shelf_number
                ),
            ));
        }

        Ok(StorageLocation::Cabinet {
            cabinet_number,
            slot: CabinetSlot::Container {
                shelf_number,
                container: ContainerRef {
                    id: container.id,
                    code: container.code.clone(),
                },
                sub: sub_location(request)?,
            },
        })
    }
}

fn required(value: Option<i64>, field: LocationField) -> DomainResult<i64> {
    value.ok_or_else(|| DomainError::invalid_location(field, "is required"))
}

fn positive(value: Option<i64>, field: LocationField) -> DomainResult<u32> {
    let value = required(value, field)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| DomainError::invalid_location(field, format!("{value} is not a positive index")))
}

fn sub_location(request: &LocationRequest) -> DomainResult<SubLocation> {
    let kind = request.location_type;
    if kind == SubLocationKind::None {
        return Ok(SubLocation::None);
    }

    let index = required(request.location_index, LocationField::LocationIndex)?;
    let index = u8::try_from(index)
        .ok()
        .filter(|i| (1..=MAX_SUB_LOCATION_INDEX).contains(i))
        .ok_or_else(|| {
            DomainError::invalid_location(
                LocationField::LocationIndex,
                format!("{index} is not within 1..={MAX_SUB_LOCATION_INDEX}"),
            )
        })?;

    Ok(match kind {
        SubLocationKind::Box => SubLocation::Box(index),
        SubLocationKind::Partition => SubLocation::Partition(index),
        SubLocationKind::None => SubLocation::None,
    })
}

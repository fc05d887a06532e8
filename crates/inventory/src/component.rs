use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AggregateRoot, ComponentId, DomainError, DomainResult};

use crate::category::Category;
use crate::location::StorageLocation;
use crate::stock::StockLevel;

const MAX_NAME_LEN: usize = 150;
const MAX_REMARKS_LEN: usize = 500;

/// Input for creating a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComponent {
    pub name: String,
    pub category: Category,
    pub total_quantity: u32,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub is_controlled: bool,
}

/// Partial update; `None` leaves a field untouched.
///
/// `remarks: Some(None)` clears the remarks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentChanges {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub remarks: Option<Option<String>>,
    pub total_quantity: Option<u32>,
    pub is_controlled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletion {
    pub reason: String,
    pub deleted_at: DateTime<Utc>,
}

/// Catalog record of a component. Quantities live in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    id: ComponentId,
    name: String,
    category: Category,
    remarks: Option<String>,
    location: StorageLocation,
    is_controlled: bool,
    deletion: Option<Deletion>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Component {
    pub fn create(
        id: ComponentId,
        new: &NewComponent,
        location: StorageLocation,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: clean_name(&new.name)?,
            category: new.category,
            remarks: clean_remarks(new.remarks.as_deref())?,
            location,
            is_controlled: new.is_controlled,
            deletion: None,
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    pub fn is_controlled(&self) -> bool {
        self.is_controlled
    }

    pub fn is_deleted(&self) -> bool {
        self.deletion.is_some()
    }

    pub fn deletion(&self) -> Option<&Deletion> {
        self.deletion.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply `changes` (and an already-resolved new location) to a copy.
    ///
    /// `total_quantity` is not handled here; the ledger owns it.
    /// `release_control_approved` must be true to turn a controlled component
    /// into an ordinary one.
    pub fn modify(
        &self,
        changes: &ComponentChanges,
        location: Option<StorageLocation>,
        release_control_approved: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        self.ensure_active()?;

        if self.is_controlled && changes.is_controlled == Some(false) && !release_control_approved {
            return Err(DomainError::controlled(format!(
                "admin approval required to release control of {}",
                self.id
            )));
        }

        let mut next = self.clone();
        if let Some(name) = &changes.name {
            next.name = clean_name(name)?;
        }
        if let Some(category) = changes.category {
            next.category = category;
        }
        if let Some(remarks) = &changes.remarks {
            next.remarks = clean_remarks(remarks.as_deref())?;
        }
        if let Some(is_controlled) = changes.is_controlled {
            next.is_controlled = is_controlled;
        }
        if let Some(location) = location {
            next.location = location;
        }
        next.updated_at = now;
        next.version += 1;
        Ok(next)
    }

    /// Soft-delete a copy. Loans referencing the component stay valid.
    pub fn soft_delete(
        &self,
        reason: &str,
        delete_controlled_approved: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        self.ensure_active()?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("delete reason is required"));
        }
        if self.is_controlled && !delete_controlled_approved {
            return Err(DomainError::controlled(format!(
                "admin approval required to delete controlled component {}",
                self.id
            )));
        }

        let mut next = self.clone();
        next.deletion = Some(Deletion {
            reason: reason.to_string(),
            deleted_at: now,
        });
        next.updated_at = now;
        next.version += 1;
        Ok(next)
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.is_deleted() {
            return Err(DomainError::validation(format!("component {} is deleted", self.id)));
        }
        Ok(())
    }
}

impl AggregateRoot for Component {
    type Id = ComponentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn clean_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn clean_remarks(remarks: Option<&str>) -> DomainResult<Option<String>> {
    match remarks.map(str::trim) {
        None | Some("") => Ok(None),
        Some(r) if r.chars().count() > MAX_REMARKS_LEN => Err(DomainError::validation(format!(
            "remarks cannot exceed {MAX_REMARKS_LEN} characters"
        ))),
        Some(r) => Ok(Some(r.to_string())),
    }
}

/// Read model joining a catalog record with its ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentView {
    pub id: ComponentId,
    pub name: String,
    pub category: Category,
    pub remarks: Option<String>,
    pub location: StorageLocation,
    pub location_label: String,
    pub total_quantity: u32,
    pub borrowed_quantity: u32,
    pub available_quantity: u32,
    pub is_controlled: bool,
    pub is_deleted: bool,
    pub delete_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl ComponentView {
    pub fn new(component: &Component, stock: &StockLevel) -> Self {
        Self {
            id: component.id,
            name: component.name.clone(),
            category: component.category,
            remarks: component.remarks.clone(),
            location: component.location.clone(),
            location_label: component.location.label(),
            total_quantity: stock.total(),
            borrowed_quantity: stock.borrowed(),
            available_quantity: stock.available(),
            is_controlled: component.is_controlled,
            is_deleted: component.is_deleted(),
            delete_reason: component.deletion.as_ref().map(|d| d.reason.clone()),
            deleted_at: component.deletion.as_ref().map(|d| d.deleted_at),
            created_at: component.created_at,
            version: component.version,
        }
    }
}

//! Component metadata store (name, category, location, controlled flag).
//!
//! Quantities are not stored here; see [`crate::ledger`]. The catalog lock is
//! the outermost lock of the storeroom: it is always taken before any ledger
//! cell or the loan book.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use stockroom_core::{ComponentId, DomainError, DomainResult};
use stockroom_inventory::Component;

#[derive(Debug, Default)]
pub struct Catalog {
    inner: RwLock<CatalogState>,
}

#[derive(Debug, Default)]
pub struct CatalogState {
    components: HashMap<ComponentId, Component>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> DomainResult<RwLockReadGuard<'_, CatalogState>> {
        self.inner
            .read()
            .map_err(|_| DomainError::internal("catalog lock poisoned"))
    }

    pub fn write(&self) -> DomainResult<RwLockWriteGuard<'_, CatalogState>> {
        self.inner
            .write()
            .map_err(|_| DomainError::internal("catalog lock poisoned"))
    }

    /// Clone of one record, including deleted ones.
    pub fn get(&self, id: ComponentId) -> DomainResult<Component> {
        self.read()?.get(id).cloned()
    }
}

impl CatalogState {
    pub fn get(&self, id: ComponentId) -> DomainResult<&Component> {
        self.components
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("component {id}")))
    }

    /// Record that exists and is not soft-deleted.
    pub fn get_active(&self, id: ComponentId) -> DomainResult<&Component> {
        self.get(id)
            .ok()
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| DomainError::not_found(format!("component {id}")))
    }

    pub fn insert(&mut self, component: Component) -> DomainResult<()> {
        let id = component.component_id();
        if self.components.contains_key(&id) {
            return Err(DomainError::conflict(format!("component {id} already exists")));
        }
        self.components.insert(id, component);
        Ok(())
    }

    /// Replace an existing record.
    pub fn replace(&mut self, component: Component) -> DomainResult<()> {
        let id = component.component_id();
        match self.components.get_mut(&id) {
            Some(slot) => {
                *slot = component;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("component {id}"))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

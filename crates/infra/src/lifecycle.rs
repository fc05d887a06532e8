//! Component lifecycle: create, modify, soft-delete, and stock adjustments.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockroom_auth::{AdminAction, AdminApproval};
use stockroom_core::{AggregateRoot, ComponentId, DomainResult, ExpectedVersion};
use stockroom_inventory::{
    Component, ComponentChanges, ComponentView, LocationRequest, LocationResolver, NewComponent, StockLevel,
};

use crate::catalog::Catalog;
use crate::ledger::InventoryLedger;

#[derive(Debug, Clone)]
pub struct ComponentLifecycle {
    catalog: Arc<Catalog>,
    ledger: Arc<InventoryLedger>,
    resolver: Arc<LocationResolver>,
}

impl ComponentLifecycle {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<InventoryLedger>, resolver: Arc<LocationResolver>) -> Self {
        Self {
            catalog,
            ledger,
            resolver,
        }
    }

    pub fn create(
        &self,
        new: &NewComponent,
        location: &LocationRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<ComponentView> {
        let location = self.resolver.resolve(location)?;
        let component = Component::create(ComponentId::new(), new, location, now)?;
        let stock = StockLevel::new(component.component_id(), new.total_quantity);

        let mut catalog = self.catalog.write()?;
        self.ledger.register(stock)?;
        catalog.insert(component.clone())?;

        tracing::info!(
            component_id = %component.component_id(),
            total = stock.total(),
            location = %component.location(),
            "component created"
        );
        Ok(ComponentView::new(&component, &stock))
    }

    /// Apply `changes`, re-resolving the location when one is supplied.
    ///
    /// A new total is applied to the ledger while the catalog write lock is
    /// held, so the metadata and quantity change commit together.
    pub fn modify(
        &self,
        id: ComponentId,
        changes: &ComponentChanges,
        location: Option<&LocationRequest>,
        approval: Option<&AdminApproval>,
        expected: ExpectedVersion,
        now: DateTime<Utc>,
    ) -> DomainResult<ComponentView> {
        let location = location.map(|r| self.resolver.resolve(r)).transpose()?;

        let mut catalog = self.catalog.write()?;
        let current = catalog.get(id)?;
        expected.check(current.version())?;

        let release_control = approval.is_some_and(|a| a.permits(AdminAction::ReleaseControl));
        let next = current.modify(changes, location, release_control, now)?;

        let stock = match changes.total_quantity {
            Some(total) => self.ledger.set_total(id, total)?,
            None => self.ledger.snapshot(id)?,
        };
        catalog.replace(next.clone())?;

        tracing::info!(
            component_id = %id,
            version = next.version(),
            total = stock.total(),
            "component modified"
        );
        Ok(ComponentView::new(&next, &stock))
    }

    /// Soft-delete. Open loans of the component stay returnable.
    pub fn delete(
        &self,
        id: ComponentId,
        reason: &str,
        approval: Option<&AdminApproval>,
        now: DateTime<Utc>,
    ) -> DomainResult<ComponentView> {
        let mut catalog = self.catalog.write()?;
        let current = catalog.get(id)?;

        let delete_controlled = approval.is_some_and(|a| a.permits(AdminAction::DeleteControlled));
        let next = current.soft_delete(reason, delete_controlled, now)?;
        let stock = self.ledger.snapshot(id)?;
        catalog.replace(next.clone())?;

        tracing::info!(component_id = %id, borrowed = stock.borrowed(), "component deleted");
        Ok(ComponentView::new(&next, &stock))
    }

    /// Add `delta` units to an active component's total.
    pub fn increase_total(&self, id: ComponentId, delta: u32) -> DomainResult<(StockLevel, StockLevel)> {
        self.adjust(id, |ledger| ledger.increase_total(id, delta))
    }

    /// Remove `delta` units; fails with `QuantityConflict` below the borrowed amount.
    pub fn decrease_total(&self, id: ComponentId, delta: u32) -> DomainResult<(StockLevel, StockLevel)> {
        self.adjust(id, |ledger| ledger.decrease_total(id, delta))
    }

    /// Returns `(before, after)`.
    fn adjust<F>(&self, id: ComponentId, f: F) -> DomainResult<(StockLevel, StockLevel)>
    where
        F: FnOnce(&InventoryLedger) -> DomainResult<StockLevel>,
    {
        let catalog = self.catalog.read()?;
        catalog.get_active(id)?;

        // The catalog lock excludes modify, the only other writer of totals.
        let before = self.ledger.snapshot(id)?;
        let after = f(&self.ledger)?;
        tracing::info!(component_id = %id, from = before.total(), to = after.total(), "stock adjusted");
        Ok((before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_auth::{AdminCredential, StaticCredentialVerifier, authorize};
    use stockroom_core::{DomainError, LocationField};
    use stockroom_inventory::{CabinetLayout, Category, ContainerDirectory, SubLocationKind};

    fn lifecycle() -> (ComponentLifecycle, Arc<InventoryLedger>) {
        let resolver = LocationResolver::new(ContainerDirectory::provision(CabinetLayout::default()).unwrap());
        let ledger = Arc::new(InventoryLedger::new());
        let lifecycle = ComponentLifecycle::new(Arc::new(Catalog::new()), ledger.clone(), Arc::new(resolver));
        (lifecycle, ledger)
    }

    fn new_component(total: u32, is_controlled: bool) -> NewComponent {
        NewComponent {
            name: "Logic analyser".to_string(),
            category: Category::Tool,
            total_quantity: total,
            remarks: None,
            is_controlled,
        }
    }

    fn approval(action: AdminAction) -> AdminApproval {
        let verifier = StaticCredentialVerifier::new("root");
        authorize(&verifier, Some(&AdminCredential::new("root")), action).unwrap()
    }

    #[test]
    fn create_resolves_location_and_registers_stock() {
        let (lc, ledger) = lifecycle();
        let view = lc
            .create(
                &new_component(10, false),
                &LocationRequest::drawer(3).with_sub(SubLocationKind::Box, 2),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(view.location_label, "Drawer 3 (Box 2)");
        assert_eq!(ledger.available_quantity(view.id).unwrap(), 10);
    }

    #[test]
    fn invalid_location_creates_nothing() {
        let (lc, ledger) = lifecycle();
        let err = lc
            .create(
                &new_component(1, false),
                &LocationRequest::storage_box(4).with_sub(SubLocationKind::Box, 2),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err.location_field(), Some(LocationField::LocationType));
        assert!(ledger.component_ids().unwrap().is_empty());
    }

    #[test]
    fn total_cannot_drop_below_borrowed() {
        let (lc, ledger) = lifecycle();
        let id = lc
            .create(&new_component(10, false), &LocationRequest::drawer(1), Utc::now())
            .unwrap()
            .id;
        ledger.reserve(id, 6).unwrap();

        let shrink = ComponentChanges {
            total_quantity: Some(5),
            name: Some("renamed".to_string()),
            ..ComponentChanges::default()
        };
        let err = lc
            .modify(id, &shrink, None, None, ExpectedVersion::Any, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::QuantityConflict(_)));

        let view = lc
            .modify(id, &ComponentChanges::default(), None, None, ExpectedVersion::Any, Utc::now())
            .unwrap();
        assert_eq!(view.name, "Logic analyser");
        assert_eq!(view.total_quantity, 10);
    }

    #[test]
    fn location_may_change_while_items_are_out() {
        let (lc, ledger) = lifecycle();
        let id = lc
            .create(&new_component(4, false), &LocationRequest::drawer(1), Utc::now())
            .unwrap()
            .id;
        ledger.reserve(id, 2).unwrap();

        let view = lc
            .modify(
                id,
                &ComponentChanges::default(),
                Some(&LocationRequest::storage_box(9)),
                None,
                ExpectedVersion::Any,
                Utc::now(),
            )
            .unwrap();
        assert_eq!(view.location_label, "Storage Box 9");
        assert_eq!(view.borrowed_quantity, 2);
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let (lc, _) = lifecycle();
        let view = lc
            .create(&new_component(1, false), &LocationRequest::drawer(1), Utc::now())
            .unwrap();
        let rename = ComponentChanges {
            name: Some("first".to_string()),
            ..ComponentChanges::default()
        };
        lc.modify(view.id, &rename, None, None, ExpectedVersion::Exact(view.version), Utc::now())
            .unwrap();

        let err = lc
            .modify(view.id, &rename, None, None, ExpectedVersion::Exact(view.version), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn releasing_control_needs_the_matching_approval() {
        let (lc, _) = lifecycle();
        let id = lc
            .create(&new_component(1, true), &LocationRequest::drawer(1), Utc::now())
            .unwrap()
            .id;
        let release = ComponentChanges {
            is_controlled: Some(false),
            ..ComponentChanges::default()
        };

        let wrong = approval(AdminAction::DeleteControlled);
        let err = lc
            .modify(id, &release, None, Some(&wrong), ExpectedVersion::Any, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::ControlledItemGuard(_)));

        let right = approval(AdminAction::ReleaseControl);
        let view = lc
            .modify(id, &release, None, Some(&right), ExpectedVersion::Any, Utc::now())
            .unwrap();
        assert!(!view.is_controlled);
    }

    #[test]
    fn controlled_delete_needs_approval() {
        let (lc, _) = lifecycle();
        let id = lc
            .create(&new_component(1, true), &LocationRequest::drawer(1), Utc::now())
            .unwrap()
            .id;

        let err = lc.delete(id, "x", None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::ControlledItemGuard(_)));

        let view = lc
            .delete(id, "x", Some(&approval(AdminAction::DeleteControlled)), Utc::now())
            .unwrap();
        assert!(view.is_deleted);
        assert_eq!(view.delete_reason.as_deref(), Some("x"));
    }

    #[test]
    fn adjustments_require_an_active_component() {
        let (lc, _) = lifecycle();
        let id = lc
            .create(&new_component(3, false), &LocationRequest::drawer(1), Utc::now())
            .unwrap()
            .id;

        let (before, after) = lc.increase_total(id, 2).unwrap();
        assert_eq!((before.total(), after.total()), (3, 5));

        lc.delete(id, "obsolete", None, Utc::now()).unwrap();
        assert!(matches!(lc.increase_total(id, 1), Err(DomainError::NotFound(_))));
    }
}

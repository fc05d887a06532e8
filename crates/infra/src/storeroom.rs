//! Storeroom facade: the API surface consumed by an HTTP/UI layer.
//!
//! Wires the resolver, ledger, loan book and engines together and publishes
//! an [`InventoryEvent`] for every committed mutation.
//!
//! ## Lock hierarchy
//!
//! ```text
//! catalog (RwLock)  →  ledger cells (Mutex, ascending ComponentId)  →  loan book (Mutex)
//! ```
//!
//! Every operation acquires a prefix-respecting subset of this order, which
//! rules out lock cycles. Events are published after all locks are released,
//! under a separate publish lock that keeps delivery in sequence order.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use stockroom_auth::AdminApproval;
use stockroom_core::{ComponentId, DomainError, DomainResult, ExpectedVersion, TransactionId};
use stockroom_events::{EventBus, EventEnvelope};
use stockroom_inventory::{
    BorrowCreated, BorrowLine, BorrowRequest, BorrowTransaction, ComponentChanges, ComponentCreated, ComponentDeleted,
    ComponentModified, ComponentView, ContainerDirectory, InventoryEvent, ItemsReturned, LocationRequest,
    LocationResolver, NewComponent, ReturnLine, ReturnRecord, ReturnRequest, StockAdjusted, StockLevel,
    StorageLocation,
};

use crate::audit::{ConservationViolation, conservation_audit};
use crate::borrow::BorrowEngine;
use crate::catalog::Catalog;
use crate::config::{ConfigError, StoreroomConfig};
use crate::ledger::InventoryLedger;
use crate::lifecycle::ComponentLifecycle;
use crate::loans::LoanBook;
use crate::returns::ReturnEngine;
use crate::views::{
    self, ActiveLoanView, BorrowerLoans, CabinetContents, ContainerContents, LocationOccupancy, ReturnHistoryEntry,
};

pub type InventoryEnvelope = EventEnvelope<InventoryEvent>;

const COMPONENT_STREAM: &str = "component";
const BORROW_STREAM: &str = "borrow";
const RETURN_STREAM: &str = "return";

pub struct Storeroom<B> {
    config: StoreroomConfig,
    resolver: Arc<LocationResolver>,
    catalog: Arc<Catalog>,
    ledger: Arc<InventoryLedger>,
    loans: Arc<LoanBook>,
    lifecycle: ComponentLifecycle,
    borrows: BorrowEngine,
    returns: ReturnEngine,
    bus: B,
    /// Last assigned sequence number. Held across publish.
    sequence: Mutex<u64>,
}

impl<B> Storeroom<B>
where
    B: EventBus<InventoryEnvelope>,
{
    /// Validate `config`, provision the container grid and wire the engines.
    pub fn new(config: StoreroomConfig, bus: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let containers =
            ContainerDirectory::provision(config.layout).map_err(|e| ConfigError::InvalidLayout(e.to_string()))?;

        let resolver = Arc::new(LocationResolver::new(containers));
        let catalog = Arc::new(Catalog::new());
        let ledger = Arc::new(InventoryLedger::new());
        let loans = Arc::new(LoanBook::new());

        tracing::info!(
            cabinets = config.layout.cabinets,
            shelves_per_cabinet = config.layout.shelves_per_cabinet,
            containers = resolver.containers().len(),
            "storeroom initialised"
        );

        Ok(Self {
            lifecycle: ComponentLifecycle::new(catalog.clone(), ledger.clone(), resolver.clone()),
            borrows: BorrowEngine::new(catalog.clone(), ledger.clone(), loans.clone()),
            returns: ReturnEngine::new(ledger.clone(), loans.clone()),
            config,
            resolver,
            catalog,
            ledger,
            loans,
            bus,
            sequence: Mutex::new(0),
        })
    }

    pub fn config(&self) -> &StoreroomConfig {
        &self.config
    }

    pub fn containers(&self) -> &ContainerDirectory {
        self.resolver.containers()
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    // --- locations ---------------------------------------------------------

    pub fn resolve_location(&self, request: &LocationRequest) -> DomainResult<StorageLocation> {
        self.resolver.resolve(request)
    }

    pub fn location_label(&self, location: &StorageLocation) -> String {
        self.resolver.label(location)
    }

    // --- component lifecycle -----------------------------------------------

    pub fn create_component(&self, new: &NewComponent, location: &LocationRequest) -> DomainResult<ComponentView> {
        let now = Utc::now();
        let view = self
            .lifecycle
            .create(new, location, now)
            .inspect_err(|e| tracing::warn!(name = %new.name, error = %e, "create rejected"))?;
        self.publish(
            COMPONENT_STREAM,
            *view.id.as_uuid(),
            InventoryEvent::ComponentCreated(ComponentCreated {
                component_id: view.id,
                name: view.name.clone(),
                category: view.category,
                total_quantity: view.total_quantity,
                location: view.location.clone(),
                is_controlled: view.is_controlled,
                occurred_at: now,
            }),
        );
        Ok(view)
    }

    pub fn modify_component(
        &self,
        id: ComponentId,
        changes: &ComponentChanges,
        location: Option<&LocationRequest>,
        approval: Option<&AdminApproval>,
        expected: ExpectedVersion,
    ) -> DomainResult<ComponentView> {
        let now = Utc::now();
        let view = self
            .lifecycle
            .modify(id, changes, location, approval, expected, now)
            .inspect_err(|e| tracing::warn!(component_id = %id, error = %e, "modify rejected"))?;
        self.publish(
            COMPONENT_STREAM,
            *id.as_uuid(),
            InventoryEvent::ComponentModified(ComponentModified {
                component_id: id,
                version: view.version,
                name: view.name.clone(),
                category: view.category,
                total_quantity: view.total_quantity,
                location: view.location.clone(),
                is_controlled: view.is_controlled,
                occurred_at: now,
            }),
        );
        Ok(view)
    }

    pub fn delete_component(
        &self,
        id: ComponentId,
        reason: &str,
        approval: Option<&AdminApproval>,
    ) -> DomainResult<ComponentView> {
        let now = Utc::now();
        let view = self
            .lifecycle
            .delete(id, reason, approval, now)
            .inspect_err(|e| tracing::warn!(component_id = %id, error = %e, "delete rejected"))?;
        self.publish(
            COMPONENT_STREAM,
            *id.as_uuid(),
            InventoryEvent::ComponentDeleted(ComponentDeleted {
                component_id: id,
                reason: view.delete_reason.clone().unwrap_or_default(),
                occurred_at: now,
            }),
        );
        Ok(view)
    }

    pub fn increase_total(&self, id: ComponentId, delta: u32) -> DomainResult<StockLevel> {
        let adjusted = self.lifecycle.increase_total(id, delta);
        self.publish_adjustment(id, adjusted)
    }

    pub fn decrease_total(&self, id: ComponentId, delta: u32) -> DomainResult<StockLevel> {
        let adjusted = self.lifecycle.decrease_total(id, delta);
        self.publish_adjustment(id, adjusted)
    }

    // --- ledger reads ------------------------------------------------------

    pub fn total_quantity(&self, id: ComponentId) -> DomainResult<u32> {
        self.ledger.total_quantity(id)
    }

    pub fn borrowed_quantity(&self, id: ComponentId) -> DomainResult<u32> {
        self.ledger.borrowed_quantity(id)
    }

    pub fn available_quantity(&self, id: ComponentId) -> DomainResult<u32> {
        self.ledger.available_quantity(id)
    }

    // --- borrow / return ---------------------------------------------------

    pub fn create_borrow(&self, request: &BorrowRequest) -> DomainResult<BorrowTransaction> {
        let transaction = self.borrows.create_borrow(request)?;
        self.publish(
            BORROW_STREAM,
            *transaction.id().as_uuid(),
            InventoryEvent::BorrowCreated(BorrowCreated {
                transaction_id: transaction.id(),
                tp_id: transaction.borrower().tp_id().to_string(),
                pic_name: transaction.pic_name().to_string(),
                lines: transaction
                    .items()
                    .iter()
                    .map(|i| BorrowLine {
                        component_id: i.component_id(),
                        quantity: i.quantity_borrowed(),
                    })
                    .collect(),
                expected_return_date: transaction.expected_return_date(),
                occurred_at: transaction.created_at(),
            }),
        );
        Ok(transaction)
    }

    pub fn return_items(&self, request: &ReturnRequest) -> DomainResult<Vec<ReturnRecord>> {
        let records = self.returns.return_items(request)?;
        self.publish(
            RETURN_STREAM,
            Uuid::now_v7(),
            InventoryEvent::ItemsReturned(ItemsReturned {
                pic_name: request.pic_name.trim().to_string(),
                records: records.clone(),
                occurred_at: request.occurred_at,
            }),
        );
        Ok(records)
    }

    pub fn return_item(&self, pic_name: &str, line: ReturnLine) -> DomainResult<ReturnRecord> {
        let request = ReturnRequest {
            pic_name: pic_name.to_string(),
            lines: vec![line],
            occurred_at: Utc::now(),
        };
        let mut records = self.return_items(&request)?;
        records
            .pop()
            .ok_or_else(|| DomainError::internal("return produced no record"))
    }

    pub fn transaction(&self, id: TransactionId) -> DomainResult<BorrowTransaction> {
        self.loans.lock()?.get(id).cloned()
    }

    // --- read models -------------------------------------------------------

    pub fn component(&self, id: ComponentId) -> DomainResult<ComponentView> {
        let catalog = self.catalog.read()?;
        let component = catalog.get(id)?;
        Ok(ComponentView::new(component, &self.ledger.snapshot(id)?))
    }

    /// Non-deleted components.
    pub fn components(&self) -> DomainResult<Vec<ComponentView>> {
        let catalog = self.catalog.read()?;
        views::component_views(&catalog, &self.ledger, |c| !c.is_deleted())
    }

    /// Soft-deleted components with their reason and deletion time.
    pub fn deleted_components(&self) -> DomainResult<Vec<ComponentView>> {
        let catalog = self.catalog.read()?;
        views::component_views(&catalog, &self.ledger, |c| c.is_deleted())
    }

    pub fn cabinet_contents(&self, cabinet_number: u32) -> DomainResult<CabinetContents> {
        let catalog = self.catalog.read()?;
        let views = views::component_views(&catalog, &self.ledger, |c| {
            !c.is_deleted() && c.location().cabinet_number() == Some(cabinet_number)
        })?;
        Ok(views::cabinet_contents(cabinet_number, views, self.containers()))
    }

    pub fn drawer_contents(&self, drawer_index: u32) -> DomainResult<Vec<ComponentView>> {
        let catalog = self.catalog.read()?;
        views::component_views(&catalog, &self.ledger, |c| {
            !c.is_deleted() && c.location().drawer_index() == Some(drawer_index)
        })
    }

    pub fn storage_box_contents(&self, storage_box_index: u32) -> DomainResult<Vec<ComponentView>> {
        let catalog = self.catalog.read()?;
        views::component_views(&catalog, &self.ledger, |c| {
            !c.is_deleted() && c.location().storage_box_index() == Some(storage_box_index)
        })
    }

    /// Contents of the container with `code` (case-insensitive), e.g. "A2".
    pub fn container_contents(&self, code: &str) -> DomainResult<ContainerContents> {
        let container = self
            .containers()
            .by_code(code)
            .ok_or_else(|| DomainError::not_found(format!("container {}", code.trim())))?;
        let catalog = self.catalog.read()?;
        let components = views::component_views(&catalog, &self.ledger, |c| {
            !c.is_deleted() && c.location().container().is_some_and(|r| r.id == container.id)
        })?;
        Ok(ContainerContents {
            container_id: container.id,
            code: container.code.clone(),
            components,
        })
    }

    /// Cabinets holding at least one live component, ascending.
    pub fn occupied_cabinets(&self) -> DomainResult<Vec<LocationOccupancy>> {
        let catalog = self.catalog.read()?;
        Ok(views::occupancy(&catalog, StorageLocation::cabinet_number))
    }

    pub fn occupied_drawers(&self) -> DomainResult<Vec<LocationOccupancy>> {
        let catalog = self.catalog.read()?;
        Ok(views::occupancy(&catalog, StorageLocation::drawer_index))
    }

    pub fn occupied_storage_boxes(&self) -> DomainResult<Vec<LocationOccupancy>> {
        let catalog = self.catalog.read()?;
        Ok(views::occupancy(&catalog, StorageLocation::storage_box_index))
    }

    pub fn active_loans(&self, today: NaiveDate) -> DomainResult<Vec<ActiveLoanView>> {
        let catalog = self.catalog.read()?;
        let loans = self.loans.lock()?;
        Ok(views::active_loans(&catalog, &loans, today))
    }

    pub fn active_loans_by_borrower(&self, today: NaiveDate) -> DomainResult<Vec<BorrowerLoans>> {
        self.active_loans(today).map(views::group_by_borrower)
    }

    pub fn return_history(&self) -> DomainResult<Vec<ReturnHistoryEntry>> {
        let catalog = self.catalog.read()?;
        let loans = self.loans.lock()?;
        Ok(views::return_history(&catalog, &loans))
    }

    pub fn audit(&self) -> DomainResult<Vec<ConservationViolation>> {
        conservation_audit(&self.ledger, &self.loans)
    }

    // --- events ------------------------------------------------------------

    fn publish_adjustment(
        &self,
        id: ComponentId,
        adjusted: DomainResult<(StockLevel, StockLevel)>,
    ) -> DomainResult<StockLevel> {
        let (before, after) =
            adjusted.inspect_err(|e| tracing::warn!(component_id = %id, error = %e, "stock adjustment rejected"))?;
        self.publish(
            COMPONENT_STREAM,
            *id.as_uuid(),
            InventoryEvent::StockAdjusted(StockAdjusted {
                component_id: id,
                previous_total: before.total(),
                total_quantity: after.total(),
                borrowed_quantity: after.borrowed(),
                occurred_at: Utc::now(),
            }),
        );
        Ok(after)
    }

    /// Publish after commit. A failed publish is logged, never surfaced: the
    /// mutation it describes has already happened.
    ///
    /// Sequence assignment and delivery happen under one lock, so subscribers
    /// see strictly increasing sequence numbers.
    fn publish(&self, stream: &'static str, stream_id: Uuid, event: InventoryEvent) {
        let mut last = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        *last += 1;
        let sequence_number = *last;
        let envelope = EventEnvelope::wrap(stream, stream_id, sequence_number, event);
        let event_type = envelope.event_type().to_string();

        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(event_type = %event_type, sequence_number, error = ?e, "event publish failed");
        }
    }
}

impl<B> core::fmt::Debug for Storeroom<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Storeroom")
            .field("layout", &self.config.layout)
            .field("sequence", &*self.sequence.lock().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

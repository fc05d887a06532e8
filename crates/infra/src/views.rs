//! Read models built from the catalog, ledger and loan book.
//!
//! These are disposable projections: every call rebuilds them from the
//! authoritative state, so they can never drift from it.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{BorrowItemId, ComponentId, ContainerId, DomainResult, ReturnRecordId, TransactionId};
use stockroom_inventory::{
    Borrower, CabinetSlot, Component, ComponentView, ContainerDirectory, LoanStatus, StorageLocation,
};

use crate::catalog::CatalogState;
use crate::ledger::InventoryLedger;
use crate::loans::Loans;

/// One open borrow line as shown on the loans dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLoanView {
    pub transaction_id: TransactionId,
    pub borrow_item_id: BorrowItemId,
    pub borrower: Borrower,
    pub reason: String,
    pub pic_name: String,
    pub component_id: ComponentId,
    pub component_name: String,
    pub quantity_borrowed: u32,
    pub quantity_returned: u32,
    pub remaining_quantity: u32,
    pub expected_return_date: NaiveDate,
    pub borrowed_at: DateTime<Utc>,
    pub status: LoanStatus,
    pub days_overdue: i64,
}

/// A borrower's open lines, keyed by TP id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerLoans {
    pub tp_id: String,
    pub borrower_name: String,
    pub overdue_lines: usize,
    pub items: Vec<ActiveLoanView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnHistoryEntry {
    pub record_id: ReturnRecordId,
    pub transaction_id: TransactionId,
    pub borrower_name: String,
    pub tp_id: String,
    pub component_id: ComponentId,
    pub component_name: String,
    pub quantity: u32,
    pub pic_name: String,
    pub remarks: Option<String>,
    pub returned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerContents {
    pub container_id: ContainerId,
    pub code: String,
    pub components: Vec<ComponentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfContents {
    pub shelf_number: u32,
    /// Directly on the shelf, outside any container.
    pub loose: Vec<ComponentView>,
    pub containers: Vec<ContainerContents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetContents {
    pub cabinet_number: u32,
    pub unshelved: Vec<ComponentView>,
    pub shelves: Vec<ShelfContents>,
}

/// How many non-deleted components sit at one cabinet, drawer or box index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOccupancy {
    pub index: u32,
    pub component_count: usize,
}

/// Count non-deleted components by the index `key` extracts, ascending.
/// Indices with no components are absent.
pub fn occupancy<F>(catalog: &CatalogState, key: F) -> Vec<LocationOccupancy>
where
    F: Fn(&StorageLocation) -> Option<u32>,
{
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for component in catalog.iter().filter(|c| !c.is_deleted()) {
        if let Some(index) = key(component.location()) {
            *counts.entry(index).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(index, component_count)| LocationOccupancy { index, component_count })
        .collect()
}

/// Views of every component matching `keep`, sorted by name then id.
pub fn component_views<F>(
    catalog: &CatalogState,
    ledger: &InventoryLedger,
    keep: F,
) -> DomainResult<Vec<ComponentView>>
where
    F: Fn(&Component) -> bool,
{
    let mut views = catalog
        .iter()
        .filter(|c| keep(c))
        .map(|c| Ok(ComponentView::new(c, &ledger.snapshot(c.component_id())?)))
        .collect::<DomainResult<Vec<_>>>()?;
    views.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(views)
}

/// Open lines, most urgent first (earliest due date, then oldest borrow).
pub fn active_loans(catalog: &CatalogState, loans: &Loans, today: NaiveDate) -> Vec<ActiveLoanView> {
    let mut out: Vec<ActiveLoanView> = loans
        .transactions()
        .flat_map(|tx| {
            tx.items().iter().filter(|i| i.is_open()).map(move |item| {
                let assessment = tx.assess(item, today);
                ActiveLoanView {
                    transaction_id: tx.id(),
                    borrow_item_id: item.id(),
                    borrower: tx.borrower().clone(),
                    reason: tx.reason().to_string(),
                    pic_name: tx.pic_name().to_string(),
                    component_id: item.component_id(),
                    component_name: component_name(catalog, item.component_id()),
                    quantity_borrowed: item.quantity_borrowed(),
                    quantity_returned: item.quantity_returned(),
                    remaining_quantity: item.remaining(),
                    expected_return_date: tx.expected_return_date(),
                    borrowed_at: tx.created_at(),
                    status: assessment.status,
                    days_overdue: assessment.days_overdue,
                }
            })
        })
        .collect();
    out.sort_by(|a, b| {
        a.expected_return_date
            .cmp(&b.expected_return_date)
            .then(a.borrowed_at.cmp(&b.borrowed_at))
            .then(a.borrow_item_id.cmp(&b.borrow_item_id))
    });
    out
}

/// Group open lines by borrower TP id (ascending).
pub fn group_by_borrower(items: Vec<ActiveLoanView>) -> Vec<BorrowerLoans> {
    let mut groups: BTreeMap<String, BorrowerLoans> = BTreeMap::new();
    for item in items {
        let group = groups
            .entry(item.borrower.tp_id().to_string())
            .or_insert_with(|| BorrowerLoans {
                tp_id: item.borrower.tp_id().to_string(),
                borrower_name: item.borrower.name().to_string(),
                overdue_lines: 0,
                items: Vec::new(),
            });
        if item.status == LoanStatus::Overdue {
            group.overdue_lines += 1;
        }
        group.items.push(item);
    }
    groups.into_values().collect()
}

/// Every applied return, newest first.
pub fn return_history(catalog: &CatalogState, loans: &Loans) -> Vec<ReturnHistoryEntry> {
    let mut out: Vec<ReturnHistoryEntry> = loans
        .returns()
        .iter()
        .map(|r| {
            let borrower = loans.get(r.transaction_id).ok().map(|t| t.borrower());
            ReturnHistoryEntry {
                record_id: r.id,
                transaction_id: r.transaction_id,
                borrower_name: borrower.map(|b| b.name().to_string()).unwrap_or_default(),
                tp_id: borrower.map(|b| b.tp_id().to_string()).unwrap_or_default(),
                component_id: r.component_id,
                component_name: component_name(catalog, r.component_id),
                quantity: r.quantity,
                pic_name: r.pic_name.clone(),
                remarks: r.remarks.clone(),
                returned_at: r.returned_at,
            }
        })
        .collect();
    // Record ids are v7, so they break timestamp ties in application order.
    out.sort_by(|a, b| b.returned_at.cmp(&a.returned_at).then(b.record_id.cmp(&a.record_id)));
    out
}

/// Lay out `views` (already filtered to one cabinet) by shelf and container.
///
/// Every shelf and provisioned container appears, even when empty.
pub fn cabinet_contents(
    cabinet_number: u32,
    views: Vec<ComponentView>,
    containers: &ContainerDirectory,
) -> CabinetContents {
    let shelves_per_cabinet = containers.layout().shelves_per_cabinet;
    let mut shelves: Vec<ShelfContents> = (1..=shelves_per_cabinet)
        .map(|shelf_number| ShelfContents {
            shelf_number,
            loose: Vec::new(),
            containers: containers
                .on_shelf(cabinet_number, shelf_number)
                .into_iter()
                .map(|c| ContainerContents {
                    container_id: c.id,
                    code: c.code.clone(),
                    components: Vec::new(),
                })
                .collect(),
        })
        .collect();
    let mut unshelved = Vec::new();

    for view in views {
        let StorageLocation::Cabinet { slot, .. } = &view.location else {
            continue;
        };
        match slot.clone() {
            CabinetSlot::Unshelved => unshelved.push(view),
            CabinetSlot::Shelf { shelf_number } => {
                if let Some(shelf) = shelf_mut(&mut shelves, shelf_number) {
                    shelf.loose.push(view);
                }
            }
            CabinetSlot::Container {
                shelf_number,
                container,
                ..
            } => {
                let slot = shelf_mut(&mut shelves, shelf_number)
                    .and_then(|s| s.containers.iter_mut().find(|c| c.container_id == container.id));
                if let Some(slot) = slot {
                    slot.components.push(view);
                }
            }
        }
    }

    CabinetContents {
        cabinet_number,
        unshelved,
        shelves,
    }
}

fn shelf_mut(shelves: &mut [ShelfContents], shelf_number: u32) -> Option<&mut ShelfContents> {
    shelves.iter_mut().find(|s| s.shelf_number == shelf_number)
}

fn component_name(catalog: &CatalogState, id: ComponentId) -> String {
    catalog
        .get(id)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|_| id.to_string())
}

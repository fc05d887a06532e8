use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ComponentId, TransactionId};
use stockroom_events::Event;

use crate::category::Category;
use crate::loan::{BorrowLine, ReturnRecord};
use crate::location::StorageLocation;

/// Event: ComponentCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCreated {
    pub component_id: ComponentId,
    pub name: String,
    pub category: Category,
    pub total_quantity: u32,
    pub location: StorageLocation,
    pub is_controlled: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ComponentModified (full post-change state of the mutable fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentModified {
    pub component_id: ComponentId,
    pub version: u64,
    pub name: String,
    pub category: Category,
    pub total_quantity: u32,
    pub location: StorageLocation,
    pub is_controlled: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ComponentDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDeleted {
    pub component_id: ComponentId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted (restock or write-off outside of a modify).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub component_id: ComponentId,
    pub previous_total: u32,
    pub total_quantity: u32,
    pub borrowed_quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BorrowCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowCreated {
    pub transaction_id: TransactionId,
    pub tp_id: String,
    pub pic_name: String,
    pub lines: Vec<BorrowLine>,
    pub expected_return_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemsReturned (one event per applied batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsReturned {
    pub pic_name: String,
    pub records: Vec<ReturnRecord>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ComponentCreated(ComponentCreated),
    ComponentModified(ComponentModified),
    ComponentDeleted(ComponentDeleted),
    StockAdjusted(StockAdjusted),
    BorrowCreated(BorrowCreated),
    ItemsReturned(ItemsReturned),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ComponentCreated(_) => "inventory.component.created",
            InventoryEvent::ComponentModified(_) => "inventory.component.modified",
            InventoryEvent::ComponentDeleted(_) => "inventory.component.deleted",
            InventoryEvent::StockAdjusted(_) => "inventory.stock.adjusted",
            InventoryEvent::BorrowCreated(_) => "inventory.borrow.created",
            InventoryEvent::ItemsReturned(_) => "inventory.borrow.items_returned",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ComponentCreated(e) => e.occurred_at,
            InventoryEvent::ComponentModified(e) => e.occurred_at,
            InventoryEvent::ComponentDeleted(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
            InventoryEvent::BorrowCreated(e) => e.occurred_at,
            InventoryEvent::ItemsReturned(e) => e.occurred_at,
        }
    }
}

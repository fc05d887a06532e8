//! Inventory domain module.
//!
//! Business rules for the component catalog, storage placement, stock
//! conservation and loans, implemented purely as deterministic domain logic
//! (no IO, no locks, no storage). Concurrency lives in `stockroom-infra`.

pub mod category;
pub mod component;
pub mod container;
pub mod events;
pub mod loan;
pub mod location;
pub mod overdue;
pub mod resolver;
pub mod stock;

pub use category::Category;
pub use component::{Component, ComponentChanges, ComponentView, Deletion, NewComponent};
pub use container::{CabinetLayout, Container, ContainerDirectory};
pub use events::{
    BorrowCreated, ComponentCreated, ComponentDeleted, ComponentModified, InventoryEvent, ItemsReturned,
    StockAdjusted,
};
pub use loan::{
    BorrowItem, BorrowLine, BorrowRequest, BorrowTransaction, Borrower, ItemStatus, ReturnLine,
    ReturnRecord, ReturnRequest, TransactionStatus,
};
pub use location::{
    CabinetSlot, ContainerRef, LocationRequest, MAX_SUB_LOCATION_INDEX, StorageLocation, StorageType,
    SubLocation, SubLocationKind,
};
pub use overdue::{LoanStatus, OverdueAssessment, classify};
pub use resolver::LocationResolver;
pub use stock::StockLevel;

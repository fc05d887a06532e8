//! Infrastructure layer: locking, orchestration and configuration.
//!
//! The domain crates decide *whether* a change is allowed; this crate decides
//! *how* it is applied safely under concurrency (per-component ledger locks,
//! ordered multi-component batches) and publishes the resulting events.

pub mod audit;
pub mod borrow;
pub mod catalog;
pub mod config;
pub mod ledger;
pub mod lifecycle;
pub mod loans;
pub mod returns;
pub mod storeroom;
pub mod views;


pub use audit::{ConservationViolation, conservation_audit};
pub use borrow::BorrowEngine;
pub use catalog::Catalog;
pub use config::{ConfigError, StoreroomConfig};
pub use ledger::{InventoryLedger, LedgerBatch};
pub use lifecycle::ComponentLifecycle;
pub use loans::LoanBook;
pub use returns::ReturnEngine;
pub use storeroom::{InventoryEnvelope, Storeroom};
pub use views::{
    ActiveLoanView, BorrowerLoans, CabinetContents, ContainerContents, LocationOccupancy, ReturnHistoryEntry,
    ShelfContents,
};

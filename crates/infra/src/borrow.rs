//! Borrow engine: all-or-nothing creation of multi-line loans.

use std::sync::Arc;

use stockroom_core::{ComponentId, DomainError, DomainResult, TransactionId};
use stockroom_inventory::{BorrowRequest, BorrowTransaction};

use crate::catalog::Catalog;
use crate::ledger::InventoryLedger;
use crate::loans::LoanBook;

#[derive(Debug, Clone)]
pub struct BorrowEngine {
    catalog: Arc<Catalog>,
    ledger: Arc<InventoryLedger>,
    loans: Arc<LoanBook>,
}

impl BorrowEngine {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<InventoryLedger>, loans: Arc<LoanBook>) -> Self {
        Self {
            catalog,
            ledger,
            loans,
        }
    }

    /// Reserve every line and record the transaction, or change nothing.
    ///
    /// Lock order: catalog (shared) → ledger cells (ascending id) → loan book.
    /// The catalog read lock keeps a concurrent delete or control toggle from
    /// slipping in between the metadata checks and the reservation.
    pub fn create_borrow(&self, request: &BorrowRequest) -> DomainResult<BorrowTransaction> {
        let result = self.try_create(request);
        match &result {
            Ok(tx) => tracing::info!(
                transaction_id = %tx.id(),
                tp_id = %tx.borrower().tp_id(),
                lines = tx.items().len(),
                units = tx.items().iter().map(|i| u64::from(i.quantity_borrowed())).sum::<u64>(),
                "borrow created"
            ),
            Err(e) => tracing::warn!(tp_id = %request.borrower.tp_id(), error = %e, "borrow rejected"),
        }
        result
    }

    fn try_create(&self, request: &BorrowRequest) -> DomainResult<BorrowTransaction> {
        let lines = request.normalized_lines()?;

        let catalog = self.catalog.read()?;
        for line in &lines {
            let component = catalog.get_active(line.component_id)?;
            if component.is_controlled() {
                return Err(DomainError::controlled(format!(
                    "component {} is controlled and cannot be borrowed",
                    line.component_id
                )));
            }
        }

        let ids: Vec<ComponentId> = lines.iter().map(|l| l.component_id).collect();
        self.ledger.transact(&ids, |batch| {
            for line in &lines {
                batch.reserve(line.component_id, line.quantity)?;
            }
            let transaction = BorrowTransaction::open(TransactionId::new(), request, &lines);
            self.loans.lock()?.insert(transaction.clone())?;
            Ok(transaction)
        })
    }
}

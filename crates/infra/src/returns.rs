//! Return engine: partial or full returns, validated as one batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockroom_core::{ComponentId, DomainError, DomainResult, ReturnRecordId, TransactionId};
use stockroom_inventory::{BorrowTransaction, ReturnLine, ReturnRecord, ReturnRequest};

use crate::ledger::InventoryLedger;
use crate::loans::LoanBook;

#[derive(Debug, Clone)]
pub struct ReturnEngine {
    ledger: Arc<InventoryLedger>,
    loans: Arc<LoanBook>,
}

impl ReturnEngine {
    pub fn new(ledger: Arc<InventoryLedger>, loans: Arc<LoanBook>) -> Self {
        Self { ledger, loans }
    }

    /// Apply every line of `request` or none of them.
    ///
    /// Lines naming the same `(transaction, component)` are checked against
    /// the outstanding quantity together. Deleted components remain
    /// returnable. One [`ReturnRecord`] is appended per line.
    pub fn return_items(&self, request: &ReturnRequest) -> DomainResult<Vec<ReturnRecord>> {
        let result = self.try_return(request);
        match &result {
            Ok(records) => {
                for r in records {
                    tracing::info!(
                        transaction_id = %r.transaction_id,
                        component_id = %r.component_id,
                        quantity = r.quantity,
                        "items returned"
                    );
                }
            }
            Err(e) => tracing::warn!(lines = request.lines.len(), error = %e, "return rejected"),
        }
        result
    }

    /// Single-line convenience over [`return_items`](Self::return_items).
    pub fn return_item(
        &self,
        pic_name: &str,
        line: ReturnLine,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ReturnRecord> {
        let request = ReturnRequest {
            pic_name: pic_name.to_string(),
            lines: vec![line],
            occurred_at,
        };
        self.return_items(&request)?
            .pop()
            .ok_or_else(|| DomainError::internal("return produced no record"))
    }

    fn try_return(&self, request: &ReturnRequest) -> DomainResult<Vec<ReturnRecord>> {
        request.validate_shape()?;
        let pic_name = request.pic_name.trim().to_string();

        let mut requested: BTreeMap<(TransactionId, ComponentId), u32> = BTreeMap::new();
        for line in &request.lines {
            if line.quantity == 0 {
                return Err(DomainError::validation("return quantity must be greater than zero"));
            }
            let entry = requested.entry((line.transaction_id, line.component_id)).or_default();
            *entry = entry
                .checked_add(line.quantity)
                .ok_or_else(|| DomainError::validation("return quantity overflow"))?;
        }

        let ids: Vec<ComponentId> = requested.keys().map(|(_, c)| *c).collect();
        self.ledger.transact(&ids, |batch| {
            let mut loans = self.loans.lock()?;

            // Validate the whole batch on copies before touching the book.
            let mut staged: BTreeMap<TransactionId, BorrowTransaction> = BTreeMap::new();
            for (&(transaction_id, component_id), &qty) in &requested {
                loans.open_item(transaction_id, component_id)?.check_return(qty)?;
                batch.release(component_id, qty)?;
                if !staged.contains_key(&transaction_id) {
                    staged.insert(transaction_id, loans.get(transaction_id)?.clone());
                }
            }

            let mut records = Vec::with_capacity(request.lines.len());
            for line in &request.lines {
                let item = staged
                    .get_mut(&line.transaction_id)
                    .and_then(|tx| tx.item_for_mut(line.component_id))
                    .ok_or_else(|| DomainError::internal("staged transaction missing"))?;
                item.record_return(line.quantity)?;
                records.push(ReturnRecord {
                    id: ReturnRecordId::new(),
                    transaction_id: line.transaction_id,
                    borrow_item_id: item.id(),
                    component_id: line.component_id,
                    quantity: line.quantity,
                    pic_name: pic_name.clone(),
                    remarks: line
                        .remarks
                        .as_deref()
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .map(str::to_string),
                    returned_at: request.occurred_at,
                });
            }

            for (id, transaction) in staged {
                *loans.get_mut(id)? = transaction;
            }
            for record in &records {
                loans.push_return(record.clone());
            }
            Ok(records)
        })
    }
}

//! Borrow transactions and the append-only return history.
//!
//! The loan book is the innermost lock: it is only ever taken while the
//! caller already holds the ledger cells of the components involved (or
//! nothing at all, for read-only views).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use stockroom_core::{ComponentId, DomainError, DomainResult, TransactionId};
use stockroom_inventory::{BorrowItem, BorrowTransaction, ReturnRecord};

#[derive(Debug, Default)]
pub struct LoanBook {
    inner: Mutex<Loans>,
}

#[derive(Debug, Default)]
pub struct Loans {
    transactions: BTreeMap<TransactionId, BorrowTransaction>,
    returns: Vec<ReturnRecord>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> DomainResult<MutexGuard<'_, Loans>> {
        self.inner
            .lock()
            .map_err(|_| DomainError::internal("loan book lock poisoned"))
    }
}

impl Loans {
    pub fn insert(&mut self, transaction: BorrowTransaction) -> DomainResult<()> {
        let id = transaction.id();
        if self.transactions.contains_key(&id) {
            return Err(DomainError::conflict(format!("transaction {id} already exists")));
        }
        self.transactions.insert(id, transaction);
        Ok(())
    }

    pub fn get(&self, id: TransactionId) -> DomainResult<&BorrowTransaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("transaction {id}")))
    }

    /// The still-open line of `component_id` in transaction `id`.
    pub fn open_item(&self, id: TransactionId, component_id: ComponentId) -> DomainResult<&BorrowItem> {
        self.get(id)?
            .item_for(component_id)
            .filter(|item| item.is_open())
            .ok_or_else(|| {
                DomainError::not_found(format!("open item for component {component_id} in transaction {id}"))
            })
    }

    pub(crate) fn get_mut(&mut self, id: TransactionId) -> DomainResult<&mut BorrowTransaction> {
        self.transactions
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("transaction {id}")))
    }

    pub(crate) fn push_return(&mut self, record: ReturnRecord) {
        self.returns.push(record);
    }

    /// Transactions in id (creation) order.
    pub fn transactions(&self) -> impl Iterator<Item = &BorrowTransaction> {
        self.transactions.values()
    }

    /// Return records in the order they were applied.
    pub fn returns(&self) -> &[ReturnRecord] {
        &self.returns
    }

    /// Sum of remaining quantity over every open line of `component_id`.
    pub fn outstanding(&self, component_id: ComponentId) -> u32 {
        self.transactions
            .values()
            .filter_map(|t| t.item_for(component_id))
            .map(BorrowItem::remaining)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use stockroom_inventory::{BorrowLine, BorrowRequest, Borrower};

    fn transaction(lines: &[BorrowLine]) -> BorrowTransaction {
        let request = BorrowRequest {
            borrower: Borrower::new("Ada", "tp001", "0123", None).unwrap(),
            reason: "lab".to_string(),
            expected_return_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            pic_name: "Sam".to_string(),
            items: lines.to_vec(),
            occurred_at: Utc::now(),
        };
        BorrowTransaction::open(TransactionId::new(), &request, lines)
    }

    #[test]
    fn outstanding_sums_open_lines_across_transactions() {
        let c = ComponentId::new();
        let mut loans = Loans::default();
        loans.insert(transaction(&[BorrowLine { component_id: c, quantity: 2 }])).unwrap();
        loans.insert(transaction(&[BorrowLine { component_id: c, quantity: 5 }])).unwrap();
        assert_eq!(loans.outstanding(c), 7);
        assert_eq!(loans.outstanding(ComponentId::new()), 0);
    }

    #[test]
    fn closed_lines_are_not_open_items() {
        let c = ComponentId::new();
        let mut loans = Loans::default();
        let tx = transaction(&[BorrowLine { component_id: c, quantity: 1 }]);
        let id = tx.id();
        loans.insert(tx).unwrap();

        assert!(loans.open_item(id, c).is_ok());
        loans.get_mut(id).unwrap().item_for_mut(c).unwrap().record_return(1).unwrap();
        assert!(matches!(loans.open_item(id, c), Err(DomainError::NotFound(_))));
        assert!(matches!(
            loans.open_item(TransactionId::new(), c),
            Err(DomainError::NotFound(_))
        ));
    }
}

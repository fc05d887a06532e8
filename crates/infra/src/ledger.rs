//! Authoritative stock ledger with per-component locking.
//!
//! Each component's [`StockLevel`] sits behind its own mutex, so operations on
//! different components never wait on each other. The outer map lock is held
//! only long enough to look up (or insert) a cell.
//!
//! Multi-component work goes through [`InventoryLedger::transact`], which
//! locks every involved component in ascending [`ComponentId`] order, applies
//! the batch to staged copies and writes back only if the whole batch
//! succeeded.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use stockroom_core::{ComponentId, DomainError, DomainResult};
use stockroom_inventory::StockLevel;

type Cell = Arc<Mutex<StockLevel>>;

#[derive(Debug, Default)]
pub struct InventoryLedger {
    cells: RwLock<HashMap<ComponentId, Cell>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a component. Registering the same id twice is a conflict.
    pub fn register(&self, level: StockLevel) -> DomainResult<()> {
        let mut cells = self.cells.write().map_err(|_| poisoned())?;
        let id = level.component_id();
        if cells.contains_key(&id) {
            return Err(DomainError::conflict(format!("stock for {id} is already registered")));
        }
        cells.insert(id, Arc::new(Mutex::new(level)));
        Ok(())
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.cells.read().map(|c| c.contains_key(&id)).unwrap_or(false)
    }

    /// Consistent copy of one component's stock.
    pub fn snapshot(&self, id: ComponentId) -> DomainResult<StockLevel> {
        let cell = self.cell(id)?;
        let level = cell.lock().map_err(|_| poisoned())?;
        Ok(*level)
    }

    pub fn total_quantity(&self, id: ComponentId) -> DomainResult<u32> {
        self.snapshot(id).map(|s| s.total())
    }

    pub fn borrowed_quantity(&self, id: ComponentId) -> DomainResult<u32> {
        self.snapshot(id).map(|s| s.borrowed())
    }

    pub fn available_quantity(&self, id: ComponentId) -> DomainResult<u32> {
        self.snapshot(id).map(|s| s.available())
    }

    pub fn increase_total(&self, id: ComponentId, delta: u32) -> DomainResult<StockLevel> {
        self.update(id, |s| s.increase_total(delta))
    }

    pub fn decrease_total(&self, id: ComponentId, delta: u32) -> DomainResult<StockLevel> {
        self.update(id, |s| s.decrease_total(delta))
    }

    pub fn set_total(&self, id: ComponentId, total: u32) -> DomainResult<StockLevel> {
        self.update(id, |s| s.set_total(total))
    }

    pub fn reserve(&self, id: ComponentId, qty: u32) -> DomainResult<StockLevel> {
        self.update(id, |s| s.reserve(qty))
    }

    pub fn release(&self, id: ComponentId, qty: u32) -> DomainResult<StockLevel> {
        self.update(id, |s| s.release(qty))
    }

    /// Run `f` against staged copies of every component in `ids`.
    ///
    /// All component locks are held (ascending id order) for the duration of
    /// `f`. Staged levels are written back only when `f` returns `Ok`, so a
    /// batch either applies completely or not at all. Unknown ids fail with
    /// `NotFound` before anything is locked.
    pub fn transact<T, F>(&self, ids: &[ComponentId], f: F) -> DomainResult<T>
    where
        F: FnOnce(&mut LedgerBatch) -> DomainResult<T>,
    {
        let ordered: BTreeSet<ComponentId> = ids.iter().copied().collect();
        let cells = ordered
            .iter()
            .map(|id| self.cell(*id).map(|c| (*id, c)))
            .collect::<DomainResult<Vec<_>>>()?;

        let mut guards: Vec<(ComponentId, MutexGuard<'_, StockLevel>)> = Vec::with_capacity(cells.len());
        for (id, cell) in &cells {
            tracing::debug!(component_id = %id, "locking stock cell");
            guards.push((*id, cell.lock().map_err(|_| poisoned())?));
        }

        let mut batch = LedgerBatch {
            staged: guards.iter().map(|(id, g)| (*id, **g)).collect(),
        };
        let out = f(&mut batch)?;

        for (id, guard) in guards.iter_mut() {
            if let Some(level) = batch.staged.get(id) {
                **guard = *level;
            }
        }
        Ok(out)
    }

    /// Ids of every tracked component, ascending.
    pub fn component_ids(&self) -> DomainResult<Vec<ComponentId>> {
        let cells = self.cells.read().map_err(|_| poisoned())?;
        let mut ids: Vec<ComponentId> = cells.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn update<F>(&self, id: ComponentId, f: F) -> DomainResult<StockLevel>
    where
        F: FnOnce(&StockLevel) -> DomainResult<StockLevel>,
    {
        let cell = self.cell(id)?;
        let mut level = cell.lock().map_err(|_| poisoned())?;
        let next = f(&level)?;
        *level = next;
        Ok(next)
    }

    fn cell(&self, id: ComponentId) -> DomainResult<Cell> {
        let cells = self.cells.read().map_err(|_| poisoned())?;
        cells
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("component {id}")))
    }
}

/// Staged stock levels of a locked set of components.
#[derive(Debug)]
pub struct LedgerBatch {
    staged: BTreeMap<ComponentId, StockLevel>,
}

impl LedgerBatch {
    pub fn get(&self, id: ComponentId) -> DomainResult<StockLevel> {
        self.staged
            .get(&id)
            .copied()
            .ok_or_else(|| DomainError::internal(format!("component {id} is not part of this batch")))
    }

    pub fn reserve(&mut self, id: ComponentId, qty: u32) -> DomainResult<()> {
        let next = self.get(id)?.reserve(qty)?;
        self.staged.insert(id, next);
        Ok(())
    }

    pub fn release(&mut self, id: ComponentId, qty: u32) -> DomainResult<()> {
        let next = self.get(id)?.release(qty)?;
        self.staged.insert(id, next);
        Ok(())
    }

    pub fn levels(&self) -> impl Iterator<Item = &StockLevel> {
        self.staged.values()
    }
}

fn poisoned() -> DomainError {
    DomainError::internal("stock ledger lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn ledger_with(totals: &[u32]) -> (Arc<InventoryLedger>, Vec<ComponentId>) {
        let ledger = Arc::new(InventoryLedger::new());
        let ids = totals
            .iter()
            .map(|t| {
                let id = ComponentId::new();
                ledger.register(StockLevel::new(id, *t)).unwrap();
                id
            })
            .collect();
        (ledger, ids)
    }

    #[test]
    fn unknown_component_is_not_found() {
        let ledger = InventoryLedger::new();
        assert!(matches!(ledger.snapshot(ComponentId::new()), Err(DomainError::NotFound(_))));
        assert!(matches!(ledger.reserve(ComponentId::new(), 1), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn double_registration_conflicts() {
        let (ledger, ids) = ledger_with(&[1]);
        assert!(matches!(
            ledger.register(StockLevel::new(ids[0], 5)),
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(ledger.total_quantity(ids[0]).unwrap(), 1);
    }

    #[test]
    fn rejected_update_leaves_state_alone() {
        let (ledger, ids) = ledger_with(&[10]);
        ledger.reserve(ids[0], 6).unwrap();
        assert!(ledger.decrease_total(ids[0], 5).is_err());
        let s = ledger.snapshot(ids[0]).unwrap();
        assert_eq!((s.total(), s.borrowed()), (10, 6));
    }

    #[test]
    fn failed_batch_commits_nothing() {
        let (ledger, ids) = ledger_with(&[5, 2]);
        let result = ledger.transact(&ids, |batch| {
            batch.reserve(ids[0], 3)?;
            batch.reserve(ids[1], 3)?;
            Ok(())
        });
        assert!(matches!(result, Err(DomainError::InsufficientAvailability { .. })));
        assert_eq!(ledger.borrowed_quantity(ids[0]).unwrap(), 0);
        assert_eq!(ledger.borrowed_quantity(ids[1]).unwrap(), 0);
    }

    #[test]
    fn batch_with_unknown_component_is_not_found() {
        let (ledger, ids) = ledger_with(&[5]);
        let result = ledger.transact(&[ids[0], ComponentId::new()], |_| Ok(()));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn concurrent_reservations_never_oversell() {
        let (ledger, ids) = ledger_with(&[10]);
        let id = ids[0];

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || ledger.reserve(id, 3).is_ok())
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 3);

        let s = ledger.snapshot(id).unwrap();
        assert_eq!(s.borrowed(), 9);
        assert_eq!(s.available(), 1);
    }

    #[test]
    fn overlapping_batches_in_opposite_order_do_not_deadlock() {
        let (ledger, ids) = ledger_with(&[1000, 1000]);
        let (a, b) = (ids[0], ids[1]);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                let order = if i % 2 == 0 { vec![a, b] } else { vec![b, a] };
                thread::spawn(move || {
                    for _ in 0..50 {
                        ledger
                            .transact(&order, |batch| {
                                batch.reserve(order[0], 1)?;
                                batch.reserve(order[1], 1)
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(ledger.borrowed_quantity(a).unwrap(), 400);
        assert_eq!(ledger.borrowed_quantity(b).unwrap(), 400);
    }
}

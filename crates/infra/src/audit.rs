//! Conservation audit: ledger totals against the loan book.

use serde::{Deserialize, Serialize};

use stockroom_core::{ComponentId, DomainResult};

use crate::ledger::InventoryLedger;
use crate::loans::LoanBook;

/// A component whose ledger disagrees with its open loan lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationViolation {
    pub component_id: ComponentId,
    pub total: u32,
    pub borrowed: u32,
    pub outstanding_on_loans: u32,
}

/// Check `borrowed <= total` and `borrowed == Σ remaining` for every
/// component, against one consistent snapshot.
///
/// Locks every ledger cell, so it stalls borrows and returns while it runs.
pub fn conservation_audit(ledger: &InventoryLedger, loans: &LoanBook) -> DomainResult<Vec<ConservationViolation>> {
    let ids = ledger.component_ids()?;
    let violations = ledger.transact(&ids, |batch| {
        let loans = loans.lock()?;
        Ok(batch
            .levels()
            .filter_map(|level| {
                let outstanding = loans.outstanding(level.component_id());
                let ok = level.borrowed() <= level.total() && level.borrowed() == outstanding;
                (!ok).then(|| ConservationViolation {
                    component_id: level.component_id(),
                    total: level.total(),
                    borrowed: level.borrowed(),
                    outstanding_on_loans: outstanding,
                })
            })
            .collect::<Vec<_>>())
    })?;

    for v in &violations {
        tracing::warn!(
            component_id = %v.component_id,
            borrowed = v.borrowed,
            outstanding = v.outstanding_on_loans,
            "conservation violated"
        );
    }
    Ok(violations)
}

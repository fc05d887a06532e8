//! Per-component quantity state and its conservation rules.
//!
//! Every operation is a pure compare-and-swap step: it reads `self`,
//! validates, and returns the next state without touching `self`. The caller
//! holding the component's lock decides whether to write the result back.

use serde::{Deserialize, Serialize};

use stockroom_core::{ComponentId, DomainError, DomainResult};

/// `(total, borrowed)` for one component. Invariant: `borrowed <= total`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StockLevelInput")]
pub struct StockLevel {
    component_id: ComponentId,
    total: u32,
    borrowed: u32,
}

impl StockLevel {
    /// Fresh stock: nothing out on loan.
    pub fn new(component_id: ComponentId, total: u32) -> Self {
        Self {
            component_id,
            total,
            borrowed: 0,
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn borrowed(&self) -> u32 {
        self.borrowed
    }

    pub fn available(&self) -> u32 {
        self.total - self.borrowed
    }

    pub fn increase_total(&self, delta: u32) -> DomainResult<Self> {
        ensure_positive(delta, "delta")?;
        let total = self
            .total
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("total quantity overflow"))?;
        Ok(Self { total, ..*self })
    }

    /// Fails with `QuantityConflict` if the result would drop below what is on loan.
    pub fn decrease_total(&self, delta: u32) -> DomainResult<Self> {
        ensure_positive(delta, "delta")?;
        match self.total.checked_sub(delta) {
            Some(total) if total >= self.borrowed => Ok(Self { total, ..*self }),
            _ => Err(DomainError::quantity_conflict(format!(
                "cannot reduce total of {} by {delta}: {} currently borrowed",
                self.component_id, self.borrowed
            ))),
        }
    }

    /// Move the total to an absolute value (used by modify).
    pub fn set_total(&self, total: u32) -> DomainResult<Self> {
        if total < self.borrowed {
            return Err(DomainError::quantity_conflict(format!(
                "total {total} for {} is below the {} currently borrowed",
                self.component_id, self.borrowed
            )));
        }
        Ok(Self { total, ..*self })
    }

    pub fn reserve(&self, qty: u32) -> DomainResult<Self> {
        ensure_positive(qty, "quantity")?;
        if qty > self.available() {
            return Err(DomainError::InsufficientAvailability {
                component_id: self.component_id,
                requested: qty,
                available: self.available(),
            });
        }
        Ok(Self {
            borrowed: self.borrowed + qty,
            ..*self
        })
    }

    pub fn release(&self, qty: u32) -> DomainResult<Self> {
        ensure_positive(qty, "quantity")?;
        if qty > self.borrowed {
            return Err(DomainError::OverReturn {
                requested: qty,
                outstanding: self.borrowed,
            });
        }
        Ok(Self {
            borrowed: self.borrowed - qty,
            ..*self
        })
    }
}

#[derive(Deserialize)]
struct StockLevelInput {
    component_id: ComponentId,
    total: u32,
    borrowed: u32,
}

impl TryFrom<StockLevelInput> for StockLevel {
    type Error = DomainError;

    fn try_from(input: StockLevelInput) -> Result<Self, Self::Error> {
        if input.borrowed > input.total {
            return Err(DomainError::quantity_conflict(format!(
                "borrowed {} exceeds total {} for {}",
                input.borrowed, input.total, input.component_id
            )));
        }
        Ok(Self {
            component_id: input.component_id,
            total: input.total,
            borrowed: input.borrowed,
        })
    }
}

fn ensure_positive(value: u32, what: &str) -> DomainResult<()> {
    if value == 0 {
        return Err(DomainError::validation(format!("{what} must be greater than zero")));
    }
    Ok(())
}

//! Borrow transactions, their line items and return audit records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    BorrowItemId, ComponentId, DomainError, DomainResult, ReturnRecordId, TransactionId, ValueObject,
};

use crate::overdue::{OverdueAssessment, classify};

/// Who is borrowing. `tp_id` groups a borrower's loans in downstream views
/// and is not unique across transactions.
///
/// Only constructible through [`Borrower::new`]; deserialization goes
/// through the same normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BorrowerInput")]
pub struct Borrower {
    name: String,
    tp_id: String,
    phone: String,
    email: Option<String>,
}

impl ValueObject for Borrower {}

impl Borrower {
    /// Normalises the identity fields: name and TP id are trimmed and
    /// upper-cased, phone and email trimmed.
    pub fn new(
        name: &str,
        tp_id: &str,
        phone: &str,
        email: Option<&str>,
    ) -> DomainResult<Self> {
        let name = required_text(name, "borrower name")?.to_uppercase();
        let tp_id = required_text(tp_id, "borrower tp_id")?.to_uppercase();
        let phone = required_text(phone, "borrower phone")?;
        let email = email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string);
        Ok(Self {
            name,
            tp_id,
            phone,
            email,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tp_id(&self) -> &str {
        &self.tp_id
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn check_identity(&self) -> DomainResult<()> {
        required_text(&self.name, "borrower name")?;
        required_text(&self.tp_id, "borrower tp_id")?;
        required_text(&self.phone, "borrower phone")?;
        Ok(())
    }
}

/// Wire shape of a borrower before normalisation.
#[derive(Deserialize)]
struct BorrowerInput {
    name: String,
    tp_id: String,
    phone: String,
    #[serde(default)]
    email: Option<String>,
}

impl TryFrom<BorrowerInput> for Borrower {
    type Error = DomainError;

    fn try_from(input: BorrowerInput) -> Result<Self, Self::Error> {
        Borrower::new(&input.name, &input.tp_id, &input.phone, input.email.as_deref())
    }
}

/// One requested line of a borrow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowLine {
    pub component_id: ComponentId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub borrower: Borrower,
    pub reason: String,
    pub expected_return_date: NaiveDate,
    pub pic_name: String,
    pub items: Vec<BorrowLine>,
    pub occurred_at: DateTime<Utc>,
}

impl BorrowRequest {
    /// Validate the shape of the request and merge repeated components.
    ///
    /// Returned lines are sorted by component id, one per component.
    pub fn normalized_lines(&self) -> DomainResult<Vec<BorrowLine>> {
        self.borrower.check_identity()?;
        required_text(&self.reason, "reason")?;
        required_text(&self.pic_name, "pic_name")?;
        if self.items.is_empty() {
            return Err(DomainError::validation("a borrow needs at least one item"));
        }

        let mut merged: BTreeMap<ComponentId, u32> = BTreeMap::new();
        for line in &self.items {
            if line.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "quantity for component {} must be greater than zero",
                    line.component_id
                )));
            }
            let entry = merged.entry(line.component_id).or_default();
            *entry = entry
                .checked_add(line.quantity)
                .ok_or_else(|| DomainError::validation("borrow quantity overflow"))?;
        }

        Ok(merged
            .into_iter()
            .map(|(component_id, quantity)| BorrowLine {
                component_id,
                quantity,
            })
            .collect())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Active,
    Closed,
}

/// One component line within a transaction. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowItem {
    id: BorrowItemId,
    component_id: ComponentId,
    quantity_borrowed: u32,
    quantity_returned: u32,
}

impl BorrowItem {
    pub fn new(component_id: ComponentId, quantity_borrowed: u32) -> Self {
        Self {
            id: BorrowItemId::new(),
            component_id,
            quantity_borrowed,
            quantity_returned: 0,
        }
    }

    pub fn id(&self) -> BorrowItemId {
        self.id
    }

    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    pub fn quantity_borrowed(&self) -> u32 {
        self.quantity_borrowed
    }

    pub fn quantity_returned(&self) -> u32 {
        self.quantity_returned
    }

    pub fn remaining(&self) -> u32 {
        self.quantity_borrowed - self.quantity_returned
    }

    pub fn is_open(&self) -> bool {
        self.remaining() > 0
    }

    pub fn status(&self) -> ItemStatus {
        if self.is_open() {
            ItemStatus::Active
        } else {
            ItemStatus::Closed
        }
    }

    /// Check that `qty` more units can come back.
    pub fn check_return(&self, qty: u32) -> DomainResult<()> {
        if qty == 0 {
            return Err(DomainError::validation("return quantity must be greater than zero"));
        }
        if qty > self.remaining() {
            return Err(DomainError::OverReturn {
                requested: qty,
                outstanding: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn record_return(&mut self, qty: u32) -> DomainResult<()> {
        self.check_return(qty)?;
        self.quantity_returned += qty;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowTransaction {
    id: TransactionId,
    borrower: Borrower,
    reason: String,
    expected_return_date: NaiveDate,
    pic_name: String,
    created_at: DateTime<Utc>,
    items: Vec<BorrowItem>,
}

impl BorrowTransaction {
    /// Build a transaction from a request whose lines were already validated
    /// and reserved.
    pub fn open(id: TransactionId, request: &BorrowRequest, lines: &[BorrowLine]) -> Self {
        Self {
            id,
            borrower: request.borrower.clone(),
            reason: request.reason.trim().to_string(),
            expected_return_date: request.expected_return_date,
            pic_name: request.pic_name.trim().to_string(),
            created_at: request.occurred_at,
            items: lines
                .iter()
                .map(|l| BorrowItem::new(l.component_id, l.quantity))
                .collect(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn borrower(&self) -> &Borrower {
        &self.borrower
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn expected_return_date(&self) -> NaiveDate {
        self.expected_return_date
    }

    pub fn pic_name(&self) -> &str {
        &self.pic_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn items(&self) -> &[BorrowItem] {
        &self.items
    }

    pub fn item_for(&self, component_id: ComponentId) -> Option<&BorrowItem> {
        self.items.iter().find(|i| i.component_id == component_id)
    }

    pub fn item_for_mut(&mut self, component_id: ComponentId) -> Option<&mut BorrowItem> {
        self.items.iter_mut().find(|i| i.component_id == component_id)
    }

    pub fn status(&self) -> TransactionStatus {
        if self.items.iter().all(|i| !i.is_open()) {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Open
        }
    }

    /// Overdue assessment of one of this transaction's items on `today`.
    pub fn assess(&self, item: &BorrowItem, today: NaiveDate) -> OverdueAssessment {
        classify(self.expected_return_date, today, item.remaining())
    }
}

/// One requested return line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLine {
    pub transaction_id: TransactionId,
    pub component_id: ComponentId,
    pub quantity: u32,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub pic_name: String,
    pub lines: Vec<ReturnLine>,
    pub occurred_at: DateTime<Utc>,
}

impl ReturnRequest {
    pub fn validate_shape(&self) -> DomainResult<()> {
        required_text(&self.pic_name, "pic_name")?;
        if self.lines.is_empty() {
            return Err(DomainError::validation("a return needs at least one line"));
        }
        Ok(())
    }
}

/// Audit entry appended for every applied return line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub id: ReturnRecordId,
    pub transaction_id: TransactionId,
    pub borrow_item_id: BorrowItemId,
    pub component_id: ComponentId,
    pub quantity: u32,
    pub pic_name: String,
    pub remarks: Option<String>,
    pub returned_at: DateTime<Utc>,
}

fn required_text(value: &str, what: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{what} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overdue::LoanStatus;

    fn borrower() -> Borrower {
        Borrower::new(" jane doe ", "tp012345", " 0123 ", Some("  ")).unwrap()
    }

    fn request(items: Vec<BorrowLine>) -> BorrowRequest {
        BorrowRequest {
            borrower: borrower(),
            reason: "FYP prototype".to_string(),
            expected_return_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            pic_name: "Lab Officer".to_string(),
            items,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn borrower_fields_are_normalised() {
        let b = borrower();
        assert_eq!(b.name(), "JANE DOE");
        assert_eq!(b.tp_id(), "TP012345");
        assert_eq!(b.phone(), "0123");
        assert_eq!(b.email(), None);
    }

    #[test]
    fn borrower_requires_identity_fields() {
        assert!(Borrower::new("Jane", "", "0123", None).is_err());
        assert!(Borrower::new("Jane", "TP1", " ", None).is_err());
    }

    #[test]
    fn deserialized_borrower_is_normalised_and_checked() {
        let b: Borrower = serde_json::from_str(
            r#"{"name":" ada ","tp_id":"tp7","phone":" 99 ","email":"a@x.io"}"#,
        )
        .unwrap();
        assert_eq!(b, Borrower::new("ADA", "TP7", "99", Some("a@x.io")).unwrap());

        let blank = serde_json::from_str::<Borrower>(r#"{"name":"","tp_id":"   ","phone":""}"#);
        assert!(blank.is_err());
    }

    #[test]
    fn borrower_round_trips_through_json() {
        let b = borrower();
        let back: Borrower = serde_json::from_str(&serde_json::to_string(&b).unwrap()).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn repeated_components_are_merged() {
        let c = ComponentId::new();
        let lines = request(vec![
            BorrowLine { component_id: c, quantity: 2 },
            BorrowLine { component_id: c, quantity: 3 },
        ])
        .normalized_lines()
        .unwrap();
        assert_eq!(lines, vec![BorrowLine { component_id: c, quantity: 5 }]);
    }

    #[test]
    fn zero_quantity_and_empty_requests_are_rejected() {
        let zero = request(vec![BorrowLine {
            component_id: ComponentId::new(),
            quantity: 0,
        }]);
        assert!(matches!(zero.normalized_lines(), Err(DomainError::Validation(_))));
        assert!(matches!(request(vec![]).normalized_lines(), Err(DomainError::Validation(_))));

        let mut no_pic = request(vec![BorrowLine {
            component_id: ComponentId::new(),
            quantity: 1,
        }]);
        no_pic.pic_name = " ".to_string();
        assert!(matches!(no_pic.normalized_lines(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn item_closes_when_fully_returned() {
        let mut item = BorrowItem::new(ComponentId::new(), 4);
        item.record_return(1).unwrap();
        assert_eq!((item.remaining(), item.status()), (3, ItemStatus::Active));

        assert_eq!(
            item.record_return(4).unwrap_err(),
            DomainError::OverReturn { requested: 4, outstanding: 3 }
        );
        assert_eq!(item.quantity_returned(), 1);

        item.record_return(3).unwrap();
        assert_eq!((item.remaining(), item.status()), (0, ItemStatus::Closed));
    }

    #[test]
    fn transaction_completes_when_every_item_closes() {
        let (a, b) = (ComponentId::new(), ComponentId::new());
        let req = request(vec![
            BorrowLine { component_id: a, quantity: 1 },
            BorrowLine { component_id: b, quantity: 2 },
        ]);
        let lines = req.normalized_lines().unwrap();
        let mut tx = BorrowTransaction::open(TransactionId::new(), &req, &lines);
        assert_eq!(tx.status(), TransactionStatus::Open);

        tx.item_for_mut(a).unwrap().record_return(1).unwrap();
        assert_eq!(tx.status(), TransactionStatus::Open);
        tx.item_for_mut(b).unwrap().record_return(2).unwrap();
        assert_eq!(tx.status(), TransactionStatus::Completed);
    }

    #[test]
    fn assess_uses_the_transaction_due_date() {
        let c = ComponentId::new();
        let req = request(vec![BorrowLine { component_id: c, quantity: 1 }]);
        let lines = req.normalized_lines().unwrap();
        let tx = BorrowTransaction::open(TransactionId::new(), &req, &lines);
        let item = tx.item_for(c).unwrap();

        let late = tx.assess(item, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!((late.status, late.days_overdue), (LoanStatus::Overdue, 2));
    }
}

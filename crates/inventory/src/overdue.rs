//! Overdue classification of open loan lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Overdue,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueAssessment {
    pub status: LoanStatus,
    pub days_overdue: i64,
}

/// Classify a loan line on `today`.
///
/// Whole days past the due date count as overdue; the due date itself does
/// not. Lines with nothing outstanding are never overdue and report 0 days.
pub fn classify(expected_return_date: NaiveDate, today: NaiveDate, remaining_quantity: u32) -> OverdueAssessment {
    if remaining_quantity == 0 {
        return OverdueAssessment {
            status: LoanStatus::Active,
            days_overdue: 0,
        };
    }

    let days_overdue = (today - expected_return_date).num_days().max(0);
    let status = if days_overdue > 0 {
        LoanStatus::Overdue
    } else {
        LoanStatus::Active
    };

    OverdueAssessment {
        status,
        days_overdue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn three_days_late_is_overdue() {
        let a = classify(today() - Duration::days(3), today(), 2);
        assert_eq!(a, OverdueAssessment { status: LoanStatus::Overdue, days_overdue: 3 });
    }

    #[test]
    fn due_today_or_later_is_active() {
        assert_eq!(classify(today(), today(), 1).status, LoanStatus::Active);
        let early = classify(today() + Duration::days(5), today(), 1);
        assert_eq!(early, OverdueAssessment { status: LoanStatus::Active, days_overdue: 0 });
    }

    #[test]
    fn closed_lines_are_never_overdue() {
        let a = classify(today() - Duration::days(30), today(), 0);
        assert_eq!(a, OverdueAssessment { status: LoanStatus::Active, days_overdue: 0 });
    }
}

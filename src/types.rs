use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a member
pub type MemberId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// capital still being recovered
    Active,
    /// recovered capital reached the principal; terminal
    Paid,
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

/// how a loan's interest is specified
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InterestSpec {
    /// per-period rate applied to the declining capital balance
    Percentage(Rate),
    /// fixed total interest amortized evenly across installments
    Fixed(Money),
    /// no interest
    None,
}

impl InterestSpec {
    pub fn is_none(&self) -> bool {
        matches!(self, InterestSpec::None)
    }

    /// whether a positive value is present that a schedule can be built from
    pub fn is_schedulable(&self) -> bool {
        match self {
            InterestSpec::Percentage(rate) => rate.is_positive(),
            InterestSpec::Fixed(amount) => amount.is_positive(),
            InterestSpec::None => false,
        }
    }
}

/// repayment periodicity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Periodicity {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    /// no fixed cadence; stepped like Monthly when a schedule exists
    FreeForm,
}

impl Periodicity {
    /// due date of installment `sequence`, one period per step after `start`
    pub fn due_date(&self, start: NaiveDate, sequence: u32) -> NaiveDate {
        match self {
            Periodicity::Daily => start + Duration::days(sequence as i64),
            Periodicity::Weekly => start + Duration::days(sequence as i64 * 7),
            Periodicity::Biweekly => start + Duration::days(sequence as i64 * 15),
            Periodicity::Monthly | Periodicity::FreeForm => start + Months::new(sequence),
        }
    }
}

use rust_decimal::Decimal;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{InstallmentId, LoanId, MemberId};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("installment count is required for scheduled loans")]
    MissingInstallmentCount,

    #[error("invalid installment count: {count}")]
    InvalidInstallmentCount {
        count: u32,
    },

    #[error("interest value must be positive: {value}")]
    InvalidInterestValue {
        value: Decimal,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("payment split does not sum to amount: capital {capital} + interest {interest} != {amount}")]
    SplitMismatch {
        amount: Money,
        capital: Money,
        interest: Money,
    },

    #[error("negative payment portion: capital {capital}, interest {interest}")]
    NegativePortion {
        capital: Money,
        interest: Money,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("member not found: {id}")]
    MemberNotFound {
        id: MemberId,
    },

    #[error("installment not found: {id}")]
    InstallmentNotFound {
        id: InstallmentId,
    },

    #[error("loan already settled: {id}")]
    AlreadySettled {
        id: LoanId,
    },

    #[error("loan {id} has {count} recorded payments and cannot be deleted")]
    PaymentsRecorded {
        id: LoanId,
        count: usize,
    },

    #[error("invalid reporting period: month {month}, year {year}")]
    InvalidPeriod {
        month: u32,
        year: i32,
    },

    #[error("concurrent modification: {message}")]
    Conflict {
        message: String,
    },

    #[error("storage failure: {message}")]
    Storage {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

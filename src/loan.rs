use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{InterestSpec, LoanId, LoanStatus, MemberId, Periodicity};

/// validated loan terms
///
/// The engine only ever receives terms through this struct; boundary layers
/// are expected to have mapped raw request bodies into it before calling in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub interest: InterestSpec,
    /// required and positive unless the loan is free-form
    pub installment_count: Option<u32>,
    pub origination_date: NaiveDate,
    pub periodicity: Periodicity,
    pub is_free_form: bool,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LedgerError::InvalidPrincipal {
                amount: self.principal,
            });
        }

        if !self.is_free_form {
            match self.installment_count {
                None => return Err(LedgerError::MissingInstallmentCount),
                Some(0) => return Err(LedgerError::InvalidInstallmentCount { count: 0 }),
                Some(_) => {}
            }
        }

        match self.interest {
            InterestSpec::Percentage(rate) if !rate.is_positive() => {
                Err(LedgerError::InvalidInterestValue {
                    value: rate.as_decimal(),
                })
            }
            InterestSpec::Fixed(amount) if !amount.is_positive() => {
                Err(LedgerError::InvalidInterestValue {
                    value: amount.as_decimal(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// a credit extended to a member under fixed terms
///
/// Status is the only field the ledger mutates after origination, besides
/// the accrued-interest balance written by the accrual job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub member_id: MemberId,
    pub principal: Money,
    pub interest: InterestSpec,
    pub installment_count: Option<u32>,
    pub origination_date: NaiveDate,
    pub periodicity: Periodicity,
    pub is_free_form: bool,
    pub status: LoanStatus,
    /// running interest balance incremented by the accrual job
    pub accrued_interest_balance: Money,
}

impl Loan {
    /// create a loan from validated terms
    pub fn originate(member_id: MemberId, terms: LoanTerms) -> Result<Self> {
        terms.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            member_id,
            principal: terms.principal,
            interest: terms.interest,
            installment_count: terms.installment_count,
            origination_date: terms.origination_date,
            periodicity: terms.periodicity,
            is_free_form: terms.is_free_form,
            status: LoanStatus::Active,
            accrued_interest_balance: Money::ZERO,
        })
    }

    pub fn is_settled(&self) -> bool {
        self.status == LoanStatus::Paid
    }

    /// Active -> Paid, the only transition; returns whether this call
    /// performed the flip
    pub fn settle(&mut self) -> bool {
        if self.status == LoanStatus::Paid {
            return false;
        }
        self.status = LoanStatus::Paid;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;

    fn base_terms() -> LoanTerms {
        LoanTerms {
            principal: Money::from_major(1200),
            interest: InterestSpec::Percentage(Rate::from_percentage(5)),
            installment_count: Some(12),
            origination_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            periodicity: Periodicity::Monthly,
            is_free_form: false,
        }
    }

    #[test]
    fn test_valid_terms() {
        assert!(base_terms().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_principal() {
        let mut terms = base_terms();
        terms.principal = Money::ZERO;
        assert!(matches!(
            terms.validate(),
            Err(LedgerError::InvalidPrincipal { .. })
        ));
    }

    #[test]
    fn test_requires_count_unless_free_form() {
        let mut terms = base_terms();
        terms.installment_count = None;
        assert!(matches!(
            terms.validate(),
            Err(LedgerError::MissingInstallmentCount)
        ));

        terms.installment_count = Some(0);
        assert!(matches!(
            terms.validate(),
            Err(LedgerError::InvalidInstallmentCount { count: 0 })
        ));

        terms.installment_count = None;
        terms.is_free_form = true;
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_requires_positive_interest_value() {
        let mut terms = base_terms();
        terms.interest = InterestSpec::Percentage(Rate::ZERO);
        assert!(matches!(
            terms.validate(),
            Err(LedgerError::InvalidInterestValue { .. })
        ));

        terms.interest = InterestSpec::Fixed(Money::ZERO);
        assert!(terms.validate().is_err());

        // kind None needs no value
        terms.interest = InterestSpec::None;
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_settle_is_monotonic() {
        let mut loan = Loan::originate(Uuid::new_v4(), base_terms()).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);

        assert!(loan.settle());
        assert_eq!(loan.status, LoanStatus::Paid);

        // second call reports no transition
        assert!(!loan.settle());
        assert_eq!(loan.status, LoanStatus::Paid);
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{InstallmentId, InstallmentStatus, InterestSpec, LoanId, Periodicity};

/// one scheduled capital+interest obligation within a loan's plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    /// 1-based, unique per loan, ascending with the due date
    pub sequence: u32,
    pub due_date: NaiveDate,
    pub capital: Money,
    pub interest: Money,
    pub amount: Money,
    pub status: InstallmentStatus,
}

/// fixed-capital amortization plan
///
/// The capital portion is constant per installment and interest is computed
/// on the declining balance; any rounding residue is folded into the final
/// installment so the capital portions sum to the principal exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub loan_id: LoanId,
    pub principal: Money,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_amount: Money,
}

impl PaymentPlan {
    /// generate the installment plan for a loan's terms
    ///
    /// Returns an empty plan when the count is absent or zero, when the
    /// interest value is not positive, or when the interest kind is None.
    /// A zero-interest loan with a valid count deliberately yields no
    /// schedule (see DESIGN.md).
    pub fn generate(
        loan_id: LoanId,
        principal: Money,
        interest: InterestSpec,
        installment_count: Option<u32>,
        start_date: NaiveDate,
        periodicity: Periodicity,
    ) -> Self {
        let count = match installment_count {
            Some(n) if n > 0 => n,
            _ => return Self::empty(loan_id, principal),
        };

        if !interest.is_schedulable() {
            return Self::empty(loan_id, principal);
        }

        let capital_per_installment = principal / Decimal::from(count);
        let mut balance = principal;
        let mut installments = Vec::with_capacity(count as usize);

        for sequence in 1..=count {
            // interest on the balance before this installment's capital
            let interest_portion = match interest {
                InterestSpec::Percentage(rate) => balance * rate.as_decimal(),
                InterestSpec::Fixed(total) => total / Decimal::from(count),
                InterestSpec::None => Money::ZERO,
            };

            let mut capital_portion = capital_per_installment;
            balance -= capital_per_installment;

            // fold the rounding residue into the last installment and pin
            // the simulated balance to exactly zero
            if sequence == count {
                capital_portion += balance;
                balance = Money::ZERO;
            }

            installments.push(Installment {
                id: Uuid::new_v4(),
                loan_id,
                sequence,
                due_date: periodicity.due_date(start_date, sequence),
                capital: capital_portion,
                interest: interest_portion,
                amount: capital_portion + interest_portion,
                status: InstallmentStatus::Pending,
            });
        }

        let total_interest = installments
            .iter()
            .map(|i| i.interest)
            .fold(Money::ZERO, |acc, x| acc + x);

        let total_amount = installments
            .iter()
            .map(|i| i.amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Self {
            loan_id,
            principal,
            installments,
            total_interest,
            total_amount,
        }
    }

    /// plan with no installments (free-form loans, suppressed schedules)
    pub fn empty(loan_id: LoanId, principal: Money) -> Self {
        Self {
            loan_id,
            principal,
            installments: Vec::new(),
            total_interest: Money::ZERO,
            total_amount: Money::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// get installment by sequence number
    pub fn installment(&self, sequence: u32) -> Option<&Installment> {
        self.installments.get(sequence.checked_sub(1)? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sum_capital(plan: &PaymentPlan) -> Money {
        plan.installments
            .iter()
            .map(|i| i.capital)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    #[test]
    fn test_percentage_schedule_end_to_end() {
        let plan = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(1200),
            InterestSpec::Percentage(Rate::from_percentage(5)),
            Some(12),
            date(2024, 1, 15),
            Periodicity::Monthly,
        );

        assert_eq!(plan.installments.len(), 12);

        let first = plan.installment(1).unwrap();
        assert_eq!(first.capital, Money::from_major(100));
        assert_eq!(first.interest, Money::from_major(60)); // 5% of 1200
        assert_eq!(first.amount, Money::from_major(160));
        assert_eq!(first.due_date, date(2024, 2, 15));
        assert_eq!(first.status, InstallmentStatus::Pending);

        let last = plan.installment(12).unwrap();
        assert_eq!(last.capital, Money::from_major(100));
        assert_eq!(last.interest, Money::from_major(5)); // 5% of remaining 100
        assert_eq!(last.amount, Money::from_major(105));
        assert_eq!(last.due_date, date(2025, 1, 15));

        assert_eq!(sum_capital(&plan), Money::from_major(1200));
    }

    #[test]
    fn test_interest_declines_with_balance() {
        let plan = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(1000),
            InterestSpec::Percentage(Rate::from_percentage(10)),
            Some(10),
            date(2024, 3, 1),
            Periodicity::Monthly,
        );

        for pair in plan.installments.windows(2) {
            assert!(pair[1].interest < pair[0].interest);
        }

        // balance before installment i is principal - (i-1) * capital
        let fifth = plan.installment(5).unwrap();
        assert_eq!(fifth.interest, Money::from_decimal(dec!(60))); // 10% of 600
    }

    #[test]
    fn test_fixed_interest_amortized_evenly() {
        let plan = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(900),
            InterestSpec::Fixed(Money::from_major(90)),
            Some(9),
            date(2024, 1, 1),
            Periodicity::Monthly,
        );

        for installment in &plan.installments {
            assert_eq!(installment.capital, Money::from_major(100));
            assert_eq!(installment.interest, Money::from_major(10));
            assert_eq!(installment.amount, Money::from_major(110));
        }

        assert_eq!(plan.total_interest, Money::from_major(90));
    }

    #[test]
    fn test_residue_folded_into_last_installment() {
        // 1000 / 3 does not divide evenly at 8 decimal places
        let plan = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(1000),
            InterestSpec::Percentage(Rate::from_percentage(2)),
            Some(3),
            date(2024, 1, 1),
            Periodicity::Monthly,
        );

        let per = Money::from_major(1000) / dec!(3);
        assert_eq!(plan.installment(1).unwrap().capital, per);
        assert_eq!(plan.installment(2).unwrap().capital, per);
        assert_ne!(plan.installment(3).unwrap().capital, per);

        // exact after folding
        assert_eq!(sum_capital(&plan), Money::from_major(1000));
    }

    #[test]
    fn test_empty_when_count_missing_or_zero() {
        let interest = InterestSpec::Percentage(Rate::from_percentage(5));
        let start = date(2024, 1, 1);

        let no_count = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(500),
            interest,
            None,
            start,
            Periodicity::Monthly,
        );
        assert!(no_count.is_empty());

        let zero_count = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(500),
            interest,
            Some(0),
            start,
            Periodicity::Monthly,
        );
        assert!(zero_count.is_empty());
    }

    #[test]
    fn test_empty_when_interest_not_schedulable() {
        let start = date(2024, 1, 1);

        // zero rate suppresses the schedule even with a valid count
        let zero_rate = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(500),
            InterestSpec::Percentage(Rate::ZERO),
            Some(5),
            start,
            Periodicity::Monthly,
        );
        assert!(zero_rate.is_empty());

        let no_interest = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(500),
            InterestSpec::None,
            Some(5),
            start,
            Periodicity::Monthly,
        );
        assert!(no_interest.is_empty());
    }

    #[test]
    fn test_due_dates_per_periodicity() {
        let start = date(2024, 1, 10);
        let interest = InterestSpec::Percentage(Rate::from_percentage(3));

        let daily = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(300),
            interest,
            Some(3),
            start,
            Periodicity::Daily,
        );
        assert_eq!(daily.installment(1).unwrap().due_date, date(2024, 1, 11));
        assert_eq!(daily.installment(3).unwrap().due_date, date(2024, 1, 13));

        let weekly = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(300),
            interest,
            Some(2),
            start,
            Periodicity::Weekly,
        );
        assert_eq!(weekly.installment(2).unwrap().due_date, date(2024, 1, 24));

        let biweekly = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(300),
            interest,
            Some(2),
            start,
            Periodicity::Biweekly,
        );
        assert_eq!(biweekly.installment(1).unwrap().due_date, date(2024, 1, 25));
        assert_eq!(biweekly.installment(2).unwrap().due_date, date(2024, 2, 9));

        // free-form with a count steps like monthly
        let free_form = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(300),
            interest,
            Some(2),
            start,
            Periodicity::FreeForm,
        );
        assert_eq!(free_form.installment(1).unwrap().due_date, date(2024, 2, 10));

        for plan in [daily, weekly, biweekly, free_form] {
            for pair in plan.installments.windows(2) {
                assert!(pair[1].due_date > pair[0].due_date);
            }
        }
    }

    #[test]
    fn test_plan_serde_round_trip() {
        let plan = PaymentPlan::generate(
            Uuid::new_v4(),
            Money::from_major(1200),
            InterestSpec::Percentage(Rate::from_percentage(5)),
            Some(12),
            date(2024, 1, 15),
            Periodicity::Monthly,
        );

        let json = serde_json::to_string(&plan).unwrap();
        let restored: PaymentPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, plan);
    }
}

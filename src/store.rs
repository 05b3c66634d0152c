use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ledger::Payment;
use crate::loan::Loan;
use crate::member::Member;
use crate::schedule::Installment;
use crate::types::{LoanId, MemberId};

/// a loan row together with the payments and installments it owns
#[derive(Debug, Clone)]
pub struct LoanRecord {
    pub loan: Loan,
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
}

impl LoanRecord {
    pub fn new(loan: Loan, installments: Vec<Installment>) -> Self {
        Self {
            loan,
            installments,
            payments: Vec::new(),
        }
    }

    /// capital recovered so far, re-aggregated from the payment rows
    pub fn recovered_capital(&self) -> Money {
        self.payments
            .iter()
            .map(|p| p.capital)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// principal minus recovered capital, floored at zero
    pub fn outstanding_capital(&self) -> Money {
        (self.loan.principal - self.recovered_capital()).max(Money::ZERO)
    }
}

/// persistence boundary for the engine
///
/// `with_loan` is the transactional primitive: the closure runs under the
/// loan's row lock and its mutations become visible only if it returns
/// `Ok`; an `Err` leaves the record untouched. Implementations backed by
/// optimistic stores may return `Conflict`, which the engine retries a
/// bounded number of times.
pub trait LedgerStore: Send + Sync {
    fn insert_member(&self, member: Member) -> Result<()>;

    fn member(&self, id: MemberId) -> Result<Member>;

    /// persist a loan together with its installments
    fn insert_loan(&self, record: LoanRecord) -> Result<()>;

    fn loan_ids(&self) -> Vec<LoanId>;

    /// serialized read-modify-write against one loan's record
    fn with_loan<T, F>(&self, id: LoanId, f: F) -> Result<T>
    where
        F: FnOnce(&mut LoanRecord) -> Result<T>;

    /// read-only snapshot under the same row lock
    fn read_loan<T, F>(&self, id: LoanId, f: F) -> Result<T>
    where
        F: FnOnce(&LoanRecord) -> T;

    /// delete a loan; rejected while payments exist
    fn remove_loan(&self, id: LoanId) -> Result<()>;
}

/// in-memory store with per-loan row locks
///
/// Operations on different loans proceed in parallel; operations on the
/// same loan serialize on its mutex.
#[derive(Default)]
pub struct MemoryStore {
    members: RwLock<HashMap<MemberId, Member>>,
    loans: RwLock<HashMap<LoanId, Arc<Mutex<LoanRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: LoanId) -> Result<Arc<Mutex<LoanRecord>>> {
        self.loans
            .read()
            .get(&id)
            .cloned()
            .ok_or(LedgerError::LoanNotFound { id })
    }
}

impl LedgerStore for MemoryStore {
    fn insert_member(&self, member: Member) -> Result<()> {
        self.members.write().insert(member.id, member);
        Ok(())
    }

    fn member(&self, id: MemberId) -> Result<Member> {
        self.members
            .read()
            .get(&id)
            .cloned()
            .ok_or(LedgerError::MemberNotFound { id })
    }

    fn insert_loan(&self, record: LoanRecord) -> Result<()> {
        let mut loans = self.loans.write();
        let id = record.loan.id;
        if loans.contains_key(&id) {
            return Err(LedgerError::Storage {
                message: format!("duplicate loan id: {id}"),
            });
        }
        loans.insert(id, Arc::new(Mutex::new(record)));
        Ok(())
    }

    fn loan_ids(&self) -> Vec<LoanId> {
        self.loans.read().keys().copied().collect()
    }

    fn with_loan<T, F>(&self, id: LoanId, f: F) -> Result<T>
    where
        F: FnOnce(&mut LoanRecord) -> Result<T>,
    {
        let slot = self.slot(id)?;
        let mut guard = slot.lock();

        // work on a copy and commit only on success, so a failed closure
        // never leaves partial state behind
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }

    fn read_loan<T, F>(&self, id: LoanId, f: F) -> Result<T>
    where
        F: FnOnce(&LoanRecord) -> T,
    {
        let slot = self.slot(id)?;
        let guard = slot.lock();
        Ok(f(&guard))
    }

    fn remove_loan(&self, id: LoanId) -> Result<()> {
        // map write lock first, then the row lock: an in-flight payment
        // commits before the check or observes the loan already gone
        let mut loans = self.loans.write();
        let slot = loans
            .get(&id)
            .cloned()
            .ok_or(LedgerError::LoanNotFound { id })?;

        {
            let guard = slot.lock();
            if !guard.payments.is_empty() {
                return Err(LedgerError::PaymentsRecorded {
                    id,
                    count: guard.payments.len(),
                });
            }
        }

        loans.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::loan::LoanTerms;
    use crate::types::{InterestSpec, Periodicity};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample_record() -> LoanRecord {
        let terms = LoanTerms {
            principal: Money::from_major(600),
            interest: InterestSpec::Percentage(Rate::from_percentage(4)),
            installment_count: Some(6),
            origination_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            periodicity: Periodicity::Monthly,
            is_free_form: false,
        };
        let loan = Loan::originate(Uuid::new_v4(), terms).unwrap();
        LoanRecord::new(loan, Vec::new())
    }

    #[test]
    fn test_missing_loan() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let result = store.read_loan(id, |_| ());
        assert!(matches!(result, Err(LedgerError::LoanNotFound { .. })));
    }

    #[test]
    fn test_duplicate_loan_rejected() {
        let store = MemoryStore::new();
        let record = sample_record();

        store.insert_loan(record.clone()).unwrap();
        assert!(matches!(
            store.insert_loan(record),
            Err(LedgerError::Storage { .. })
        ));
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let store = MemoryStore::new();
        let record = sample_record();
        let id = record.loan.id;
        store.insert_loan(record).unwrap();

        let result: Result<()> = store.with_loan(id, |rec| {
            rec.loan.settle();
            Err(LedgerError::Storage {
                message: "simulated failure".to_string(),
            })
        });
        assert!(result.is_err());

        // the mutation before the failure is not observable
        let settled = store.read_loan(id, |rec| rec.loan.is_settled()).unwrap();
        assert!(!settled);
    }

    #[test]
    fn test_remove_blocked_by_payments() {
        let store = MemoryStore::new();
        let record = sample_record();
        let id = record.loan.id;
        let member_id = record.loan.member_id;
        store.insert_loan(record).unwrap();

        store
            .with_loan(id, |rec| {
                rec.payments.push(Payment {
                    id: Uuid::new_v4(),
                    loan_id: id,
                    member_id,
                    installment_id: None,
                    amount: Money::from_major(50),
                    payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    capital: Money::from_major(50),
                    interest: Money::ZERO,
                });
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            store.remove_loan(id),
            Err(LedgerError::PaymentsRecorded { count: 1, .. })
        ));

        // still present
        assert!(store.read_loan(id, |_| ()).is_ok());
    }

    #[test]
    fn test_remove_without_payments() {
        let store = MemoryStore::new();
        let record = sample_record();
        let id = record.loan.id;
        store.insert_loan(record).unwrap();

        store.remove_loan(id).unwrap();
        assert!(matches!(
            store.read_loan(id, |_| ()),
            Err(LedgerError::LoanNotFound { .. })
        ));
    }
}

use std::sync::Arc;

use chrono::{Duration, Months, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::loan::{Loan, LoanTerms};
use crate::schedule::{Installment, PaymentPlan};
use crate::store::{LedgerStore, LoanRecord};
use crate::types::{InstallmentId, InstallmentStatus, LoanId, MemberId, PaymentId};

/// a recorded transfer from member to lender, split into capital and
/// interest portions; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub member_id: MemberId,
    pub installment_id: Option<InstallmentId>,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub capital: Money,
    pub interest: Money,
}

/// payment request
///
/// At most one of the two hints is normally given; when both are present
/// they must sum to the amount exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub capital_hint: Option<Money>,
    pub interest_hint: Option<Money>,
    pub installment_id: Option<InstallmentId>,
}

impl PaymentRequest {
    pub fn new(loan_id: LoanId, amount: Money, payment_date: NaiveDate) -> Self {
        Self {
            loan_id,
            amount,
            payment_date,
            capital_hint: None,
            interest_hint: None,
            installment_id: None,
        }
    }

    pub fn with_capital_hint(mut self, capital: Money) -> Self {
        self.capital_hint = Some(capital);
        self
    }

    pub fn with_interest_hint(mut self, interest: Money) -> Self {
        self.interest_hint = Some(interest);
        self
    }

    pub fn toward_installment(mut self, installment_id: InstallmentId) -> Self {
        self.installment_id = Some(installment_id);
        self
    }

    /// infer the capital/interest split from the hints
    fn resolve_split(&self) -> Result<(Money, Money)> {
        let (capital, interest) = match (self.capital_hint, self.interest_hint) {
            (None, None) => (self.amount, Money::ZERO),
            (Some(capital), None) => (capital, self.amount - capital),
            (None, Some(interest)) => (self.amount - interest, interest),
            (Some(capital), Some(interest)) => {
                if capital + interest != self.amount {
                    return Err(LedgerError::SplitMismatch {
                        amount: self.amount,
                        capital,
                        interest,
                    });
                }
                (capital, interest)
            }
        };

        if capital.is_negative() || interest.is_negative() {
            return Err(LedgerError::NegativePortion { capital, interest });
        }

        Ok((capital, interest))
    }
}

/// result of recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub outstanding_capital: Money,
    pub status_changed_to_paid: bool,
}

/// query for collectible installments in a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueInstallmentQuery {
    pub loan_id: Option<LoanId>,
    pub month: u32,
    pub year: i32,
    pub exclude_settled_loans: bool,
    pub exclude_paid_installments: bool,
}

impl DueInstallmentQuery {
    pub fn for_month(month: u32, year: i32) -> Self {
        Self {
            loan_id: None,
            month,
            year,
            exclude_settled_loans: true,
            exclude_paid_installments: true,
        }
    }

    pub fn for_loan(mut self, loan_id: LoanId) -> Self {
        self.loan_id = Some(loan_id);
        self
    }
}

struct RecordedPayment {
    payment: Payment,
    outstanding_capital: Money,
    status_changed: bool,
    recovered_capital: Money,
    settled_installment: Option<(InstallmentId, u32)>,
}

/// stateful, transactional payment engine
///
/// All mutation of a loan's aggregate state (recovered capital, status)
/// goes through `record_payment`, serialized per loan by the store's row
/// lock.
pub struct PaymentLedger<S> {
    store: Arc<S>,
    config: LedgerConfig,
    events: Mutex<EventStore>,
}

impl<S: LedgerStore> PaymentLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            events: Mutex::new(EventStore::new()),
        }
    }

    /// originate a loan: validate terms, generate the installment plan,
    /// and persist loan and installments together
    pub fn originate(&self, member_id: MemberId, terms: LoanTerms) -> Result<Loan> {
        terms.validate()?;
        let member = self.store.member(member_id)?;

        let loan = Loan::originate(member.id, terms)?;
        let plan = if loan.is_free_form {
            PaymentPlan::empty(loan.id, loan.principal)
        } else {
            PaymentPlan::generate(
                loan.id,
                loan.principal,
                loan.interest,
                loan.installment_count,
                loan.origination_date,
                loan.periodicity,
            )
        };

        let installments = plan.installments.len() as u32;
        self.store
            .insert_loan(LoanRecord::new(loan.clone(), plan.installments))?;

        tracing::info!(
            "originated loan {} for member {} ({} installments)",
            loan.id,
            member.id,
            installments
        );

        self.events.lock().emit(Event::LoanOriginated {
            loan_id: loan.id,
            member_id: member.id,
            principal: loan.principal,
            installments,
        });

        Ok(loan)
    }

    /// record a payment against a loan as one atomic unit
    pub fn record_payment(
        &self,
        request: PaymentRequest,
        time: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        if !request.amount.is_positive() {
            return Err(LedgerError::InvalidPaymentAmount {
                amount: request.amount,
            });
        }
        let (capital, interest) = request.resolve_split()?;

        let mut attempts = 0;
        let outcome = loop {
            let result = self.store.with_loan(request.loan_id, |rec| {
                Self::apply_payment(rec, &request, capital, interest)
            });

            match result {
                Err(LedgerError::Conflict { .. }) if attempts < self.config.conflict_retries => {
                    attempts += 1;
                    tracing::debug!(
                        "retrying conflicting payment on loan {} (attempt {})",
                        request.loan_id,
                        attempts
                    );
                }
                other => break other?,
            }
        };

        let now = time.now();
        let mut events = self.events.lock();
        events.emit(Event::PaymentReceived {
            loan_id: outcome.payment.loan_id,
            payment_id: outcome.payment.id,
            amount: outcome.payment.amount,
            capital: outcome.payment.capital,
            interest: outcome.payment.interest,
            timestamp: now,
        });
        if let Some((installment_id, sequence)) = outcome.settled_installment {
            events.emit(Event::InstallmentSettled {
                loan_id: outcome.payment.loan_id,
                installment_id,
                sequence,
                timestamp: now,
            });
        }
        if outcome.status_changed {
            events.emit(Event::LoanSettled {
                loan_id: outcome.payment.loan_id,
                recovered_capital: outcome.recovered_capital,
                timestamp: now,
            });
            tracing::info!("loan {} settled", outcome.payment.loan_id);
        }
        drop(events);

        tracing::debug!(
            "recorded payment {} against loan {}: amount {}, outstanding {}",
            outcome.payment.id,
            outcome.payment.loan_id,
            outcome.payment.amount,
            outcome.outstanding_capital
        );

        Ok(PaymentReceipt {
            payment: outcome.payment,
            outstanding_capital: outcome.outstanding_capital,
            status_changed_to_paid: outcome.status_changed,
        })
    }

    fn apply_payment(
        rec: &mut LoanRecord,
        request: &PaymentRequest,
        capital: Money,
        interest: Money,
    ) -> Result<RecordedPayment> {
        if rec.loan.is_settled() {
            return Err(LedgerError::AlreadySettled { id: rec.loan.id });
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            loan_id: rec.loan.id,
            member_id: rec.loan.member_id,
            installment_id: request.installment_id,
            amount: request.amount,
            payment_date: request.payment_date,
            capital,
            interest,
        };

        let mut settled_installment = None;
        if let Some(installment_id) = request.installment_id {
            let covered_before = rec
                .payments
                .iter()
                .filter(|p| p.installment_id == Some(installment_id))
                .map(|p| p.amount)
                .fold(Money::ZERO, |acc, x| acc + x);

            let installment = rec
                .installments
                .iter_mut()
                .find(|i| i.id == installment_id)
                .ok_or(LedgerError::InstallmentNotFound { id: installment_id })?;

            // the installment flips once the payments referencing it cover
            // its amount; partial payments are recorded without flipping
            if installment.status == InstallmentStatus::Pending
                && covered_before + request.amount >= installment.amount
            {
                installment.status = InstallmentStatus::Paid;
                settled_installment = Some((installment.id, installment.sequence));
            }
        }

        rec.payments.push(payment.clone());

        let recovered_capital = rec.recovered_capital();
        let status_changed = recovered_capital >= rec.loan.principal && rec.loan.settle();
        let outstanding_capital = rec.outstanding_capital();

        Ok(RecordedPayment {
            payment,
            outstanding_capital,
            status_changed,
            recovered_capital,
            settled_installment,
        })
    }

    /// principal minus recovered capital
    pub fn outstanding_capital(&self, loan_id: LoanId) -> Result<Money> {
        self.store.read_loan(loan_id, |rec| rec.outstanding_capital())
    }

    /// capital recovered via payments to date
    pub fn recovered_capital(&self, loan_id: LoanId) -> Result<Money> {
        self.store.read_loan(loan_id, |rec| rec.recovered_capital())
    }

    /// a loan's payments, newest first
    pub fn payments(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        let mut payments = self.store.read_loan(loan_id, |rec| rec.payments.clone())?;
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }

    /// collectible installments due within a calendar month, ascending by
    /// due date
    pub fn list_due_installments(&self, query: DueInstallmentQuery) -> Result<Vec<Installment>> {
        let first_day = NaiveDate::from_ymd_opt(query.year, query.month, 1).ok_or(
            LedgerError::InvalidPeriod {
                month: query.month,
                year: query.year,
            },
        )?;
        let last_day = first_day + Months::new(1) - Duration::days(1);

        let ids = match query.loan_id {
            Some(id) => vec![id],
            None => self.store.loan_ids(),
        };

        let mut due = Vec::new();
        for id in ids {
            let result = self.store.read_loan(id, |rec| {
                if query.exclude_settled_loans && rec.loan.is_settled() {
                    return Vec::new();
                }
                rec.installments
                    .iter()
                    .filter(|i| i.due_date >= first_day && i.due_date <= last_day)
                    .filter(|i| {
                        !query.exclude_paid_installments || i.status == InstallmentStatus::Pending
                    })
                    .cloned()
                    .collect()
            });

            match result {
                Ok(installments) => due.extend(installments),
                // a loan removed between enumeration and read is skipped,
                // but an explicitly requested loan must exist
                Err(LedgerError::LoanNotFound { .. }) if query.loan_id.is_none() => {}
                Err(e) => return Err(e),
            }
        }

        due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.sequence.cmp(&b.sequence)));
        Ok(due)
    }

    /// whether the loan can be deleted (no recorded payments)
    pub fn can_delete_loan(&self, loan_id: LoanId) -> Result<bool> {
        self.store.read_loan(loan_id, |rec| rec.payments.is_empty())
    }

    /// delete a loan; rejected while payments exist
    pub fn delete_loan(&self, loan_id: LoanId) -> Result<()> {
        self.store.remove_loan(loan_id)?;
        tracing::info!("deleted loan {}", loan_id);
        Ok(())
    }

    /// drain the events collected so far
    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }
}

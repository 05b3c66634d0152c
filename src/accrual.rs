use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use parking_lot::Mutex;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::store::LedgerStore;
use crate::types::InterestSpec;

/// periodic interest accrual over the active loan book
///
/// Each pass increments the accrued-interest balance of every active
/// percentage-rate loan by outstanding capital times the rate. The
/// invocation cadence belongs to an external scheduler; each loan is
/// visited under the same row lock the payment ledger uses, so a pass
/// never interleaves with an in-flight payment on the same loan.
pub struct InterestAccrualJob<S> {
    store: Arc<S>,
    events: Mutex<EventStore>,
}

impl<S: LedgerStore> InterestAccrualJob<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            events: Mutex::new(EventStore::new()),
        }
    }

    /// run one accrual pass; returns the number of loans updated
    pub fn accrue(&self, time: &SafeTimeProvider) -> Result<u32> {
        let now = time.now();
        let mut updated = 0;

        for loan_id in self.store.loan_ids() {
            let result = self.store.with_loan(loan_id, |rec| {
                let rate = match rec.loan.interest {
                    InterestSpec::Percentage(rate) if rate.is_positive() => rate,
                    _ => return Ok(None),
                };

                if rec.loan.is_settled() {
                    return Ok(None);
                }

                let outstanding = rec.outstanding_capital();
                if !outstanding.is_positive() {
                    return Ok(None);
                }

                let amount: Money = outstanding * rate.as_decimal();
                rec.loan.accrued_interest_balance += amount;
                Ok(Some((amount, outstanding)))
            });

            match result {
                Ok(Some((amount, outstanding))) => {
                    updated += 1;
                    self.events.lock().emit(Event::InterestAccrued {
                        loan_id,
                        amount,
                        outstanding_capital: outstanding,
                        timestamp: now,
                    });
                }
                Ok(None) => {}
                // a loan deleted between enumeration and visit is skipped
                Err(LedgerError::LoanNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::info!("interest accrual pass updated {} loans", updated);
        Ok(updated)
    }

    /// drain the events collected so far
    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }
}

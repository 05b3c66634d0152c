use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentId, LoanId, MemberId, PaymentId};

/// all events the engine emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LoanOriginated {
        loan_id: LoanId,
        member_id: MemberId,
        principal: Money,
        installments: u32,
    },

    PaymentReceived {
        loan_id: LoanId,
        payment_id: PaymentId,
        amount: Money,
        capital: Money,
        interest: Money,
        timestamp: DateTime<Utc>,
    },

    InstallmentSettled {
        loan_id: LoanId,
        installment_id: InstallmentId,
        sequence: u32,
        timestamp: DateTime<Utc>,
    },

    LoanSettled {
        loan_id: LoanId,
        recovered_capital: Money,
        timestamp: DateTime<Utc>,
    },

    InterestAccrued {
        loan_id: LoanId,
        amount: Money,
        outstanding_capital: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

pub mod accrual;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod member;
pub mod schedule;
pub mod store;
pub mod types;

// re-export key types
pub use accrual::InterestAccrualJob;
pub use config::LedgerConfig;
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use ledger::{
    DueInstallmentQuery, Payment, PaymentLedger, PaymentReceipt, PaymentRequest,
};
pub use loan::{Loan, LoanTerms};
pub use member::Member;
pub use schedule::{Installment, PaymentPlan};
pub use store::{LedgerStore, LoanRecord, MemoryStore};
pub use types::{
    InstallmentId, InstallmentStatus, InterestSpec, LoanId, LoanStatus, MemberId, PaymentId,
    Periodicity,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

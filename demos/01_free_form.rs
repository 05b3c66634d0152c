/// free-form loan - no schedule, every payment reduces capital directly
use std::sync::Arc;

use loan_ledger_rs::chrono::NaiveDate;
use loan_ledger_rs::{
    InterestSpec, LedgerStore, LoanTerms, Member, MemoryStore, Money, PaymentLedger,
    PaymentRequest, Periodicity, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let ledger = PaymentLedger::new(store.clone());
    let time = SafeTimeProvider::new(TimeSource::System);

    let member = Member::new("Luis Peña", "002-0098765-1");
    let member_id = member.id;
    store.insert_member(member)?;

    let loan = ledger.originate(
        member_id,
        LoanTerms {
            principal: Money::from_major(500),
            interest: InterestSpec::None,
            installment_count: None,
            origination_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            periodicity: Periodicity::FreeForm,
            is_free_form: true,
        },
    )?;

    for (amount, day) in [(200, 1), (200, 15), (100, 28)] {
        let receipt = ledger.record_payment(
            PaymentRequest::new(
                loan.id,
                Money::from_major(amount),
                NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            ),
            &time,
        )?;
        println!(
            "paid {:>4}  outstanding {:>4}  settled: {}",
            amount,
            receipt.outstanding_capital.to_string(),
            receipt.status_changed_to_paid,
        );
    }

    Ok(())
}

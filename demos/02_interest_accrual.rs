/// interest accrual - periodic passes over the active loan book
use std::sync::Arc;

use loan_ledger_rs::chrono::{NaiveDate, TimeZone, Utc};
use loan_ledger_rs::{
    InterestAccrualJob, InterestSpec, LedgerStore, LoanTerms, Member, MemoryStore, Money,
    PaymentLedger, PaymentRequest, Periodicity, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let ledger = PaymentLedger::new(store.clone());
    let job = InterestAccrualJob::new(store.clone());

    // test time source so the demo is reproducible
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    ));

    let member = Member::new("Rosa Díaz", "003-5551234-7");
    let member_id = member.id;
    store.insert_member(member)?;

    let loan = ledger.originate(
        member_id,
        LoanTerms {
            principal: Money::from_major(1_000),
            interest: InterestSpec::Percentage(Rate::from_percentage(5)),
            installment_count: None,
            origination_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            periodicity: Periodicity::FreeForm,
            is_free_form: true,
        },
    )?;

    // first accrual pass: 5% of the full principal
    let updated = job.accrue(&time)?;
    println!("pass 1: {} loan(s) accrued", updated);

    // a payment recovers part of the capital
    ledger.record_payment(
        PaymentRequest::new(
            loan.id,
            Money::from_major(600),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        ),
        &time,
    )?;

    // second pass accrues on the reduced balance
    let updated = job.accrue(&time)?;
    println!("pass 2: {} loan(s) accrued", updated);

    let snapshot = store.read_loan(loan.id, |rec| rec.loan.clone())?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

/// quick start - originate a loan, inspect its plan, pay it down
use std::sync::Arc;

use loan_ledger_rs::chrono::NaiveDate;
use loan_ledger_rs::{
    InterestSpec, LedgerStore, LoanTerms, Member, MemoryStore, Money, PaymentLedger,
    PaymentRequest, Periodicity, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let ledger = PaymentLedger::new(store.clone());
    let time = SafeTimeProvider::new(TimeSource::System);

    // register a member
    let member = Member::new("Ana Morales", "001-1402384-2");
    let member_id = member.id;
    store.insert_member(member)?;

    // a $1,200 loan at 5% per period over 12 monthly installments
    let loan = ledger.originate(
        member_id,
        LoanTerms {
            principal: Money::from_major(1_200),
            interest: InterestSpec::Percentage(Rate::from_percentage(5)),
            installment_count: Some(12),
            origination_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            periodicity: Periodicity::Monthly,
            is_free_form: false,
        },
    )?;

    println!("loan {} originated", loan.id);
    store.read_loan(loan.id, |rec| {
        for installment in &rec.installments {
            println!(
                "  #{:<2} due {}  capital {:>8}  interest {:>6}  amount {:>8}",
                installment.sequence,
                installment.due_date,
                installment.capital.to_string(),
                installment.interest.to_string(),
                installment.amount.to_string(),
            );
        }
    })?;

    // pay the first installment
    let first_id = store.read_loan(loan.id, |rec| rec.installments[0].id)?;
    let receipt = ledger.record_payment(
        PaymentRequest::new(
            loan.id,
            Money::from_major(160),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
        )
        .with_capital_hint(Money::from_major(100))
        .toward_installment(first_id),
        &time,
    )?;
    println!("outstanding after first installment: {}", receipt.outstanding_capital);

    // clear the remaining capital in one sweep
    let receipt = ledger.record_payment(
        PaymentRequest::new(
            loan.id,
            receipt.outstanding_capital,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        ),
        &time,
    )?;
    println!("settled: {}", receipt.status_changed_to_paid);

    Ok(())
}

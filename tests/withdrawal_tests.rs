mod common;

use common::engine;
use kiospay::error::PaymentError;
use kiospay::orchestrator::TxState;
use kiospay::transaction::Category;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_below_minimum_is_rejected_before_confirming() {
    let (mut orch, ledger) = engine(dec!(5_000_000));
    orch.begin(Category::Withdrawal).unwrap();
    orch.set_field("destination", "main").unwrap();
    orch.set_amount(dec!(5_000)).unwrap();

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidInput(_)));
    assert_eq!(orch.state(), TxState::Input);
    assert_eq!(ledger.balance().await, dec!(5_000_000));
}

#[tokio::test]
async fn test_over_balance_is_rejected_at_validation() {
    let (mut orch, ledger) = engine(dec!(5_000_000));
    orch.begin(Category::Withdrawal).unwrap();
    orch.set_field("destination", "main").unwrap();
    orch.set_amount(dec!(6_000_000)).unwrap();

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, PaymentError::InsufficientBalance { .. }));
    assert_eq!(orch.state(), TxState::Input);
    assert_eq!(ledger.balance().await, dec!(5_000_000));
}

#[tokio::test]
async fn test_bank_withdrawal_deducts_fixed_fee() {
    let (mut orch, ledger) = engine(dec!(5_000_000));
    orch.begin(Category::Withdrawal).unwrap();
    orch.set_field("destination", "bank").unwrap();
    orch.set_field("bank_name", "BCA").unwrap();
    orch.set_field("account_number", "1234567890").unwrap();
    orch.set_amount(dec!(100_000)).unwrap();

    let summary = orch.submit().await.unwrap();
    assert_eq!(summary.admin_fee, dec!(2_500));
    assert_eq!(summary.received, Some(dec!(97_500)));
    assert_eq!(summary.total, dec!(100_000));

    let receipt = orch.execute().await.unwrap();
    assert_eq!(receipt.received, Some(dec!(97_500)));
    assert_eq!(ledger.balance().await, dec!(4_900_000));
    // External transfer; the main balance is untouched.
    assert_eq!(ledger.main_balance().await, dec!(0));
}

#[tokio::test]
async fn test_main_balance_withdrawal_is_fee_free() {
    let (mut orch, ledger) = engine(dec!(5_000_000));
    orch.begin(Category::Withdrawal).unwrap();
    orch.set_field("destination", "main").unwrap();
    orch.set_amount(dec!(100_000)).unwrap();

    let summary = orch.submit().await.unwrap();
    assert_eq!(summary.admin_fee, dec!(0));
    assert_eq!(summary.received, Some(dec!(100_000)));

    orch.execute().await.unwrap();
    assert_eq!(ledger.balance().await, dec!(4_900_000));
    assert_eq!(ledger.main_balance().await, dec!(100_000));
}

#[tokio::test]
async fn test_bank_destination_requires_account_details() {
    let (mut orch, _ledger) = engine(dec!(5_000_000));
    orch.begin(Category::Withdrawal).unwrap();
    orch.set_field("destination", "bank").unwrap();
    orch.set_amount(dec!(100_000)).unwrap();

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidInput(_)));
    assert_eq!(orch.state(), TxState::Input);
}

#[tokio::test]
async fn test_missing_amount_is_rejected() {
    let (mut orch, _ledger) = engine(dec!(5_000_000));
    orch.begin(Category::Withdrawal).unwrap();
    orch.set_field("destination", "main").unwrap();

    let err = orch.submit().await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidInput(_)));
}

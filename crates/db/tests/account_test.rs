//! Integration tests for account listing, patching and soft delete.

mod common;

use common::{code, date, fixture};
use famledger_core::ledger::{AccountType, LedgerError};
use famledger_db::repositories::{
    AccountError, AccountRepository, CreateAccountInput, TransactionError, TransactionRepository,
    UpdateAccountInput,
};
use famledger_shared::types::AccountId;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_list_by_type_and_patch() {
    let Some(fx) = fixture().await else { return };
    let repo = AccountRepository::new(fx.db.clone());

    let savings = repo
        .create(CreateAccountInput {
            family_id: fx.family_id,
            name: "Rainy day".to_string(),
            account_type: AccountType::Savings,
            currency: code("EUR"),
            initial_balance: dec!(0),
        })
        .await
        .unwrap();

    let listed = repo.list_by_type(fx.family_id, AccountType::Savings).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, savings.id);

    let renamed = repo
        .update(
            fx.family_id,
            AccountId::from_uuid(savings.id),
            UpdateAccountInput {
                name: Some("Holiday fund".to_string()),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Holiday fund");
    assert!(renamed.is_active);

    let err = repo
        .update(
            fx.family_id,
            AccountId::from_uuid(savings.id),
            UpdateAccountInput {
                name: Some("   ".to_string()),
                ..UpdateAccountInput::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Validation(_)));
}

#[tokio::test]
async fn test_posting_to_deactivated_account_is_not_found() {
    let Some(fx) = fixture().await else { return };
    let accounts = AccountRepository::new(fx.db.clone());
    let transactions = TransactionRepository::new(fx.db.clone());

    accounts.soft_delete(fx.family_id, fx.account_id).await.unwrap();

    assert!(accounts.find_active(fx.family_id, fx.account_id).await.unwrap().is_none());
    assert!(accounts.find_any(fx.family_id, fx.account_id).await.unwrap().is_some());
    assert_eq!(accounts.list_active(fx.family_id).await.unwrap().len(), 0);
    assert_eq!(accounts.list_all(fx.family_id).await.unwrap().len(), 1);

    let err = transactions
        .create(fx.expense(dec!(10), &code("RSD"), date(2024, 1, 2)), fx.ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransactionError::Ledger(LedgerError::AccountNotFound(_))
    ));
}

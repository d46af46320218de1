//! Integration tests for report aggregation and derived balances.

mod common;

use common::{code, date, fixture, unique_code};
use famledger_core::ledger::TransactionType;
use famledger_core::period::DateRange;
use famledger_db::repositories::{AccountRepository, AggregationRepository, TransactionRepository};
use famledger_shared::types::{AccountId, TransactionId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_category_sums_reconcile_with_type_sums() {
    let Some(mut fx) = fixture().await else { return };
    let foreign = unique_code();
    fx.allow(&foreign);
    let repo = TransactionRepository::new(fx.db.clone());
    let rent = fx.add_expense_category("Rent").await;
    fx.set_rate(&foreign, &code("RSD"), dec!(117.25), date(2024, 1, 1)).await;

    repo.create(fx.expense(dec!(100), &code("RSD"), date(2024, 1, 5)), fx.ctx())
        .await
        .unwrap();
    repo.create(fx.expense(dec!(10), &foreign, date(2024, 1, 6)), fx.ctx())
        .await
        .unwrap();
    let mut rent_payment = fx.expense(dec!(500), &code("RSD"), date(2024, 1, 31));
    rent_payment.category_id = rent;
    repo.create(rent_payment, fx.ctx()).await.unwrap();
    repo.create(fx.income(dec!(2000), date(2024, 1, 1)), fx.ctx()).await.unwrap();
    // Outside the range.
    repo.create(fx.expense(dec!(999), &code("RSD"), date(2024, 2, 1)), fx.ctx())
        .await
        .unwrap();
    // Deleted.
    let gone = repo
        .create(fx.expense(dec!(777), &code("RSD"), date(2024, 1, 15)), fx.ctx())
        .await
        .unwrap();
    repo.delete(fx.family_id, TransactionId::from_uuid(gone.id), fx.user_id)
        .await
        .unwrap();

    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
    let agg = AggregationRepository::new(fx.db.clone());

    let by_category = agg
        .summary_by_category(fx.family_id, TransactionType::Expense, range)
        .await
        .unwrap();
    let by_type = agg.summary_by_type(fx.family_id, range).await.unwrap();

    let category_total: Decimal = by_category.iter().map(|c| c.total).sum();
    let category_count: i64 = by_category.iter().map(|c| c.count).sum();
    let expense = by_type
        .iter()
        .find(|t| t.transaction_type == TransactionType::Expense)
        .unwrap();
    let income = by_type
        .iter()
        .find(|t| t.transaction_type == TransactionType::Income)
        .unwrap();

    // 100 + 10 * 117.25 + 500
    assert_eq!(expense.total, dec!(1772.50));
    assert_eq!(expense.count, 3);
    assert_eq!(category_total, expense.total);
    assert_eq!(category_count, expense.count);
    assert_eq!(by_category.len(), 2);
    assert_eq!(income.total, dec!(2000.00));
}

#[tokio::test]
async fn test_empty_range_has_no_groups() {
    let Some(fx) = fixture().await else { return };
    let range = DateRange::new(date(2020, 1, 1), date(2020, 1, 31)).unwrap();
    let agg = AggregationRepository::new(fx.db.clone());

    assert!(agg.summary_by_type(fx.family_id, range).await.unwrap().is_empty());
    assert!(
        agg.summary_by_category(fx.family_id, TransactionType::Income, range)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_balance_is_derived_from_live_transactions() {
    let Some(fx) = fixture().await else { return };
    let repo = TransactionRepository::new(fx.db.clone());
    let accounts = AccountRepository::new(fx.db.clone());

    repo.create(fx.income(dec!(500), date(2024, 1, 1)), fx.ctx()).await.unwrap();
    repo.create(fx.expense(dec!(120.50), &code("RSD"), date(2024, 1, 9)), fx.ctx())
        .await
        .unwrap();
    let gone = repo
        .create(fx.expense(dec!(300), &code("RSD"), date(2024, 1, 20)), fx.ctx())
        .await
        .unwrap();
    repo.delete(fx.family_id, TransactionId::from_uuid(gone.id), fx.user_id)
        .await
        .unwrap();

    let with_balance = accounts.balance(fx.family_id, fx.account_id).await.unwrap();
    // 1000 initial + 500 - 120.50
    assert_eq!(with_balance.balance.current_balance, dec!(1379.50));
    assert_eq!(with_balance.balance.last_transaction_date, Some(date(2024, 1, 9)));

    let total = accounts.total_balance(fx.family_id).await.unwrap();
    assert_eq!(total, dec!(1379.50));

    let err = accounts
        .balance(fx.family_id, AccountId::new())
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}

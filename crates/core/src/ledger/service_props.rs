//! Property-based tests for LedgerService.

use chrono::{Duration, NaiveDate};
use famledger_shared::types::{AccountId, CategoryId, CurrencyCode, FamilyId, TransactionId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::service::{LedgerService, PostingRules};
use super::types::{
    AccountRef, CategoryRef, NewTransaction, TransactionPatch, TransactionSnapshot,
    TransactionStatus, TransactionType,
};
use crate::currency::{CurrencyAllowList, CurrencyService};

/// Positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Zero or negative amounts.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Positive rates (0.0001 to 1000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn transaction_type() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Income), Just(TransactionType::Expense)]
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

struct World {
    base: CurrencyCode,
    currencies: CurrencyAllowList,
    family_id: FamilyId,
    account: AccountRef,
}

impl World {
    fn new() -> Self {
        let family_id = FamilyId::new();
        Self {
            base: CurrencyCode::parse("RSD").unwrap(),
            currencies: CurrencyAllowList::new(["RSD", "EUR"]).unwrap(),
            family_id,
            account: AccountRef {
                id: AccountId::new(),
                family_id,
                is_active: true,
            },
        }
    }

    fn rules(&self) -> PostingRules<'_> {
        PostingRules {
            base_currency: &self.base,
            currencies: &self.currencies,
            today: today(),
        }
    }

    fn category(&self, category_type: TransactionType) -> CategoryRef {
        CategoryRef {
            id: CategoryId::new(),
            family_id: self.family_id,
            category_type,
        }
    }

    fn input(
        &self,
        category: &CategoryRef,
        transaction_type: TransactionType,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> NewTransaction {
        NewTransaction {
            family_id: self.family_id,
            account_id: self.account.id,
            category_id: category.id,
            transaction_type,
            amount,
            currency: CurrencyCode::parse(currency).unwrap(),
            description: None,
            transaction_date: date,
            actor: UserId::new(),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Base-currency postings keep amount_base == amount exactly.
    #[test]
    fn prop_base_currency_amount_base_equals_amount(
        amount in positive_amount(),
        ty in transaction_type(),
        days_back in 0i64..3650,
    ) {
        let world = World::new();
        let category = world.category(ty);
        let input = world.input(&category, ty, amount, "RSD", today() - Duration::days(days_back));

        let resolved = LedgerService::prepare_create(
            &input, &world.rules(), Some(&world.account), Some(&category), |_, _, _| None,
        ).unwrap();
        prop_assert_eq!(resolved.amount_base, amount);
    }

    /// Foreign postings use round(amount * k, 2).
    #[test]
    fn prop_foreign_amount_base_is_rounded_product(
        amount in positive_amount(),
        rate in positive_rate(),
        ty in transaction_type(),
    ) {
        let world = World::new();
        let category = world.category(ty);
        let input = world.input(&category, ty, amount, "EUR", today());

        let resolved = LedgerService::prepare_create(
            &input, &world.rules(), Some(&world.account), Some(&category), |_, _, _| Some(rate),
        ).unwrap();
        prop_assert_eq!(resolved.amount_base, CurrencyService::round(amount * rate, 2));
    }

    /// Non-positive amounts are always rejected first.
    #[test]
    fn prop_non_positive_amount_rejected(amount in non_positive_amount(), ty in transaction_type()) {
        let world = World::new();
        let category = world.category(ty);
        let input = world.input(&category, ty, amount, "RSD", today());

        let result = LedgerService::prepare_create(
            &input, &world.rules(), Some(&world.account), Some(&category), |_, _, _| None,
        );
        prop_assert!(matches!(result, Err(LedgerError::InvalidAmount)));
    }

    /// Any future date is rejected.
    #[test]
    fn prop_future_date_rejected(amount in positive_amount(), days_ahead in 1i64..3650) {
        let world = World::new();
        let category = world.category(TransactionType::Expense);
        let input = world.input(
            &category, TransactionType::Expense, amount, "RSD", today() + Duration::days(days_ahead),
        );

        let result = LedgerService::prepare_create(
            &input, &world.rules(), Some(&world.account), Some(&category), |_, _, _| None,
        );
        prop_assert!(matches!(result, Err(LedgerError::InvalidDate(_))), "expected InvalidDate");
    }

    /// Category type must equal transaction type.
    #[test]
    fn prop_category_type_must_match(amount in positive_amount(), ty in transaction_type()) {
        let world = World::new();
        let other = match ty {
            TransactionType::Income => TransactionType::Expense,
            TransactionType::Expense => TransactionType::Income,
        };
        let category = world.category(other);
        let input = world.input(&category, ty, amount, "RSD", today());

        let result = LedgerService::prepare_create(
            &input, &world.rules(), Some(&world.account), Some(&category), |_, _, _| None,
        );
        prop_assert!(matches!(result, Err(LedgerError::CategoryTypeMismatch { .. })), "expected CategoryTypeMismatch");
    }

    /// Updates always recompute amount_base from the merged inputs, so the
    /// result equals a fresh create with the same merged values.
    #[test]
    fn prop_update_matches_fresh_create(
        amount in positive_amount(),
        new_amount in proptest::option::of(positive_amount()),
        rate_a in positive_rate(),
        rate_b in positive_rate(),
        move_date in any::<bool>(),
    ) {
        let world = World::new();
        let category = world.category(TransactionType::Expense);
        let old_date = today() - Duration::days(30);
        let new_date = today() - Duration::days(1);
        let rate_on = |date: NaiveDate| if date >= new_date { rate_b } else { rate_a };

        let current = TransactionSnapshot {
            id: TransactionId::new(),
            family_id: world.family_id,
            account_id: world.account.id,
            category_id: category.id,
            transaction_type: TransactionType::Expense,
            amount,
            currency: CurrencyCode::parse("EUR").unwrap(),
            description: None,
            transaction_date: old_date,
            status: TransactionStatus::Active,
        };
        let patch = TransactionPatch {
            amount: new_amount,
            transaction_date: move_date.then_some(new_date),
            ..TransactionPatch::default()
        };

        let updated = LedgerService::prepare_update(
            &current, &patch, world.family_id, &world.rules(), None, |_, _, date| Some(rate_on(date)),
        ).unwrap();

        let effective_amount = new_amount.unwrap_or(amount);
        let effective_date = if move_date { new_date } else { old_date };
        prop_assert_eq!(
            updated.amount_base,
            CurrencyService::round(effective_amount * rate_on(effective_date), 2)
        );
    }
}

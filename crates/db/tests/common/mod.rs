//! Shared setup for database integration tests.
//!
//! Tests run against `DATABASE_URL` (or `FAMLEDGER__DATABASE__URL`) and are
//! skipped when neither is set. Each test creates its own family, so tests
//! can share one database and run in parallel.

#![allow(dead_code)]

use std::env;

use chrono::NaiveDate;
use famledger_core::currency::{CurrencyAllowList, ExchangeRate};
use famledger_core::ledger::{AccountType, NewTransaction, TransactionType};
use famledger_db::migration::{Migrator, MigratorTrait};
use famledger_db::repositories::{
    AccountRepository, CategoryRepository, CreateAccountInput, CreateCategoryInput,
    ExchangeRateRepository, FamilyRepository, MANUAL_SOURCE, PostingContext, UserRepository,
};
use famledger_shared::types::{AccountId, CategoryId, CurrencyCode, FamilyId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use uuid::Uuid;

const MIGRATION_LOCK_KEY: i64 = 7_311_042;

fn database_url() -> Option<String> {
    env::var("DATABASE_URL")
        .or_else(|_| env::var("FAMLEDGER__DATABASE__URL"))
        .ok()
}

/// Connects and migrates, or returns `None` when no database is configured.
pub async fn connect() -> Option<DatabaseConnection> {
    let Some(url) = database_url() else {
        eprintln!("skipping: DATABASE_URL / FAMLEDGER__DATABASE__URL not set");
        return None;
    };

    // Single connection so the advisory lock and the migration share a session.
    let mut options = ConnectOptions::new(url.clone());
    options.max_connections(1).min_connections(1);
    let migrate_conn = Database::connect(options).await.expect("connect for migration");
    migrate_conn
        .execute_unprepared(&format!("SELECT pg_advisory_lock({MIGRATION_LOCK_KEY})"))
        .await
        .expect("take migration lock");
    Migrator::up(&migrate_conn, None).await.expect("run migrations");
    migrate_conn
        .execute_unprepared(&format!("SELECT pg_advisory_unlock({MIGRATION_LOCK_KEY})"))
        .await
        .expect("release migration lock");
    migrate_conn.close().await.expect("close migration connection");

    Some(Database::connect(&url).await.expect("connect"))
}

/// Builds a currency code.
pub fn code(raw: &str) -> CurrencyCode {
    CurrencyCode::parse(raw).unwrap()
}

/// A random three-letter code, so rate rows from different tests don't meet.
pub fn unique_code() -> CurrencyCode {
    let letters: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(3)
        .map(|b| char::from(b'A' + b % 26))
        .collect();
    if letters == "RSD" || letters == "EUR" {
        return unique_code();
    }
    code(&letters)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A family with RSD base currency, one user, one account and one category
/// of each type.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub family_id: FamilyId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub expense_category: CategoryId,
    pub income_category: CategoryId,
    pub currencies: CurrencyAllowList,
    pub today: NaiveDate,
}

impl Fixture {
    /// Allows RSD, EUR and `extra`.
    pub fn allow(&mut self, extra: &CurrencyCode) {
        let mut codes: Vec<String> = self.currencies.codes().iter().map(ToString::to_string).collect();
        codes.push(extra.to_string());
        self.currencies = CurrencyAllowList::new(codes).unwrap();
    }

    pub fn ctx(&self) -> PostingContext<'_> {
        PostingContext {
            currencies: &self.currencies,
            today: self.today,
        }
    }

    pub fn expense(&self, amount: Decimal, currency: &CurrencyCode, on: NaiveDate) -> NewTransaction {
        NewTransaction {
            family_id: self.family_id,
            account_id: self.account_id,
            category_id: self.expense_category,
            transaction_type: TransactionType::Expense,
            amount,
            currency: currency.clone(),
            description: Some("test expense".to_string()),
            transaction_date: on,
            actor: self.user_id,
        }
    }

    pub fn income(&self, amount: Decimal, on: NaiveDate) -> NewTransaction {
        NewTransaction {
            category_id: self.income_category,
            transaction_type: TransactionType::Income,
            description: Some("test income".to_string()),
            ..self.expense(amount, &code("RSD"), on)
        }
    }

    pub async fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: Decimal, on: NaiveDate) {
        let rate = ExchangeRate::new(from.clone(), to.clone(), rate, on).unwrap();
        ExchangeRateRepository::new(self.db.clone())
            .upsert(&rate, MANUAL_SOURCE)
            .await
            .unwrap();
    }

    /// Adds another expense category to the family.
    pub async fn add_expense_category(&self, name: &str) -> CategoryId {
        let category = CategoryRepository::new(self.db.clone())
            .create(CreateCategoryInput {
                family_id: self.family_id,
                name: name.to_string(),
                category_type: TransactionType::Expense,
                parent_id: None,
            })
            .await
            .unwrap();
        CategoryId::from_uuid(category.id)
    }
}

/// Creates a fresh family fixture, or `None` when no database is configured.
pub async fn fixture() -> Option<Fixture> {
    let db = connect().await?;

    let family = FamilyRepository::new(db.clone())
        .create(&format!("Test family {}", Uuid::new_v4()), &code("RSD"))
        .await
        .unwrap();
    let family_id = FamilyId::from_uuid(family.id);

    let user = UserRepository::new(db.clone())
        .create(
            family_id,
            &format!("test-{}@example.com", Uuid::new_v4()),
            "not-a-real-hash",
            "Test User",
        )
        .await
        .unwrap();

    let account = AccountRepository::new(db.clone())
        .create(CreateAccountInput {
            family_id,
            name: "Wallet".to_string(),
            account_type: AccountType::Cash,
            currency: code("RSD"),
            initial_balance: dec!(1000.00),
        })
        .await
        .unwrap();

    let categories = CategoryRepository::new(db.clone());
    let expense = categories
        .create(CreateCategoryInput {
            family_id,
            name: "Food".to_string(),
            category_type: TransactionType::Expense,
            parent_id: None,
        })
        .await
        .unwrap();
    let income = categories
        .create(CreateCategoryInput {
            family_id,
            name: "Salary".to_string(),
            category_type: TransactionType::Income,
            parent_id: None,
        })
        .await
        .unwrap();

    Some(Fixture {
        db,
        family_id,
        user_id: UserId::from_uuid(user.id),
        account_id: AccountId::from_uuid(account.id),
        expense_category: CategoryId::from_uuid(expense.id),
        income_category: CategoryId::from_uuid(income.id),
        currencies: CurrencyAllowList::new(["RSD", "EUR"]).unwrap(),
        today: date(2024, 6, 15),
    })
}

//! Database seeder for FamLedger development and testing.
//!
//! Seeds a demo family with one user, a few accounts, a category tree and
//! 30 days of EUR/RSD rates. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Days, Utc};
use famledger_core::auth::hash_password;
use famledger_core::category::CategoryType;
use famledger_core::currency::ExchangeRate;
use famledger_core::ledger::AccountType;
use famledger_db::repositories::{
    AccountRepository, CategoryRepository, CreateAccountInput, CreateCategoryInput,
    ExchangeRateRepository, FamilyRepository, UserRepository,
};
use famledger_shared::AppConfig;
use famledger_shared::types::{CategoryId, CurrencyCode, FamilyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tracing::info;

const DEMO_EMAIL: &str = "demo@famledger.dev";
const DEMO_PASSWORD: &str = "demo1234";
const RATE_DAYS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seeder=info,famledger_db=info".into()),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = famledger_db::connect(&config.database.url).await?;
    info!("Connected to database");

    let users = UserRepository::new(db.clone());
    if users.find_by_email(DEMO_EMAIL).await?.is_some() {
        info!(email = DEMO_EMAIL, "Demo user already exists, skipping family seed");
    } else {
        let base = CurrencyCode::parse(&config.currency.default_base)?;
        let family = FamilyRepository::new(db.clone())
            .create("Demo Family", &base)
            .await?;
        let family_id = FamilyId::from_uuid(family.id);

        let hash = hash_password(DEMO_PASSWORD)?;
        users.create(family_id, DEMO_EMAIL, &hash, "Demo User").await?;
        info!(email = DEMO_EMAIL, "Created demo user");

        seed_accounts(&db, family_id).await?;
        seed_categories(&db, family_id).await?;
    }

    seed_exchange_rates(&db).await?;

    info!("Seeding complete");
    Ok(())
}

async fn seed_accounts(db: &DatabaseConnection, family_id: FamilyId) -> anyhow::Result<()> {
    let repo = AccountRepository::new(db.clone());
    let accounts = [
        ("Wallet", AccountType::Cash, "RSD", dec!(5000)),
        ("Main Checking", AccountType::Checking, "RSD", dec!(85000)),
        ("Euro Savings", AccountType::Savings, "EUR", dec!(1200)),
    ];

    for (name, account_type, currency, initial_balance) in accounts {
        repo.create(CreateAccountInput {
            family_id,
            name: name.to_string(),
            account_type,
            currency: CurrencyCode::parse(currency)?,
            initial_balance,
        })
        .await?;
    }

    info!(count = accounts.len(), "Inserted accounts");
    Ok(())
}

async fn seed_categories(db: &DatabaseConnection, family_id: FamilyId) -> anyhow::Result<()> {
    let repo = CategoryRepository::new(db.clone());
    let tree: [(&str, CategoryType, &[&str]); 4] = [
        ("Salary", CategoryType::Income, &[]),
        ("Groceries", CategoryType::Expense, &[]),
        ("Utilities", CategoryType::Expense, &["Electricity", "Internet"]),
        ("Transport", CategoryType::Expense, &["Fuel", "Public Transport"]),
    ];

    let mut inserted = 0;
    for (name, category_type, children) in tree {
        let parent = repo
            .create(CreateCategoryInput {
                family_id,
                name: name.to_string(),
                category_type,
                parent_id: None,
            })
            .await?;
        inserted += 1;

        for child in children {
            repo.create(CreateCategoryInput {
                family_id,
                name: (*child).to_string(),
                category_type,
                parent_id: Some(CategoryId::from_uuid(parent.id)),
            })
            .await?;
            inserted += 1;
        }
    }

    info!(count = inserted, "Inserted categories");
    Ok(())
}

/// Seeds a daily EUR to RSD rate with a small drift, newest today.
async fn seed_exchange_rates(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = ExchangeRateRepository::new(db.clone());
    let eur = CurrencyCode::parse("EUR")?;
    let rsd = CurrencyCode::parse("RSD")?;
    let today = Utc::now().date_naive();

    for offset in 0..RATE_DAYS {
        let Some(date) = today.checked_sub_days(Days::new(offset)) else {
            break;
        };
        // Alternate around 117.2 so history charts have some movement
        let step = Decimal::from(offset % 5) * dec!(0.05);
        let rate = if offset % 2 == 0 {
            dec!(117.2) + step
        } else {
            dec!(117.2) - step
        };

        let rate = ExchangeRate::new(eur.clone(), rsd.clone(), rate, date)?;
        repo.upsert(&rate, "seeder").await?;
    }

    info!(days = RATE_DAYS, "Upserted EUR/RSD exchange rates");
    Ok(())
}

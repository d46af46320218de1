//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod aggregation;
pub mod category;
pub mod exchange_rate;
pub mod family;
pub mod transaction;
pub mod user;

pub use account::{
    AccountError, AccountRepository, AccountWithBalance, CreateAccountInput, UpdateAccountInput,
};
pub use aggregation::AggregationRepository;
pub use category::{CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use exchange_rate::{ExchangeRateError, ExchangeRateRepository, MANUAL_SOURCE};
pub use family::{FamilyError, FamilyRepository};
pub use transaction::{PostingContext, TransactionError, TransactionRepository};
pub use user::UserRepository;

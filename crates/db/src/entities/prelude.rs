//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::audit_log::Entity as AuditLog;
pub use super::categories::Entity as Categories;
pub use super::exchange_rates::Entity as ExchangeRates;
pub use super::families::Entity as Families;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;

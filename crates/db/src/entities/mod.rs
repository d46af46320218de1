//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod audit_log;
pub mod categories;
pub mod exchange_rates;
pub mod families;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;

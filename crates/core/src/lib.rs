//! Core business logic for FamLedger.
//!
//! Pure logic with ZERO web or database dependencies. The storage layer
//! loads rows and rates, hands them in, and persists what comes back.
//!
//! # Modules
//!
//! - `ledger` - Transaction posting rules, merge patches, balances
//! - `currency` - Rate resolution, normalization, allow-list
//! - `category` - Category hierarchy rules
//! - `reports` - Report derivations (percentages, averages, savings)
//! - `period` - Inclusive date ranges and months
//! - `auth` - Login rules and password hashing

pub mod auth;
pub mod category;
pub mod currency;
pub mod ledger;
pub mod period;
pub mod reports;

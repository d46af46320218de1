//! Account repository.
//!
//! Accounts are soft-deleted through `is_active`. Balances are derived on
//! read from the initial balance plus the base-currency sums of the
//! account's non-deleted transactions.

use std::collections::HashMap;

use chrono::NaiveDate;
use famledger_core::ledger::{
    self, AccountBalance, AccountFlows, AccountRef, LedgerError, total_balance, validate_name,
};
use famledger_shared::AppError;
use famledger_shared::types::{AccountId, CurrencyCode, FamilyId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    accounts,
    sea_orm_active_enums::{AccountType as DbAccountType, TransactionType},
    transactions,
};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found (or owned by another family).
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Field validation failed.
    #[error(transparent)]
    Validation(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(e) => e.error_code(),
            Self::Database(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => Self::NotFound("Account not found".to_string()),
            AccountError::Validation(e) => e.into(),
            AccountError::Database(e) => Self::Storage(e.to_string()),
        }
    }
}

/// Input for creating an account. Fields are already validated.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning family.
    pub family_id: FamilyId,
    /// Display name.
    pub name: String,
    /// Account type.
    pub account_type: ledger::AccountType,
    /// Account currency (in the allow-list).
    pub currency: CurrencyCode,
    /// Opening balance, `>= 0`.
    pub initial_balance: Decimal,
}

/// Merge patch for an account. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New name.
    pub name: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Account with its derived balance.
#[derive(Debug, Clone)]
pub struct AccountWithBalance {
    /// The account record.
    pub account: accounts::Model,
    /// Derived balance.
    pub balance: AccountBalance,
}

#[derive(Debug, FromQueryResult)]
struct FlowRow {
    account_id: Uuid,
    transaction_type: TransactionType,
    total: Option<Decimal>,
    last_date: Option<NaiveDate>,
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active account of the family.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(
        &self,
        family_id: FamilyId,
        id: AccountId,
    ) -> Result<Option<accounts::Model>, DbErr> {
        Ok(self
            .find_any(family_id, id)
            .await?
            .filter(|a| a.is_active))
    }

    /// Finds an account of the family, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_any(
        &self,
        family_id: FamilyId,
        id: AccountId,
    ) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::FamilyId.eq(family_id.into_inner()))
            .one(&self.db)
            .await
    }

    /// Lists the family's active accounts by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self, family_id: FamilyId) -> Result<Vec<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::FamilyId.eq(family_id.into_inner()))
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists all of the family's accounts, inactive included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self, family_id: FamilyId) -> Result<Vec<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::FamilyId.eq(family_id.into_inner()))
            .order_by_desc(accounts::Column::IsActive)
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists the family's active accounts of one type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_type(
        &self,
        family_id: FamilyId,
        account_type: ledger::AccountType,
    ) -> Result<Vec<accounts::Model>, DbErr> {
        let account_type: DbAccountType = account_type.into();
        accounts::Entity::find()
            .filter(accounts::Column::FamilyId.eq(family_id.into_inner()))
            .filter(accounts::Column::IsActive.eq(true))
            .filter(accounts::Column::AccountType.eq(account_type))
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateAccountInput) -> Result<accounts::Model, AccountError> {
        validate_name(&input.name)?;

        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            family_id: Set(input.family_id.into_inner()),
            name: Set(input.name.trim().to_string()),
            account_type: Set(input.account_type.into()),
            currency: Set(input.currency.to_string()),
            initial_balance: Set(input.initial_balance),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let account = account.insert(&self.db).await?;
        info!(account_id = %account.id, family_id = %input.family_id, "Account created");
        Ok(account)
    }

    /// Applies a merge patch. Inactive accounts can be patched (to reactivate them).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing or foreign.
    pub async fn update(
        &self,
        family_id: FamilyId,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        if let Some(name) = &input.name {
            validate_name(name)?;
        }

        let account = self
            .find_any(family_id, id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        let mut active: accounts::ActiveModel = account.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes an active account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing, foreign or already inactive.
    pub async fn soft_delete(&self, family_id: FamilyId, id: AccountId) -> Result<(), AccountError> {
        let account = self
            .find_active(family_id, id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.update(&self.db).await?;

        info!(account_id = %id, family_id = %family_id, "Account deactivated");
        Ok(())
    }

    /// Derives the balance of one account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing or foreign.
    pub async fn balance(
        &self,
        family_id: FamilyId,
        id: AccountId,
    ) -> Result<AccountWithBalance, AccountError> {
        let account = self
            .find_any(family_id, id)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        let mut flows = account_flows(&self.db, family_id, Some(id)).await?;
        let balance = AccountBalance::derive(
            id,
            account.initial_balance,
            flows.remove(&id).unwrap_or_default(),
        );
        Ok(AccountWithBalance { account, balance })
    }

    /// Derives balances for all of the family's active accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balances(&self, family_id: FamilyId) -> Result<Vec<AccountWithBalance>, DbErr> {
        let accounts = self.list_active(family_id).await?;
        let mut flows = account_flows(&self.db, family_id, None).await?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                let id = AccountId::from_uuid(account.id);
                let balance = AccountBalance::derive(
                    id,
                    account.initial_balance,
                    flows.remove(&id).unwrap_or_default(),
                );
                AccountWithBalance { account, balance }
            })
            .collect())
    }

    /// Sum of current balances over the family's active accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_balance(&self, family_id: FamilyId) -> Result<Decimal, DbErr> {
        let balances = self.balances(family_id).await?;
        Ok(total_balance(balances.iter().map(|b| &b.balance)))
    }
}

/// Projects a row into the shape the ledger checks.
#[must_use]
pub fn account_ref(model: &accounts::Model) -> AccountRef {
    AccountRef {
        id: AccountId::from_uuid(model.id),
        family_id: FamilyId::from_uuid(model.family_id),
        is_active: model.is_active,
    }
}

/// Per-account income/expense sums over non-deleted transactions.
async fn account_flows<C>(
    conn: &C,
    family_id: FamilyId,
    account_id: Option<AccountId>,
) -> Result<HashMap<AccountId, AccountFlows>, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = transactions::Entity::find()
        .select_only()
        .column(transactions::Column::AccountId)
        .column(transactions::Column::TransactionType)
        .column_as(transactions::Column::AmountBase.sum(), "total")
        .column_as(transactions::Column::TransactionDate.max(), "last_date")
        .filter(transactions::Column::FamilyId.eq(family_id.into_inner()))
        .filter(transactions::Column::DeletedAt.is_null());
    if let Some(id) = account_id {
        query = query.filter(transactions::Column::AccountId.eq(id.into_inner()));
    }

    let rows = query
        .group_by(transactions::Column::AccountId)
        .group_by(transactions::Column::TransactionType)
        .into_model::<FlowRow>()
        .all(conn)
        .await?;

    let mut flows: HashMap<AccountId, AccountFlows> = HashMap::new();
    for row in rows {
        let entry = flows.entry(AccountId::from_uuid(row.account_id)).or_default();
        entry.add(row.transaction_type.into(), row.total.unwrap_or_default());
        entry.last_transaction_date = entry.last_transaction_date.max(row.last_date);
    }
    Ok(flows)
}

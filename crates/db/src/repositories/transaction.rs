//! Transaction repository: the posting side of the ledger.
//!
//! Create, update and delete each run in one audited unit of work:
//!
//! 1. Open an [`AuditScope`] bound to the acting user
//! 2. Load the family's base currency, referenced rows and the rate needed
//! 3. Let [`LedgerService`] validate and normalize
//! 4. Write the row; the audit trigger logs it under the bound actor
//! 5. Commit, or roll back on any error
//!
//! Reads take no transaction and see committed rows only.

use chrono::NaiveDate;
use famledger_core::currency::CurrencyAllowList;
use famledger_core::ledger::{
    LedgerError, LedgerService, NewTransaction, PostingRules, ResolvedTransaction,
    TransactionFilter, TransactionPatch, TransactionSnapshot, TransactionStatus,
};
use famledger_shared::AppError;
use famledger_shared::types::{
    AccountId, CategoryId, CurrencyCode, FamilyId, PageRequest, TransactionId, UserId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};

use super::account::account_ref;
use super::category::category_ref;
use super::exchange_rate::latest_rate;
use super::family::{FamilyError, load_base_currency};
use crate::audit::{AuditError, AuditExt};
use crate::entities::{accounts, categories, sea_orm_active_enums::TransactionType, transactions};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A posting rule failed; nothing was written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The caller's family could not be loaded.
    #[error(transparent)]
    Family(#[from] FamilyError),

    /// Database error; the unit of work was rolled back.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AuditError> for TransactionError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::MissingActor => Self::Ledger(LedgerError::MissingActor),
            AuditError::Database(e) => Self::Database(e),
        }
    }
}

impl TransactionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Family(e) => e.error_code(),
            Self::Database(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Ledger(e) => e.http_status_code(),
            Self::Family(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Ledger(e) => e.into(),
            TransactionError::Family(e) => e.into(),
            TransactionError::Database(e) => Self::Storage(e.to_string()),
        }
    }
}

/// Per-request posting context: the allowed currencies and today's date.
#[derive(Debug, Clone, Copy)]
pub struct PostingContext<'a> {
    /// Configured currency allow-list.
    pub currencies: &'a CurrencyAllowList,
    /// Today's date in the server's calendar.
    pub today: NaiveDate,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a transaction with its base-currency amount fixed from the
    /// rate in effect on its date.
    ///
    /// # Errors
    ///
    /// Returns a ledger error for a failed rule (including
    /// `RateUnavailable`), or a database error. No row is written on error.
    pub async fn create(
        &self,
        input: NewTransaction,
        ctx: PostingContext<'_>,
    ) -> Result<transactions::Model, TransactionError> {
        let scope = self.db.audited(input.actor).await?;
        let result = Self::create_in(scope.txn(), &input, ctx).await;
        let created = scope.finish(result).await?;

        info!(
            transaction_id = %created.id,
            family_id = %input.family_id,
            actor_id = %input.actor,
            amount_base = %created.amount_base,
            "Transaction created"
        );
        Ok(created)
    }

    async fn create_in(
        txn: &DatabaseTransaction,
        input: &NewTransaction,
        ctx: PostingContext<'_>,
    ) -> Result<transactions::Model, TransactionError> {
        let base = load_base_currency(txn, input.family_id).await?;
        let rules = PostingRules {
            base_currency: &base,
            currencies: ctx.currencies,
            today: ctx.today,
        };

        let account = accounts::Entity::find_by_id(input.account_id.into_inner())
            .one(txn)
            .await?
            .map(|a| account_ref(&a));
        let category = categories::Entity::find_by_id(input.category_id.into_inner())
            .one(txn)
            .await?
            .map(|c| category_ref(&c));
        let rate = rate_for(txn, &input.currency, &base, input.transaction_date).await?;

        let resolved = LedgerService::prepare_create(
            input,
            &rules,
            account.as_ref(),
            category.as_ref(),
            |_, _, _| rate,
        )?;

        let now = chrono::Utc::now().into();
        let actor = input.actor.into_inner();
        let row = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            family_id: Set(input.family_id.into_inner()),
            account_id: Set(resolved.account_id.into_inner()),
            category_id: Set(resolved.category_id.into_inner()),
            transaction_type: Set(resolved.transaction_type.into()),
            amount: Set(resolved.amount),
            currency: Set(resolved.currency.to_string()),
            amount_base: Set(resolved.amount_base),
            exchange_rate: Set(resolved.exchange_rate),
            description: Set(resolved.description),
            transaction_date: Set(resolved.transaction_date),
            created_by: Set(actor),
            updated_by: Set(actor),
            deleted_by: Set(None),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(row.insert(txn).await?)
    }

    /// Applies a merge patch and recomputes `amount_base` from the merged
    /// amount, currency and date.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for missing, deleted or foreign rows,
    /// otherwise the first failing rule or a database error.
    pub async fn update(
        &self,
        family_id: FamilyId,
        id: TransactionId,
        patch: TransactionPatch,
        actor: UserId,
        ctx: PostingContext<'_>,
    ) -> Result<transactions::Model, TransactionError> {
        let scope = self.db.audited(actor).await?;
        let result = Self::update_in(scope.txn(), family_id, id, &patch, actor, ctx).await;
        let updated = scope.finish(result).await?;

        info!(
            transaction_id = %id,
            family_id = %family_id,
            actor_id = %actor,
            amount_base = %updated.amount_base,
            "Transaction updated"
        );
        Ok(updated)
    }

    async fn update_in(
        txn: &DatabaseTransaction,
        family_id: FamilyId,
        id: TransactionId,
        patch: &TransactionPatch,
        actor: UserId,
        ctx: PostingContext<'_>,
    ) -> Result<transactions::Model, TransactionError> {
        let row = find_for_write(txn, id).await?;
        let current = to_snapshot(&row)?;

        let base = load_base_currency(txn, family_id).await?;
        let rules = PostingRules {
            base_currency: &base,
            currencies: ctx.currencies,
            today: ctx.today,
        };

        let category = match patch.category_id {
            Some(category_id) => categories::Entity::find_by_id(category_id.into_inner())
                .one(txn)
                .await?
                .map(|c| category_ref(&c)),
            None => None,
        };

        let merged = patch.apply_to(&current);
        let rate = rate_for(txn, &merged.currency, &base, merged.transaction_date).await?;

        let resolved = LedgerService::prepare_update(
            &current,
            patch,
            family_id,
            &rules,
            category.as_ref(),
            |_, _, _| rate,
        )?;

        let mut active: transactions::ActiveModel = row.into();
        apply_resolved(&mut active, resolved);
        active.updated_by = Set(actor.into_inner());

        Ok(active.update(txn).await?)
    }

    /// Soft-deletes a transaction, recording the acting user.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for missing, already deleted or foreign
    /// rows, or a database error.
    pub async fn delete(
        &self,
        family_id: FamilyId,
        id: TransactionId,
        actor: UserId,
    ) -> Result<(), TransactionError> {
        let scope = self.db.audited(actor).await?;
        let result = Self::delete_in(scope.txn(), family_id, id, actor).await;
        scope.finish(result).await?;

        info!(transaction_id = %id, family_id = %family_id, actor_id = %actor, "Transaction deleted");
        Ok(())
    }

    async fn delete_in(
        txn: &DatabaseTransaction,
        family_id: FamilyId,
        id: TransactionId,
        actor: UserId,
    ) -> Result<(), TransactionError> {
        let row = find_for_write(txn, id).await?;
        LedgerService::prepare_delete(&to_snapshot(&row)?, family_id)?;

        let actor = actor.into_inner();
        let mut active: transactions::ActiveModel = row.into();
        active.deleted_at = Set(Some(chrono::Utc::now().into()));
        active.deleted_by = Set(Some(actor));
        active.updated_by = Set(actor);
        active.update(txn).await?;
        Ok(())
    }

    /// Finds a non-deleted transaction of the family.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        family_id: FamilyId,
        id: TransactionId,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::FamilyId.eq(family_id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    /// Returns one page of non-deleted transactions matching every supplied
    /// filter, plus the total number of matches.
    ///
    /// Ordered by `transaction_date DESC, created_at DESC, id DESC`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_filtered(
        &self,
        family_id: FamilyId,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), DbErr> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::FamilyId.eq(family_id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null());

        if let Some(transaction_type) = filter.transaction_type {
            let transaction_type: TransactionType = transaction_type.into();
            query = query.filter(transactions::Column::TransactionType.eq(transaction_type));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(range) = filter.date_range {
            query = query.filter(transactions::Column::TransactionDate.between(range.start, range.end));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        debug!(family_id = %family_id, total, returned = rows.len(), "Listed transactions");
        Ok((rows, total))
    }
}

/// Loads the row (any family, any status) and locks it for this unit of work.
async fn find_for_write(
    txn: &DatabaseTransaction,
    id: TransactionId,
) -> Result<transactions::Model, TransactionError> {
    transactions::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(TransactionError::Ledger(LedgerError::TransactionNotFound(id)))
}

/// Rate needed to post `currency` in `base`; `None` when they match or no
/// rate is stored. The ledger decides what a missing rate means.
async fn rate_for<C>(
    conn: &C,
    currency: &CurrencyCode,
    base: &CurrencyCode,
    date: NaiveDate,
) -> Result<Option<Decimal>, DbErr>
where
    C: ConnectionTrait,
{
    if currency == base {
        return Ok(None);
    }
    Ok(latest_rate(conn, currency, base, date).await?.map(|r| r.rate))
}

fn apply_resolved(active: &mut transactions::ActiveModel, resolved: ResolvedTransaction) {
    active.category_id = Set(resolved.category_id.into_inner());
    active.amount = Set(resolved.amount);
    active.currency = Set(resolved.currency.to_string());
    active.amount_base = Set(resolved.amount_base);
    active.exchange_rate = Set(resolved.exchange_rate);
    active.description = Set(resolved.description);
    active.transaction_date = Set(resolved.transaction_date);
}

/// Converts a stored row into the ledger's view of it.
///
/// # Errors
///
/// Returns a storage error if the row holds an invalid currency code.
pub fn to_snapshot(model: &transactions::Model) -> Result<TransactionSnapshot, LedgerError> {
    let currency = CurrencyCode::parse(&model.currency).map_err(|e| {
        LedgerError::Storage(format!("transaction {} has {e}", model.id))
    })?;

    Ok(TransactionSnapshot {
        id: TransactionId::from_uuid(model.id),
        family_id: FamilyId::from_uuid(model.family_id),
        account_id: AccountId::from_uuid(model.account_id),
        category_id: CategoryId::from_uuid(model.category_id),
        transaction_type: model.transaction_type.into(),
        amount: model.amount,
        currency,
        description: model.description.clone(),
        transaction_date: model.transaction_date,
        status: TransactionStatus::from_deleted(model.deleted_at.is_some()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row(currency: &str, deleted: bool) -> transactions::Model {
        let now = chrono::Utc::now().into();
        transactions::Model {
            id: Uuid::now_v7(),
            family_id: Uuid::now_v7(),
            account_id: Uuid::now_v7(),
            category_id: Uuid::now_v7(),
            transaction_type: TransactionType::Expense,
            amount: dec!(10.00),
            currency: currency.to_string(),
            amount_base: dec!(1175.00),
            exchange_rate: dec!(117.5),
            description: Some("Groceries".to_string()),
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_by: Uuid::now_v7(),
            updated_by: Uuid::now_v7(),
            deleted_by: None,
            deleted_at: deleted.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_snapshot_of_active_row() {
        let model = row("EUR", false);
        let snapshot = to_snapshot(&model).unwrap();
        assert_eq!(snapshot.id.into_inner(), model.id);
        assert_eq!(snapshot.currency, "EUR");
        assert_eq!(snapshot.amount, dec!(10.00));
        assert_eq!(snapshot.status, TransactionStatus::Active);
    }

    #[test]
    fn test_snapshot_of_deleted_row_is_not_editable() {
        let snapshot = to_snapshot(&row("RSD", true)).unwrap();
        assert_eq!(snapshot.status, TransactionStatus::Deleted);
        assert!(!snapshot.status.is_editable());
    }

    #[test]
    fn test_snapshot_rejects_corrupt_currency() {
        let err = to_snapshot(&row("12", false)).unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_FAILURE");
    }

    #[test]
    fn test_missing_actor_maps_to_unauthorized() {
        let err: TransactionError = AuditError::MissingActor.into();
        assert_eq!(err.http_status_code(), 401);
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 401);
    }
}

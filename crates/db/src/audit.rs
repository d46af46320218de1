//! Audit context binding for mutating operations.
//!
//! Every write to `transactions` must carry the acting user. The audit
//! trigger reads `app.current_user_id`, which this module sets with
//! `SET LOCAL` so it lives exactly as long as the database transaction.
//!
//! # Usage
//!
//! ```ignore
//! use famledger_db::audit::AuditExt;
//!
//! let scope = db.audited(actor_id).await?;
//! let result = write_rows(scope.txn()).await;
//! scope.finish(result).await?;
//! ```

use famledger_shared::types::UserId;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::warn;

/// Errors raised while binding an actor to a unit of work.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// No actor was supplied.
    #[error("No acting user bound to the operation")]
    MissingActor,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AuditError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingActor => "UNAUTHORIZED",
            Self::Database(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingActor => 401,
            Self::Database(_) => 500,
        }
    }
}

/// A database transaction with the acting user bound to it.
///
/// Dropping the scope without calling [`AuditScope::commit`] rolls the
/// transaction back, so no exit path can leave a partial write behind.
pub struct AuditScope {
    txn: DatabaseTransaction,
    actor: UserId,
}

impl AuditScope {
    /// Begins a transaction and binds `actor` with `SET LOCAL`.
    ///
    /// # Errors
    ///
    /// Returns `MissingActor` for a nil actor id, or a database error if the
    /// transaction cannot be started or the setting cannot be applied.
    pub async fn begin(db: &DatabaseConnection, actor: UserId) -> Result<Self, AuditError> {
        if actor.is_nil() {
            return Err(AuditError::MissingActor);
        }

        let txn = db.begin().await?;
        bind_actor(&txn, actor).await?;

        Ok(Self { txn, actor })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub const fn txn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }

    /// Commits on `Ok`, rolls back on `Err`, and passes the result through.
    ///
    /// A failed rollback is logged; the original error is still returned.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or the commit error.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<DbErr>,
    {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let actor = self.actor;
                if let Err(rollback_err) = self.rollback().await {
                    warn!(actor_id = %actor, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Extension trait for `DatabaseConnection` to open audited units of work.
#[async_trait::async_trait]
pub trait AuditExt {
    /// Begins a transaction with `actor` bound for the audit trigger.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope cannot be opened.
    async fn audited(&self, actor: UserId) -> Result<AuditScope, AuditError>;
}

#[async_trait::async_trait]
impl AuditExt for DatabaseConnection {
    async fn audited(&self, actor: UserId) -> Result<AuditScope, AuditError> {
        AuditScope::begin(self, actor).await
    }
}

/// Binds `actor` on an existing transaction.
///
/// # Errors
///
/// Returns an error if the setting cannot be applied.
pub async fn bind_actor(txn: &DatabaseTransaction, actor: UserId) -> Result<(), DbErr> {
    txn.execute_unprepared(&bind_actor_sql(actor)).await?;
    Ok(())
}

/// `UserId` renders as a hyphenated UUID, so interpolation cannot inject SQL.
fn bind_actor_sql(actor: UserId) -> String {
    format!("SET LOCAL app.current_user_id = '{actor}'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_bind_actor_sql_format() {
        let actor = UserId::from_uuid(
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
        );
        assert_eq!(
            bind_actor_sql(actor),
            "SET LOCAL app.current_user_id = '550e8400-e29b-41d4-a716-446655440000'"
        );
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(AuditError::MissingActor.http_status_code(), 401);
        assert_eq!(
            AuditError::Database(DbErr::Custom("boom".to_string())).error_code(),
            "STORAGE_FAILURE"
        );
    }
}

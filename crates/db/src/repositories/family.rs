//! Family (tenant) repository.

use famledger_shared::AppError;
use famledger_shared::types::{CurrencyCode, FamilyId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::families;

/// Error types for family operations.
#[derive(Debug, thiserror::Error)]
pub enum FamilyError {
    /// Family not found.
    #[error("Family not found: {0}")]
    NotFound(FamilyId),

    /// Stored base currency is not a valid code.
    #[error("Family {0} has an invalid base currency '{1}'")]
    InvalidBaseCurrency(FamilyId, String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl FamilyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidBaseCurrency(..) | Self::Database(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidBaseCurrency(..) | Self::Database(_) => 500,
        }
    }
}

impl From<FamilyError> for AppError {
    fn from(err: FamilyError) -> Self {
        match err {
            FamilyError::NotFound(_) => Self::NotFound("Family not found".to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Family repository.
#[derive(Debug, Clone)]
pub struct FamilyRepository {
    db: DatabaseConnection,
}

impl FamilyRepository {
    /// Creates a new family repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a family by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: FamilyId) -> Result<Option<families::Model>, DbErr> {
        families::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Lists active families by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<families::Model>, DbErr> {
        families::Entity::find()
            .filter(families::Column::IsActive.eq(true))
            .order_by_asc(families::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a family.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        name: &str,
        base_currency: &CurrencyCode,
    ) -> Result<families::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let family = families::ActiveModel {
            id: Set(FamilyId::new().into_inner()),
            name: Set(name.trim().to_string()),
            base_currency: Set(base_currency.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let family = family.insert(&self.db).await?;
        info!(family_id = %family.id, "Family created");
        Ok(family)
    }

    /// Updates the supplied fields of a family.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the family does not exist.
    pub async fn update(
        &self,
        id: FamilyId,
        name: Option<&str>,
        base_currency: Option<&CurrencyCode>,
    ) -> Result<families::Model, FamilyError> {
        let family = self.find_by_id(id).await?.ok_or(FamilyError::NotFound(id))?;

        let mut active: families::ActiveModel = family.into();
        if let Some(name) = name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(code) = base_currency {
            active.base_currency = Set(code.to_string());
        }

        Ok(active.update(&self.db).await?)
    }

    /// Returns the base currency of a family.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the family does not exist.
    pub async fn base_currency(&self, id: FamilyId) -> Result<CurrencyCode, FamilyError> {
        load_base_currency(&self.db, id).await
    }
}

/// Loads a family's base currency on any connection or transaction.
///
/// # Errors
///
/// Returns `NotFound` if the family does not exist.
pub async fn load_base_currency<C>(conn: &C, id: FamilyId) -> Result<CurrencyCode, FamilyError>
where
    C: ConnectionTrait,
{
    let family = families::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(FamilyError::NotFound(id))?;

    CurrencyCode::parse(&family.base_currency)
        .map_err(|_| FamilyError::InvalidBaseCurrency(id, family.base_currency))
}

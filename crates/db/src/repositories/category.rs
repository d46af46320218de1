//! Category repository.
//!
//! Parent assignments go through the core hierarchy rules, which walk the
//! full ancestor chain. The family's categories are loaded once per write
//! to answer that walk.

use std::collections::HashMap;

use famledger_core::category::{CategoryNode, CategoryRuleError, CategoryType, validate_parent};
use famledger_core::ledger::{CategoryRef, LedgerError, validate_name};
use famledger_shared::AppError;
use famledger_shared::types::{CategoryId, FamilyId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use tracing::info;

use crate::entities::{categories, sea_orm_active_enums::TransactionType};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found (or owned by another family).
    #[error("Category not found: {0}")]
    NotFound(CategoryId),

    /// Parent assignment rejected.
    #[error(transparent)]
    Hierarchy(#[from] CategoryRuleError),

    /// Field validation failed.
    #[error(transparent)]
    Validation(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl CategoryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Hierarchy(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Database(_) => "STORAGE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Hierarchy(e) => e.http_status_code(),
            Self::Validation(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::NotFound("Category not found".to_string()),
            CategoryError::Hierarchy(e) => e.into(),
            CategoryError::Validation(e) => e.into(),
            CategoryError::Database(e) => Self::Storage(e.to_string()),
        }
    }
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Owning family.
    pub family_id: FamilyId,
    /// Display name.
    pub name: String,
    /// `income` or `expense`.
    pub category_type: CategoryType,
    /// Optional parent of the same type.
    pub parent_id: Option<CategoryId>,
}

/// Merge patch for a category. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New parent.
    pub parent_id: Option<CategoryId>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a category of the family, active or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        family_id: FamilyId,
        id: CategoryId,
    ) -> Result<Option<categories::Model>, DbErr> {
        categories::Entity::find_by_id(id.into_inner())
            .filter(categories::Column::FamilyId.eq(family_id.into_inner()))
            .one(&self.db)
            .await
    }

    /// Lists the family's active categories, by type then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self, family_id: FamilyId) -> Result<Vec<categories::Model>, DbErr> {
        categories::Entity::find()
            .filter(categories::Column::FamilyId.eq(family_id.into_inner()))
            .filter(categories::Column::IsActive.eq(true))
            .order_by_asc(categories::Column::CategoryType)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists every category of the family, inactive included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self, family_id: FamilyId) -> Result<Vec<categories::Model>, DbErr> {
        categories::Entity::find()
            .filter(categories::Column::FamilyId.eq(family_id.into_inner()))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists the family's active categories of one type.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_type(
        &self,
        family_id: FamilyId,
        category_type: CategoryType,
    ) -> Result<Vec<categories::Model>, DbErr> {
        let category_type: TransactionType = category_type.into();
        categories::Entity::find()
            .filter(categories::Column::FamilyId.eq(family_id.into_inner()))
            .filter(categories::Column::IsActive.eq(true))
            .filter(categories::Column::CategoryType.eq(category_type))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists active categories without a parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_roots(&self, family_id: FamilyId) -> Result<Vec<categories::Model>, DbErr> {
        categories::Entity::find()
            .filter(categories::Column::FamilyId.eq(family_id.into_inner()))
            .filter(categories::Column::IsActive.eq(true))
            .filter(categories::Column::ParentId.is_null())
            .order_by_asc(categories::Column::CategoryType)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Lists active direct children of `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_children(
        &self,
        family_id: FamilyId,
        parent_id: CategoryId,
    ) -> Result<Vec<categories::Model>, DbErr> {
        categories::Entity::find()
            .filter(categories::Column::FamilyId.eq(family_id.into_inner()))
            .filter(categories::Column::IsActive.eq(true))
            .filter(categories::Column::ParentId.eq(parent_id.into_inner()))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad name, or a hierarchy error for a
    /// bad parent.
    pub async fn create(&self, input: CreateCategoryInput) -> Result<categories::Model, CategoryError> {
        validate_name(&input.name)?;

        if let Some(parent_id) = input.parent_id {
            let nodes = self.family_nodes(input.family_id).await?;
            validate_parent(None, input.category_type, input.family_id, parent_id, |id| {
                nodes.get(&id).copied()
            })?;
        }

        let now = chrono::Utc::now().into();
        let category = categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            family_id: Set(input.family_id.into_inner()),
            name: Set(input.name.trim().to_string()),
            category_type: Set(input.category_type.into()),
            parent_id: Set(input.parent_id.map(CategoryId::into_inner)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let category = category.insert(&self.db).await?;
        info!(category_id = %category.id, family_id = %input.family_id, "Category created");
        Ok(category)
    }

    /// Applies a merge patch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category is missing or foreign, otherwise
    /// the first failing rule.
    pub async fn update(
        &self,
        family_id: FamilyId,
        id: CategoryId,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        if let Some(name) = &input.name {
            validate_name(name)?;
        }

        let category = self
            .find(family_id, id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        if let Some(parent_id) = input.parent_id {
            let nodes = self.family_nodes(family_id).await?;
            validate_parent(
                Some(id),
                category.category_type.into(),
                family_id,
                parent_id,
                |id| nodes.get(&id).copied(),
            )?;
        }

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(Some(parent_id.into_inner()));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes an active category. Transactions keep referencing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category is missing, foreign or already inactive.
    pub async fn soft_delete(&self, family_id: FamilyId, id: CategoryId) -> Result<(), CategoryError> {
        let category = self
            .find(family_id, id)
            .await?
            .filter(|c| c.is_active)
            .ok_or(CategoryError::NotFound(id))?;

        let mut active: categories::ActiveModel = category.into();
        active.is_active = Set(false);
        active.update(&self.db).await?;

        info!(category_id = %id, family_id = %family_id, "Category deactivated");
        Ok(())
    }

    async fn family_nodes(
        &self,
        family_id: FamilyId,
    ) -> Result<HashMap<CategoryId, CategoryNode>, DbErr> {
        Ok(self
            .list_all(family_id)
            .await?
            .iter()
            .map(|c| (CategoryId::from_uuid(c.id), category_node(c)))
            .collect())
    }
}

/// Projects a row into the shape the ledger checks.
#[must_use]
pub fn category_ref(model: &categories::Model) -> CategoryRef {
    CategoryRef {
        id: CategoryId::from_uuid(model.id),
        family_id: FamilyId::from_uuid(model.family_id),
        category_type: model.category_type.into(),
    }
}

fn category_node(model: &categories::Model) -> CategoryNode {
    CategoryNode {
        id: CategoryId::from_uuid(model.id),
        family_id: FamilyId::from_uuid(model.family_id),
        category_type: model.category_type.into(),
        parent_id: model.parent_id.map(CategoryId::from_uuid),
        is_active: model.is_active,
    }
}

//! Category management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use famledger_core::category::CategoryType;
use famledger_db::entities::categories;
use famledger_db::repositories::{CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
use famledger_shared::types::CategoryId;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
}

/// Query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    /// Only direct children of this category.
    pub parent_id: Option<Uuid>,
    /// Only categories without a parent.
    #[serde(default)]
    pub roots: bool,
    /// Include deactivated categories.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Display name.
    pub name: String,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub category_type: String,
    /// Optional parent of the same type.
    pub parent_id: Option<Uuid>,
}

/// Merge patch for a category; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New parent.
    pub parent_id: Option<Uuid>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// A category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Parent category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Whether the category is active.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at timestamp.
    pub updated_at: DateTime<FixedOffset>,
}

impl From<categories::Model> for CategoryResponse {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category_type: model.category_type.into(),
            parent_id: model.parent_id,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List wrapper.
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    /// Categories.
    pub categories: Vec<CategoryResponse>,
}

/// GET `/categories` - List the family's categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let family_id = auth.family_id();
    let type_filter = query
        .category_type
        .as_deref()
        .map(|raw| CategoryType::parse("type", raw))
        .transpose()?;

    let repo = CategoryRepository::new((*state.db).clone());
    let models = if let Some(parent_id) = query.parent_id {
        repo.list_children(family_id, CategoryId::from_uuid(parent_id))
            .await?
    } else if query.roots {
        repo.list_roots(family_id).await?
    } else if query.include_inactive {
        repo.list_all(family_id).await?
    } else if let Some(category_type) = type_filter {
        repo.list_by_type(family_id, category_type).await?
    } else {
        repo.list_active(family_id).await?
    };

    let categories = models
        .into_iter()
        .filter(|c| type_filter.is_none_or(|t| CategoryType::from(c.category_type) == t))
        .map(CategoryResponse::from)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

/// POST `/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category_type = CategoryType::parse("type", &payload.category_type)?;

    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo
        .create(CreateCategoryInput {
            family_id: auth.family_id(),
            name: payload.name,
            category_type,
            parent_id: payload.parent_id.map(CategoryId::from_uuid),
        })
        .await?;

    info!(category_id = %category.id, user_id = %auth.user_id(), "Category created via API");

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// GET `/categories/{id}` - Get a category.
async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo
        .find(auth.family_id(), CategoryId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(category.into()))
}

/// PATCH `/categories/{id}` - Rename, move or (de)activate a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo
        .update(
            auth.family_id(),
            CategoryId::from_uuid(id),
            UpdateCategoryInput {
                name: payload.name,
                parent_id: payload.parent_id.map(CategoryId::from_uuid),
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(category.into()))
}

/// DELETE `/categories/{id}` - Deactivate a category.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());
    repo.soft_delete(auth.family_id(), CategoryId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Category management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    middleware::AuthUser,
    routes::{error_response, flow_type_to_string, string_to_flow_type},
};
use moneta_db::CategoryRepository;
use moneta_db::entities::categories;
use moneta_db::repositories::{CategoryError, CreateCategoryInput, UpdateCategoryInput};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories/create", post(create_category))
        .route("/categories/lists", get(list_categories))
        .route("/categories/update/{category_id}", put(update_category))
        .route("/categories/delete/{category_id}", delete(delete_category))
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name; stored trimmed and lowercased.
    pub name: String,
    /// Flow direction: "income" or "expense".
    #[serde(rename = "type")]
    pub flow: String,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New flow direction.
    #[serde(rename = "type")]
    pub flow: Option<String>,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: Uuid,
    /// Normalized name.
    pub name: String,
    /// Flow direction.
    #[serde(rename = "type")]
    pub flow: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

fn category_response(category: &categories::Model) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name.clone(),
        flow: flow_type_to_string(&category.flow),
        created_at: category.created_at.to_rfc3339(),
        updated_at: category.updated_at.to_rfc3339(),
    }
}

/// POST /categories/create - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let Some(flow) = string_to_flow_type(&payload.flow) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_type",
                "message": "Type must be 'income' or 'expense'"
            })),
        )
            .into_response();
    };

    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .create(CreateCategoryInput {
            user_id: auth.user_id(),
            name: payload.name,
            flow,
        })
        .await
    {
        Ok(category) => {
            info!(user_id = %auth.user_id(), category_id = %category.id, "Category created");
            (StatusCode::CREATED, Json(category_response(&category))).into_response()
        }
        Err(CategoryError::EmptyName) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_name",
                "message": "Category name must not be empty"
            })),
        )
            .into_response(),
        Err(CategoryError::DuplicateName(name)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "duplicate_category",
                "message": format!("Category '{name}' already exists")
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create category");
            error_response(&e.into())
        }
    }
}

/// GET /categories/lists - List the caller's categories.
async fn list_categories(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.list(auth.user_id()).await {
        Ok(categories) => {
            let items: Vec<CategoryResponse> = categories.iter().map(category_response).collect();
            (StatusCode::OK, Json(json!({ "categories": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list categories");
            error_response(&e.into())
        }
    }
}

/// PUT /categories/update/{category_id} - Partially update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let flow = match payload.flow.as_deref() {
        None => None,
        Some(s) => match string_to_flow_type(s) {
            Some(f) => Some(f),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_type",
                        "message": "Type must be 'income' or 'expense'"
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .update(
            auth.user_id(),
            category_id,
            UpdateCategoryInput {
                name: payload.name,
                flow,
            },
        )
        .await
    {
        Ok(category) => {
            info!(user_id = %auth.user_id(), category_id = %category.id, "Category updated");
            (StatusCode::OK, Json(category_response(&category))).into_response()
        }
        Err(CategoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Category not found"
            })),
        )
            .into_response(),
        Err(CategoryError::EmptyName) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_name",
                "message": "Category name must not be empty"
            })),
        )
            .into_response(),
        Err(CategoryError::DuplicateName(name)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "duplicate_category",
                "message": format!("Category '{name}' already exists")
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update category");
            error_response(&e.into())
        }
    }
}

/// DELETE /categories/delete/{category_id} - Delete a category.
///
/// The category's transactions move to the caller's "uncategorized"
/// fallback category; the response reports where they went.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), category_id).await {
        Ok(deletion) => {
            info!(
                user_id = %auth.user_id(),
                category_id = %category_id,
                reassigned = deletion.reassigned,
                "Category deleted"
            );

            (
                StatusCode::OK,
                Json(json!({
                    "message": "Category deleted",
                    "fallback_category_id": deletion.fallback_id,
                    "reassigned_transactions": deletion.reassigned
                })),
            )
                .into_response()
        }
        Err(CategoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Category not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete category");
            error_response(&e.into())
        }
    }
}

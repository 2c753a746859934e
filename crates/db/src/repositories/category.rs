//! Category repository for the per-user category ledger.
//!
//! Category names are stored normalized (trimmed, lowercased) and are
//! unique per user. Deleting a category moves its transactions to the
//! user's `uncategorized` fallback category inside one transaction, so
//! no reference is ever left dangling.

use moneta_core::category::{FALLBACK_CATEGORY_NAME, normalize_name};
use moneta_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{categories, sea_orm_active_enums::FlowType, transactions};

/// Errors that can occur during category operations.
#[derive(Debug, Error)]
pub enum CategoryError {
    /// The user already has a category with this name.
    #[error("Category '{0}' already exists")]
    DuplicateName(String),

    /// Category not found.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// The name was empty after trimming.
    #[error("Category name must not be empty")]
    EmptyName,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::DuplicateName(name) => {
                Self::Conflict(format!("Category '{name}' already exists"))
            }
            CategoryError::NotFound(_) => Self::NotFound("Category not found".to_string()),
            CategoryError::EmptyName => {
                Self::Validation("Category name must not be empty".to_string())
            }
            CategoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    pub user_id: Uuid,
    pub name: String,
    pub flow: FlowType,
}

/// Input for updating a category. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub flow: Option<FlowType>,
}

/// Outcome of a category deletion.
#[derive(Debug, Clone, Copy)]
pub struct CategoryDeletion {
    /// The category that absorbed the deleted category's transactions.
    pub fallback_id: Uuid,
    /// Number of transactions moved to the fallback.
    pub reassigned: u64,
}

/// Category repository for CRUD operations.
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

    /// Creates a category for a user.
    ///
    /// The name is normalized before storage, so `" Food "` and `"food"`
    /// are the same category.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::EmptyName`] if the name is blank and
    /// [`CategoryError::DuplicateName`] if the user already has a
    /// category with this name.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let name = normalize_name(&input.name);
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        if self.name_exists(input.user_id, &name).await? {
            return Err(CategoryError::DuplicateName(name));
        }

        let now = chrono::Utc::now().into();
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            name: Set(name.clone()),
            flow: Set(input.flow),
            created_at: Set(now),
            updated_at: Set(now),
        };

        category.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => CategoryError::DuplicateName(name),
            _ => CategoryError::Database(e),
        })
    }

    /// Lists all categories belonging to a user, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<categories::Model>, CategoryError> {
        let categories = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;

        Ok(categories)
    }

    /// Finds a category by ID, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<Option<categories::Model>, DbErr> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Updates a category's name and/or flow direction.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if the category does not
    /// exist or belongs to another user, and
    /// [`CategoryError::DuplicateName`] if the new name collides with
    /// another of the user's categories.
    pub async fn update(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let category = self
            .find_owned(user_id, category_id)
            .await?
            .ok_or(CategoryError::NotFound(category_id))?;

        // Renaming to a case variant of the current name is a no-op.
        let new_name = match &input.name {
            Some(raw) => {
                let name = normalize_name(raw);
                if name.is_empty() {
                    return Err(CategoryError::EmptyName);
                }
                (name != category.name).then_some(name)
            }
            None => None,
        };

        if let Some(name) = &new_name
            && self
                .name_exists_excluding(user_id, name, category_id)
                .await?
        {
            return Err(CategoryError::DuplicateName(name.clone()));
        }

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = new_name.clone() {
            active.name = Set(name);
        }
        if let Some(flow) = input.flow {
            active.flow = Set(flow);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                CategoryError::DuplicateName(new_name.unwrap_or_default())
            }
            _ => CategoryError::Database(e),
        })
    }

    /// Deletes a category, moving its transactions to the user's
    /// fallback category.
    ///
    /// The fallback is created on first use. Deleting the fallback
    /// itself is allowed; its transactions become uncategorized through
    /// the `ON DELETE SET NULL` reference instead of being reassigned.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] if the category does not
    /// exist or belongs to another user.
    pub async fn delete(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryDeletion, CategoryError> {
        let category = self
            .find_owned(user_id, category_id)
            .await?
            .ok_or(CategoryError::NotFound(category_id))?;

        let txn = self.db.begin().await?;

        let fallback_id = Self::resolve_fallback(&txn, user_id).await?;

        let reassigned = if fallback_id == category.id {
            0
        } else {
            transactions::Entity::update_many()
                .set(transactions::ActiveModel {
                    category_id: Set(Some(fallback_id)),
                    updated_at: Set(chrono::Utc::now().into()),
                    ..Default::default()
                })
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::CategoryId.eq(category.id))
                .exec(&txn)
                .await?
                .rows_affected
        };

        categories::Entity::delete_by_id(category.id)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(CategoryDeletion {
            fallback_id,
            reassigned,
        })
    }

    /// Returns the user's fallback category, creating it if absent.
    async fn resolve_fallback(txn: &DatabaseTransaction, user_id: Uuid) -> Result<Uuid, DbErr> {
        let existing = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(FALLBACK_CATEGORY_NAME))
            .one(txn)
            .await?;

        if let Some(category) = existing {
            return Ok(category.id);
        }

        let now = chrono::Utc::now().into();
        let fallback = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(FALLBACK_CATEGORY_NAME.to_string()),
            flow: Set(FlowType::Expense),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(fallback.insert(txn).await?.id)
    }

    async fn name_exists(&self, user_id: Uuid, name: &str) -> Result<bool, DbErr> {
        let count = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn name_exists_excluding(
        &self,
        user_id: Uuid,
        name: &str,
        category_id: Uuid,
    ) -> Result<bool, DbErr> {
        let count = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name))
            .filter(categories::Column::Id.ne(category_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

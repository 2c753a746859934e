//! Transaction repository for the per-user transaction ledger.
//!
//! Every operation is scoped to the acting user. A transaction that
//! exists but belongs to someone else is reported as not found, never
//! as a permission failure.

use chrono::{DateTime, Utc};
use moneta_shared::AppError;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{categories, sea_orm_active_enums::FlowType, transactions};

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// The referenced category does not exist for this user.
    #[error("Unknown category: {0}")]
    UnknownCategory(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_) => Self::NotFound("Transaction not found".to_string()),
            TransactionError::UnknownCategory(id) => {
                Self::Validation(format!("Unknown category: {id}"))
            }
            TransactionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Owning user.
    pub user_id: Uuid,
    /// Category the transaction is filed under.
    pub category_id: Uuid,
    /// Income or expense.
    pub flow: FlowType,
    /// Positive amount.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: DateTime<Utc>,
    /// Optional free-form note.
    pub description: Option<String>,
}

/// Input for updating a transaction. `None` fields are left unchanged;
/// `description` uses a nested `Option` so the note can be cleared.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub category_id: Option<Uuid>,
    pub flow: Option<FlowType>,
    pub amount: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
}

/// Category selector for listing transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// No category restriction.
    #[default]
    All,
    /// Only transactions with no category.
    Uncategorized,
    /// Only transactions filed under this category.
    Id(Uuid),
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    /// Inclusive lower date bound.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper date bound.
    pub date_to: Option<DateTime<Utc>>,
    /// Restrict to one flow direction.
    pub flow: Option<FlowType>,
    /// Restrict by category.
    pub category: CategoryFilter,
}

/// Transaction repository for CRUD operations.
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

    /// Records a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::UnknownCategory`] if the category
    /// does not exist or belongs to another user.
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        self.check_category(input.user_id, input.category_id)
            .await?;

        let category_id = input.category_id;
        let now = Utc::now().into();
        let transaction = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            category_id: Set(Some(input.category_id)),
            flow: Set(input.flow),
            amount: Set(input.amount),
            date: Set(input.date.into()),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The category could vanish between the check and the insert;
        // the foreign key reports that as the same error.
        transaction
            .insert(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    TransactionError::UnknownCategory(category_id)
                }
                _ => TransactionError::Database(e),
            })
    }

    /// Lists a user's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<transactions::Model>, TransactionError> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));

        if let Some(date_from) = filter.date_from {
            query = query.filter(transactions::Column::Date.gte(date_from));
        }

        if let Some(date_to) = filter.date_to {
            query = query.filter(transactions::Column::Date.lte(date_to));
        }

        if let Some(flow) = filter.flow {
            query = query.filter(transactions::Column::Flow.eq(flow));
        }

        match filter.category {
            CategoryFilter::All => {}
            CategoryFilter::Uncategorized => {
                query = query.filter(transactions::Column::CategoryId.is_null());
            }
            CategoryFilter::Id(category_id) => {
                query = query.filter(transactions::Column::CategoryId.eq(category_id));
            }
        }

        let transactions = query
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(transactions)
    }

    /// Finds a transaction by ID, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(transaction_id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Updates a transaction's fields.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] if the transaction does
    /// not exist or belongs to another user, and
    /// [`TransactionError::UnknownCategory`] if a new category is
    /// supplied that the user does not own.
    pub async fn update(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let transaction = self
            .find_owned(user_id, transaction_id)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))?;

        if let Some(category_id) = input.category_id {
            self.check_category(user_id, category_id).await?;
        }

        let new_category = input.category_id;
        let mut active: transactions::ActiveModel = transaction.into();
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(flow) = input.flow {
            active.flow = Set(flow);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(date) = input.date {
            active.date = Set(date.into());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now().into());

        active
            .update(&self.db)
            .await
            .map_err(|e| match (new_category, e.sql_err()) {
                (Some(category_id), Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
                    TransactionError::UnknownCategory(category_id)
                }
                _ => TransactionError::Database(e),
            })
    }

    /// Deletes a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::NotFound`] if the transaction does
    /// not exist or belongs to another user.
    pub async fn delete(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), TransactionError> {
        self.find_owned(user_id, transaction_id)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))?;

        transactions::Entity::delete_by_id(transaction_id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Confirms the category exists and belongs to the user.
    async fn check_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), TransactionError> {
        let count = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        if count == 0 {
            return Err(TransactionError::UnknownCategory(category_id));
        }

        Ok(())
    }
}

//! User repository for account lookup and profile maintenance.

use moneta_shared::AppError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::users;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Another account already holds this email address.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateEmail(email) => {
                Self::Conflict(format!("Email '{email}' is already registered"))
            }
            UserError::NotFound(_) => Self::NotFound("User not found".to_string()),
            UserError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for updating a user's profile.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::DuplicateEmail`] if the email is already
    /// registered, or a database error.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<users::Model, UserError> {
        if self.email_exists(email).await? {
            return Err(UserError::DuplicateEmail(email.to_string()));
        }

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                UserError::DuplicateEmail(email.to_string())
            }
            _ => UserError::Database(e),
        })
    }

    /// Updates a user's username and/or email.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if the user does not exist, or
    /// [`UserError::DuplicateEmail`] if another account holds the new
    /// email.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        // Moving to a new email requires it to be free of other accounts.
        if let Some(email) = &input.email
            && *email != user.email
        {
            let count = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .filter(users::Column::Id.ne(user_id))
                .count(&self.db)
                .await?;
            if count > 0 {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(email) = input.email.clone() {
            active.email = Set(email);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                UserError::DuplicateEmail(input.email.unwrap_or_default())
            }
            _ => UserError::Database(e),
        })
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if the user does not exist.
    pub async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<users::Model, UserError> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }
}

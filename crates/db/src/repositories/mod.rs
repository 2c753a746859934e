//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every category and transaction lookup is scoped to the
//! acting user, so "absent" and "owned by someone else" are
//! indistinguishable to callers.

pub mod category;
pub mod transaction;
pub mod user;

pub use category::{
    CategoryDeletion, CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};
pub use transaction::{
    CategoryFilter, CreateTransactionInput, TransactionError, TransactionFilter,
    TransactionRepository, UpdateTransactionInput,
};
pub use user::{UpdateUserInput, UserError, UserRepository};

//! Integration tests for the transaction repository.
//!
//! These tests need a migrated Postgres database. They are skipped when
//! `DATABASE_URL` is not set, so the suite stays green on machines
//! without one.

use chrono::{DateTime, TimeZone, Utc};
use moneta_core::dates::{parse_range_end, parse_range_start};
use moneta_db::entities::sea_orm_active_enums::FlowType;
use moneta_db::repositories::{
    CategoryFilter, CreateCategoryInput, CreateTransactionInput, TransactionError,
    TransactionFilter, UpdateTransactionInput,
};
use moneta_db::{CategoryRepository, TransactionRepository, UserRepository};
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

/// Connects to the test database, or returns `None` to skip the test.
async fn connect_or_skip() -> Option<DatabaseConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    match Database::connect(&url).await {
        Ok(db) => Some(db),
        Err(e) => {
            eprintln!("skipping: cannot connect to {url}: {e}");
            None
        }
    }
}

async fn create_user(db: &DatabaseConnection) -> Uuid {
    let repo = UserRepository::new(db.clone());
    let email = format!("test-{}@example.com", Uuid::new_v4());
    repo.create("tester", &email, "$argon2id$test_hash")
        .await
        .expect("Failed to create user")
        .id
}

async fn create_category(db: &DatabaseConnection, user_id: Uuid, name: &str) -> Uuid {
    let repo = CategoryRepository::new(db.clone());
    repo.create(CreateCategoryInput {
        user_id,
        name: name.to_string(),
        flow: FlowType::Expense,
    })
    .await
    .expect("Failed to create category")
    .id
}

async fn record(
    db: &DatabaseConnection,
    user_id: Uuid,
    category_id: Uuid,
    flow: FlowType,
    date: DateTime<Utc>,
) -> Uuid {
    let repo = TransactionRepository::new(db.clone());
    repo.create(CreateTransactionInput {
        user_id,
        category_id,
        flow,
        amount: dec!(10.00),
        date,
        description: None,
    })
    .await
    .expect("Failed to create transaction")
    .id
}

fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn test_transaction_create_and_find() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let date = noon(2024, 3, 1);
    let transaction = repo
        .create(CreateTransactionInput {
            user_id,
            category_id,
            flow: FlowType::Expense,
            amount: dec!(42.50),
            date,
            description: Some("lunch".to_string()),
        })
        .await
        .expect("Failed to create transaction");

    assert_eq!(transaction.user_id, user_id);
    assert_eq!(transaction.category_id, Some(category_id));
    assert_eq!(transaction.flow, FlowType::Expense);
    assert_eq!(transaction.amount, dec!(42.50));
    assert_eq!(transaction.date, date);
    assert_eq!(transaction.description.as_deref(), Some("lunch"));

    let found = repo
        .find_owned(user_id, transaction.id)
        .await
        .expect("Query should succeed")
        .expect("Transaction should exist");
    assert_eq!(found.id, transaction.id);
}

#[tokio::test]
async fn test_transaction_create_unknown_category() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let repo = TransactionRepository::new(db.clone());

    let result = repo
        .create(CreateTransactionInput {
            user_id,
            category_id: Uuid::new_v4(),
            flow: FlowType::Expense,
            amount: dec!(10.00),
            date: noon(2024, 3, 1),
            description: None,
        })
        .await;

    assert!(matches!(result, Err(TransactionError::UnknownCategory(_))));
}

#[tokio::test]
async fn test_transaction_create_foreign_category() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let alices_category = create_category(&db, alice, "food").await;
    let repo = TransactionRepository::new(db.clone());

    // A category owned by someone else counts as unknown
    let result = repo
        .create(CreateTransactionInput {
            user_id: bob,
            category_id: alices_category,
            flow: FlowType::Expense,
            amount: dec!(10.00),
            date: noon(2024, 3, 1),
            description: None,
        })
        .await;

    assert!(matches!(result, Err(TransactionError::UnknownCategory(_))));
}

#[tokio::test]
async fn test_transaction_list_newest_first() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let old = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 1, 15)).await;
    let newest = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 3, 10)).await;
    let middle = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 2, 20)).await;

    let ids: Vec<Uuid> = repo
        .list(user_id, TransactionFilter::default())
        .await
        .expect("Failed to list transactions")
        .into_iter()
        .map(|t| t.id)
        .collect();

    assert_eq!(ids, vec![newest, middle, old]);
}

#[tokio::test]
async fn test_transaction_list_date_window() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let before = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 2, 28)).await;
    let at_midnight = record(
        &db,
        user_id,
        category_id,
        FlowType::Expense,
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    )
    .await;
    let late_evening = record(
        &db,
        user_id,
        category_id,
        FlowType::Expense,
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap(),
    )
    .await;
    let after = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 3, 2)).await;

    // A bare-date window covers the whole named day, both ends inclusive
    let filter = TransactionFilter {
        date_from: Some(parse_range_start("2024-03-01").expect("valid date")),
        date_to: Some(parse_range_end("2024-03-01").expect("valid date")),
        ..Default::default()
    };

    let ids: Vec<Uuid> = repo
        .list(user_id, filter)
        .await
        .expect("Failed to list transactions")
        .into_iter()
        .map(|t| t.id)
        .collect();

    assert!(ids.contains(&at_midnight));
    assert!(ids.contains(&late_evening));
    assert!(!ids.contains(&before));
    assert!(!ids.contains(&after));
}

#[tokio::test]
async fn test_transaction_list_flow_filter() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "salary").await;
    let repo = TransactionRepository::new(db.clone());

    let income = record(&db, user_id, category_id, FlowType::Income, noon(2024, 3, 1)).await;
    let expense = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 3, 2)).await;

    let filter = TransactionFilter {
        flow: Some(FlowType::Income),
        ..Default::default()
    };

    let ids: Vec<Uuid> = repo
        .list(user_id, filter)
        .await
        .expect("Failed to list transactions")
        .into_iter()
        .map(|t| t.id)
        .collect();

    assert!(ids.contains(&income));
    assert!(!ids.contains(&expense));
}

#[tokio::test]
async fn test_transaction_list_category_filters() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let categories = CategoryRepository::new(db.clone());
    let repo = TransactionRepository::new(db.clone());

    // One transaction ends up uncategorized by deleting its category
    // and then the fallback the deletion moved it to
    let doomed = create_category(&db, user_id, "doomed").await;
    let orphan = record(&db, user_id, doomed, FlowType::Expense, noon(2024, 3, 1)).await;
    let deletion = categories
        .delete(user_id, doomed)
        .await
        .expect("Failed to delete category");
    categories
        .delete(user_id, deletion.fallback_id)
        .await
        .expect("Failed to delete fallback");

    let kept = create_category(&db, user_id, "kept").await;
    let filed = record(&db, user_id, kept, FlowType::Expense, noon(2024, 3, 2)).await;

    let all: Vec<Uuid> = repo
        .list(user_id, TransactionFilter::default())
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert!(all.contains(&orphan));
    assert!(all.contains(&filed));

    let uncategorized: Vec<Uuid> = repo
        .list(
            user_id,
            TransactionFilter {
                category: CategoryFilter::Uncategorized,
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(uncategorized, vec![orphan]);

    let by_id: Vec<Uuid> = repo
        .list(
            user_id,
            TransactionFilter {
                category: CategoryFilter::Id(kept),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(by_id, vec![filed]);
}

#[tokio::test]
async fn test_transaction_update_fields() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "food").await;
    let other_category = create_category(&db, user_id, "transport").await;
    let repo = TransactionRepository::new(db.clone());

    let tx_id = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 3, 1)).await;

    let new_date = noon(2024, 4, 2);
    let updated = repo
        .update(
            user_id,
            tx_id,
            UpdateTransactionInput {
                category_id: Some(other_category),
                flow: Some(FlowType::Income),
                amount: Some(dec!(99.99)),
                date: Some(new_date),
                description: Some(Some("refund".to_string())),
            },
        )
        .await
        .expect("Failed to update transaction");

    assert_eq!(updated.category_id, Some(other_category));
    assert_eq!(updated.flow, FlowType::Income);
    assert_eq!(updated.amount, dec!(99.99));
    assert_eq!(updated.date, new_date);
    assert_eq!(updated.description.as_deref(), Some("refund"));

    // A nested None clears the note; omitted fields stay put
    let cleared = repo
        .update(
            user_id,
            tx_id,
            UpdateTransactionInput {
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to clear description");

    assert_eq!(cleared.description, None);
    assert_eq!(cleared.amount, dec!(99.99));
}

#[tokio::test]
async fn test_transaction_update_unknown_category() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let tx_id = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 3, 1)).await;

    let result = repo
        .update(
            user_id,
            tx_id,
            UpdateTransactionInput {
                category_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TransactionError::UnknownCategory(_))));
}

#[tokio::test]
async fn test_transaction_update_scoped_to_owner() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let category_id = create_category(&db, alice, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let tx_id = record(&db, alice, category_id, FlowType::Expense, noon(2024, 3, 1)).await;

    let result = repo
        .update(
            bob,
            tx_id,
            UpdateTransactionInput {
                amount: Some(dec!(1.00)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TransactionError::NotFound(_))));
}

#[tokio::test]
async fn test_transaction_delete() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let user_id = create_user(&db).await;
    let category_id = create_category(&db, user_id, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let tx_id = record(&db, user_id, category_id, FlowType::Expense, noon(2024, 3, 1)).await;

    repo.delete(user_id, tx_id)
        .await
        .expect("Failed to delete transaction");

    let gone = repo
        .find_owned(user_id, tx_id)
        .await
        .expect("Query should succeed");
    assert!(gone.is_none());

    // Deleting again reports not found
    let result = repo.delete(user_id, tx_id).await;
    assert!(matches!(result, Err(TransactionError::NotFound(_))));
}

#[tokio::test]
async fn test_transaction_ownership_isolation() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let alices_category = create_category(&db, alice, "food").await;
    let bobs_category = create_category(&db, bob, "food").await;
    let repo = TransactionRepository::new(db.clone());

    let alices_tx = record(&db, alice, alices_category, FlowType::Expense, noon(2024, 3, 1)).await;
    let bobs_tx = record(&db, bob, bobs_category, FlowType::Expense, noon(2024, 3, 1)).await;

    let alices_list: Vec<Uuid> = repo
        .list(alice, TransactionFilter::default())
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|t| t.id)
        .collect();

    assert!(alices_list.contains(&alices_tx));
    assert!(!alices_list.contains(&bobs_tx));

    // Bob cannot even see Alice's transaction by ID
    let hidden = repo
        .find_owned(bob, alices_tx)
        .await
        .expect("Query should succeed");
    assert!(hidden.is_none());
}

//! Database seeder for Moneta development and testing.
//!
//! Seeds a demo user with starter categories and a month of sample
//! transactions for local development. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use moneta_core::auth::hash_password;
use moneta_db::entities::sea_orm_active_enums::FlowType;
use moneta_db::repositories::{
    CategoryRepository, CreateCategoryInput, CreateTransactionInput, TransactionRepository,
    UserRepository,
};

/// Demo account email (log in with this after seeding).
const DEMO_EMAIL: &str = "demo@moneta.dev";
/// Demo account password.
const DEMO_PASSWORD: &str = "demo-password";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = moneta_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let Some(user_id) = seed_demo_user(&db).await else {
        return;
    };

    println!("Seeding categories...");
    let categories = seed_categories(&db, user_id).await;

    println!("Seeding transactions...");
    seed_transactions(&db, user_id, &categories).await;

    println!("Seeding complete! Log in with {DEMO_EMAIL} / {DEMO_PASSWORD}");
}

/// Seeds the demo user. Returns `None` when the database is already seeded
/// or the user cannot be created.
async fn seed_demo_user(db: &DatabaseConnection) -> Option<Uuid> {
    let repo = UserRepository::new(db.clone());

    match repo.find_by_email(DEMO_EMAIL).await {
        Ok(Some(_)) => {
            println!("Demo user already exists, nothing to do.");
            return None;
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Failed to look up demo user: {e}");
            return None;
        }
    }

    println!("Seeding demo user...");
    let password_hash = hash_password(DEMO_PASSWORD).expect("Failed to hash demo password");

    match repo.create("demo", DEMO_EMAIL, &password_hash).await {
        Ok(user) => {
            println!("  Created demo user: {DEMO_EMAIL}");
            Some(user.id)
        }
        Err(e) => {
            eprintln!("Failed to insert demo user: {e}");
            None
        }
    }
}

/// Seeds starter categories and returns their names with ids.
async fn seed_categories(db: &DatabaseConnection, user_id: Uuid) -> Vec<(String, Uuid)> {
    let repo = CategoryRepository::new(db.clone());

    let starters = [
        ("salary", FlowType::Income),
        ("freelance", FlowType::Income),
        ("groceries", FlowType::Expense),
        ("transport", FlowType::Expense),
        ("entertainment", FlowType::Expense),
        ("utilities", FlowType::Expense),
    ];

    let mut created = Vec::new();
    for (name, flow) in starters {
        match repo
            .create(CreateCategoryInput {
                user_id,
                name: name.to_string(),
                flow,
            })
            .await
        {
            Ok(category) => created.push((category.name, category.id)),
            Err(e) => eprintln!("Failed to insert category {name}: {e}"),
        }
    }

    println!("  Inserted {} categories", created.len());
    created
}

/// Seeds a month of sample transactions against the starter categories.
async fn seed_transactions(
    db: &DatabaseConnection,
    user_id: Uuid,
    categories: &[(String, Uuid)],
) {
    let repo = TransactionRepository::new(db.clone());

    // (category, flow, amount, days ago, description)
    let samples = [
        ("salary", FlowType::Income, "4200.00", 25, "Monthly salary"),
        ("freelance", FlowType::Income, "650.00", 12, "Logo design gig"),
        ("groceries", FlowType::Expense, "82.35", 1, "Weekly shop"),
        ("groceries", FlowType::Expense, "17.80", 3, "Fruit and coffee"),
        (
            "transport",
            FlowType::Expense,
            "49.00",
            5,
            "Monthly transit pass",
        ),
        (
            "entertainment",
            FlowType::Expense,
            "12.50",
            2,
            "Cinema tickets",
        ),
        (
            "utilities",
            FlowType::Expense,
            "95.20",
            8,
            "Electricity bill",
        ),
        ("groceries", FlowType::Expense, "64.10", 9, "Weekly shop"),
    ];

    let now = Utc::now();
    let mut inserted = 0;

    for (category_name, flow, amount, days_ago, description) in samples {
        let Some((_, category_id)) = categories
            .iter()
            .find(|(name, _)| name.as_str() == category_name)
        else {
            continue;
        };

        let amount = Decimal::from_str(amount).expect("sample amounts are valid decimals");

        let input = CreateTransactionInput {
            user_id,
            category_id: *category_id,
            flow,
            amount,
            date: now - Duration::days(days_ago),
            description: Some(description.to_string()),
        };

        if let Err(e) = repo.create(input).await {
            eprintln!("Failed to insert transaction ({description}): {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Inserted {inserted} transactions");
}

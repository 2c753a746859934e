//! Transaction management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
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
use moneta_core::dates::{parse_event_date, parse_range_end, parse_range_start};
use moneta_core::money::{AmountError, parse_amount};
use moneta_db::TransactionRepository;
use moneta_db::entities::transactions;
use moneta_db::repositories::{
    CategoryFilter, CreateTransactionInput, TransactionError, TransactionFilter,
    UpdateTransactionInput,
};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions", post(create_transaction))
        .route("/transactions/{transaction_id}", put(update_transaction))
        .route("/transactions/{transaction_id}", delete(delete_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Inclusive lower date bound (`YYYY-MM-DD` or RFC 3339).
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    /// Inclusive upper date bound (`YYYY-MM-DD` or RFC 3339).
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// Flow direction: "income" or "expense".
    #[serde(rename = "type")]
    pub flow: Option<String>,
    /// Category selector: "All", "Uncategorized", or a category id.
    pub category: Option<String>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Flow direction: "income" or "expense".
    #[serde(rename = "type")]
    pub flow: String,
    /// Category to file the transaction under.
    pub category_id: Uuid,
    /// Amount as a string, e.g. "42.50".
    pub amount: String,
    /// Event date (`YYYY-MM-DD` or RFC 3339).
    pub date: String,
    /// Optional free-form note.
    pub description: Option<String>,
}

/// Request body for updating a transaction. Omitted fields are left
/// unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New flow direction.
    #[serde(rename = "type")]
    pub flow: Option<String>,
    /// New category.
    pub category_id: Option<Uuid>,
    /// New amount as a string.
    pub amount: Option<String>,
    /// New event date.
    pub date: Option<String>,
    /// New note.
    pub description: Option<String>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Category the transaction is filed under, if any.
    pub category_id: Option<Uuid>,
    /// Flow direction.
    #[serde(rename = "type")]
    pub flow: String,
    /// Amount as a string.
    pub amount: String,
    /// Event date as RFC 3339.
    pub date: String,
    /// Free-form note.
    pub description: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

fn transaction_response(transaction: &transactions::Model) -> TransactionResponse {
    TransactionResponse {
        id: transaction.id,
        category_id: transaction.category_id,
        flow: flow_type_to_string(&transaction.flow),
        amount: transaction.amount.to_string(),
        date: transaction.date.to_rfc3339(),
        description: transaction.description.clone(),
        created_at: transaction.created_at.to_rfc3339(),
        updated_at: transaction.updated_at.to_rfc3339(),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /transactions - List the caller's transactions with filters.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let date_from = match query.start_date.as_deref() {
        None => None,
        Some(s) => match parse_range_start(s) {
            Ok(d) => Some(d),
            Err(_) => return invalid_date_response(),
        },
    };

    let date_to = match query.end_date.as_deref() {
        None => None,
        Some(s) => match parse_range_end(s) {
            Ok(d) => Some(d),
            Err(_) => return invalid_date_response(),
        },
    };

    let flow = match query.flow.as_deref() {
        None => None,
        Some(s) => match string_to_flow_type(s) {
            Some(f) => Some(f),
            None => return invalid_type_response(),
        },
    };

    let category = match query.category.as_deref() {
        None => CategoryFilter::All,
        Some(s) => match parse_category_filter(s) {
            Some(c) => c,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_category",
                        "message": "Category must be 'All', 'Uncategorized', or a category id"
                    })),
                )
                    .into_response();
            }
        },
    };

    let filter = TransactionFilter {
        date_from,
        date_to,
        flow,
        category,
    };

    let repo = TransactionRepository::new((*state.db).clone());

    match repo.list(auth.user_id(), filter).await {
        Ok(transactions) => {
            let items: Vec<TransactionResponse> =
                transactions.iter().map(transaction_response).collect();
            (StatusCode::OK, Json(json!({ "transactions": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list transactions");
            error_response(&e.into())
        }
    }
}

/// POST /transactions - Record a new transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let Some(flow) = string_to_flow_type(&payload.flow) else {
        return invalid_type_response();
    };

    let amount = match parse_amount(&payload.amount) {
        Ok(a) => a,
        Err(e) => return invalid_amount_response(&e),
    };

    let date = match parse_event_date(&payload.date) {
        Ok(d) => d,
        Err(_) => return invalid_date_response(),
    };

    let repo = TransactionRepository::new((*state.db).clone());

    match repo
        .create(CreateTransactionInput {
            user_id: auth.user_id(),
            category_id: payload.category_id,
            flow,
            amount,
            date,
            description: payload.description,
        })
        .await
    {
        Ok(transaction) => {
            info!(
                user_id = %auth.user_id(),
                transaction_id = %transaction.id,
                "Transaction created"
            );
            (StatusCode::CREATED, Json(transaction_response(&transaction))).into_response()
        }
        Err(TransactionError::UnknownCategory(id)) => unknown_category_response(id),
        Err(e) => {
            error!(error = %e, "Failed to create transaction");
            error_response(&e.into())
        }
    }
}

/// PUT /transactions/{transaction_id} - Partially update a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let flow = match payload.flow.as_deref() {
        None => None,
        Some(s) => match string_to_flow_type(s) {
            Some(f) => Some(f),
            None => return invalid_type_response(),
        },
    };

    let amount = match payload.amount.as_deref() {
        None => None,
        Some(s) => match parse_amount(s) {
            Ok(a) => Some(a),
            Err(e) => return invalid_amount_response(&e),
        },
    };

    let date = match payload.date.as_deref() {
        None => None,
        Some(s) => match parse_event_date(s) {
            Ok(d) => Some(d),
            Err(_) => return invalid_date_response(),
        },
    };

    let input = UpdateTransactionInput {
        category_id: payload.category_id,
        flow,
        amount,
        date,
        description: payload.description.map(Some),
    };

    let repo = TransactionRepository::new((*state.db).clone());

    match repo.update(auth.user_id(), transaction_id, input).await {
        Ok(transaction) => {
            info!(
                user_id = %auth.user_id(),
                transaction_id = %transaction.id,
                "Transaction updated"
            );
            (StatusCode::OK, Json(transaction_response(&transaction))).into_response()
        }
        Err(TransactionError::NotFound(_)) => not_found_response(),
        Err(TransactionError::UnknownCategory(id)) => unknown_category_response(id),
        Err(e) => {
            error!(error = %e, "Failed to update transaction");
            error_response(&e.into())
        }
    }
}

/// DELETE /transactions/{transaction_id} - Delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TransactionRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), transaction_id).await {
        Ok(()) => {
            info!(
                user_id = %auth.user_id(),
                transaction_id = %transaction_id,
                "Transaction deleted"
            );
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(TransactionError::NotFound(_)) => not_found_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete transaction");
            error_response(&e.into())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses the category query parameter. The sentinels are matched
/// case-insensitively; anything else must be a category id.
fn parse_category_filter(s: &str) -> Option<CategoryFilter> {
    match s.to_lowercase().as_str() {
        "all" => Some(CategoryFilter::All),
        "uncategorized" => Some(CategoryFilter::Uncategorized),
        _ => Uuid::parse_str(s).ok().map(CategoryFilter::Id),
    }
}

fn invalid_type_response() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_type",
            "message": "Type must be 'income' or 'expense'"
        })),
    )
        .into_response()
}

fn invalid_date_response() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_date",
            "message": "Date must be YYYY-MM-DD or RFC 3339"
        })),
    )
        .into_response()
}

fn invalid_amount_response(err: &AmountError) -> axum::response::Response {
    let message = match err {
        AmountError::NotPositive => "Amount must be positive",
        AmountError::NotANumber(_) => "Invalid amount format",
    };

    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_amount", "message": message })),
    )
        .into_response()
}

fn not_found_response() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "Transaction not found"
        })),
    )
        .into_response()
}

fn unknown_category_response(id: Uuid) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "unknown_category",
            "message": format!("Unknown category: {id}")
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_filter_sentinels() {
        assert_eq!(parse_category_filter("All"), Some(CategoryFilter::All));
        assert_eq!(parse_category_filter("all"), Some(CategoryFilter::All));
        assert_eq!(
            parse_category_filter("Uncategorized"),
            Some(CategoryFilter::Uncategorized)
        );
        assert_eq!(
            parse_category_filter("UNCATEGORIZED"),
            Some(CategoryFilter::Uncategorized)
        );
    }

    #[test]
    fn test_parse_category_filter_id() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_category_filter(&id.to_string()),
            Some(CategoryFilter::Id(id))
        );
    }

    #[test]
    fn test_parse_category_filter_rejects_garbage() {
        assert_eq!(parse_category_filter("food"), None);
        assert_eq!(parse_category_filter(""), None);
        assert_eq!(parse_category_filter("123"), None);
    }
}

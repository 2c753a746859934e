//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, middleware::auth::auth_middleware};
use moneta_db::entities::sea_orm_active_enums::FlowType;
use moneta_shared::AppError;

pub mod categories;
pub mod health;
pub mod transactions;
pub mod users;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::protected_routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(users::public_routes())
        .merge(protected_routes)
}

/// Builds the standard error body for an [`AppError`].
///
/// Handlers match the business failures they care about for specific
/// machine codes and fall through to this for everything else.
pub(crate) fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match err {
        AppError::Database(_) | AppError::Internal(_) => "An error occurred".to_string(),
        _ => err.to_string(),
    };

    (
        status,
        Json(json!({ "error": err.error_code(), "message": message })),
    )
        .into_response()
}

/// Converts a flow direction to its wire string.
pub(crate) fn flow_type_to_string(flow: &FlowType) -> String {
    match flow {
        FlowType::Income => "income".to_string(),
        FlowType::Expense => "expense".to_string(),
    }
}

/// Parses a wire string into a flow direction. Anything outside
/// income/expense is rejected.
pub(crate) fn string_to_flow_type(s: &str) -> Option<FlowType> {
    match s.to_lowercase().as_str() {
        "income" => Some(FlowType::Income),
        "expense" => Some(FlowType::Expense),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_flow_type() {
        assert_eq!(string_to_flow_type("income"), Some(FlowType::Income));
        assert_eq!(string_to_flow_type("expense"), Some(FlowType::Expense));
        assert_eq!(string_to_flow_type("INCOME"), Some(FlowType::Income));
        assert_eq!(string_to_flow_type("Expense"), Some(FlowType::Expense));
        assert_eq!(string_to_flow_type("transfer"), None);
        assert_eq!(string_to_flow_type(""), None);
    }

    #[test]
    fn test_flow_type_round_trip() {
        for flow in [FlowType::Income, FlowType::Expense] {
            let s = flow_type_to_string(&flow);
            assert_eq!(string_to_flow_type(&s), Some(flow));
        }
    }
}

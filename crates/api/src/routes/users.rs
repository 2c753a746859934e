//! User routes: registration, login, and profile maintenance.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser, routes::error_response};
use moneta_core::auth::{hash_password, verify_password};
use moneta_db::UserRepository;
use moneta_db::repositories::{UpdateUserInput, UserError};
use moneta_shared::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest,
    UserInfo,
};

/// Creates the routes that work without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
}

/// Creates the routes that require an authenticated user.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(profile))
        .route("/users/change-password", put(change_password))
        .route("/users/update-profile", put(update_profile))
}

/// POST /users/register - Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_input",
                "message": "Username, email, and password are required"
            })),
        )
            .into_response();
    }

    // Hash password; the plaintext never reaches the store
    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during registration"
                })),
            )
                .into_response();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo
        .create(&payload.username, &payload.email, &password_hash)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "New user registered");

            (
                StatusCode::CREATED,
                Json(json!({
                    "user": {
                        "id": user.id,
                        "username": user.username,
                        "email": user.email
                    }
                })),
            )
                .into_response()
        }
        Err(UserError::DuplicateEmail(_)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "email_exists",
                "message": "An account with this email already exists"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            error_response(&e.into())
        }
    }
}

/// POST /users/login - Authenticate and return a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    // Unknown email and wrong password produce the same response, so
    // the endpoint cannot be used to probe for accounts
    let user = match user_repo.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for unknown email");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during login"
                })),
            )
                .into_response();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during login"
                })),
            )
                .into_response();
        }
    }

    let token = match state.jwt_service.generate_token(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during login"
                })),
            )
                .into_response();
        }
    };

    info!(user_id = %user.id, "User logged in");

    let response = LoginResponse {
        user: UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
        },
        token,
        expires_in: state.jwt_service.token_expires_in(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// GET /users/profile - Fetch the authenticated user's profile.
async fn profile(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(json!({
                "id": user.id,
                "username": user.username,
                "email": user.email,
                "created_at": user.created_at.to_rfc3339()
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load profile");
            error_response(&UserError::Database(e).into())
        }
    }
}

/// PUT /users/change-password - Replace the authenticated user's password.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    if payload.new_password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_password",
                "message": "Password must not be empty"
            })),
        )
            .into_response();
    }

    let password_hash = match hash_password(&payload.new_password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo
        .update_password(auth.user_id(), &password_hash)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, "Password changed");
            (StatusCode::OK, Json(json!({ "message": "Password updated" }))).into_response()
        }
        Err(UserError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to change password");
            error_response(&e.into())
        }
    }
}

/// PUT /users/update-profile - Update username and/or email.
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let input = UpdateUserInput {
        username: payload.username,
        email: payload.email,
    };

    match user_repo.update_profile(auth.user_id(), input).await {
        Ok(user) => {
            info!(user_id = %user.id, "Profile updated");
            (
                StatusCode::OK,
                Json(json!({
                    "id": user.id,
                    "username": user.username,
                    "email": user.email,
                    "updated_at": user.updated_at.to_rfc3339()
                })),
            )
                .into_response()
        }
        Err(UserError::DuplicateEmail(_)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "email_exists",
                "message": "An account with this email already exists"
            })),
        )
            .into_response(),
        Err(UserError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update profile");
            error_response(&e.into())
        }
    }
}

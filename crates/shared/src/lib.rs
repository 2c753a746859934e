//! Shared types, errors, and configuration for Moneta.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - JWT claims, auth payloads, and the token service

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};

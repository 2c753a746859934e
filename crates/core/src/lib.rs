//! Core business logic for Moneta.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain validation rules and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing and verification
//! - `category` - Category name normalization and uniqueness rules
//! - `dates` - Event-date parsing and filter bounds
//! - `money` - Decimal amount parsing and validation

pub mod auth;
pub mod category;
pub mod dates;
pub mod money;

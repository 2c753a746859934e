//! `SeaORM` active enums mapped to Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "flow_type")]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Money coming in.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out.
    #[sea_orm(string_value = "expense")]
    Expense,
}

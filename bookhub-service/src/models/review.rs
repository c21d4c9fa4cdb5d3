use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::account::AccountResponse;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub content: String,
    pub rating: i32,
    pub book_id: i64,
    pub user_id: i64,
    pub created_utc: DateTime<Utc>,
}

/// Review together with the account that wrote it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewWithUser {
    #[serde(flatten)]
    pub review: Review,
    pub user: AccountResponse,
}

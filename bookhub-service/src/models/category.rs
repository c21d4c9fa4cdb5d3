use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Link row between a book and one of its categories.
#[derive(Debug, Clone, FromRow)]
pub struct BookCategoryRow {
    pub book_id: i64,
    pub id: i64,
    pub name: String,
}

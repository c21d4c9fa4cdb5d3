use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{Author, Category, Review};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
}

/// Book with its author, categories and reviews resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<Author>,
    pub categories: Vec<Category>,
    pub reviews: Vec<Review>,
}

/// Column a book listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    #[default]
    Id,
    Title,
}

impl BookSort {
    pub fn column(&self) -> &'static str {
        match self {
            BookSort::Id => "b.id",
            BookSort::Title => "b.title",
        }
    }
}

impl std::str::FromStr for BookSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(BookSort::Id),
            "title" => Ok(BookSort::Title),
            _ => Err(format!("Cannot sort books by '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything but `desc` sorts ascending.
    pub fn parse_lenient(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Listing options for `GET /books`.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub sort: BookSort,
    pub order: SortOrder,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_columns_are_sortable() {
        assert_eq!("title".parse::<BookSort>().unwrap(), BookSort::Title);
        assert_eq!("id".parse::<BookSort>().unwrap(), BookSort::Id);
        assert!("title; DROP TABLE books".parse::<BookSort>().is_err());
        assert!("author_id".parse::<BookSort>().is_err());
    }

    #[test]
    fn order_defaults_to_ascending() {
        assert_eq!(SortOrder::parse_lenient("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient("sideways"), SortOrder::Asc);
    }
}

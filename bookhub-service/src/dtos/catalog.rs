use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Ursula K. Le Guin")]
    pub name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Science Fiction")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    #[schema(example = "The Dispossessed")]
    pub title: String,

    #[schema(example = 1)]
    pub author_id: i64,

    #[validate(length(min = 1, message = "Categories must be an array of integers"))]
    #[schema(example = json!([1, 2]))]
    pub categories: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// `title` or `id`
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`
    pub order: Option<String>,
    /// Category name to filter on
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    #[schema(example = "Changed how I think about walls.")]
    pub content: String,

    #[validate(range(min = 1, max = 5, message = "Rating must be an integer between 1 and 5"))]
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: i32,

    #[schema(example = 1)]
    pub book_id: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[validate(range(min = 1, max = 5, message = "Rating must be an integer between 1 and 5"))]
    #[schema(minimum = 1, maximum = 5)]
    pub rating: i32,
}

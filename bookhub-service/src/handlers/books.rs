use service_core::{
    axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};

use crate::{
    dtos::{
        catalog::{BookListParams, BookRequest},
        ErrorResponse, MessageResponse,
    },
    models::{Book, BookDetail, BookQuery, BookSort, SortOrder},
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

impl TryFrom<BookListParams> for BookQuery {
    type Error = AppError;

    fn try_from(params: BookListParams) -> Result<Self, Self::Error> {
        let sort = match params.sort_by.as_deref() {
            None | Some("") => BookSort::default(),
            Some(column) => column
                .parse()
                .map_err(|e: String| AppError::BadRequest(anyhow::anyhow!(e)))?,
        };

        Ok(BookQuery {
            sort,
            order: params
                .order
                .as_deref()
                .map(SortOrder::parse_lenient)
                .unwrap_or_default(),
            category: params.category.filter(|c| !c.is_empty()),
        })
    }
}

/// List books with author, categories and reviews
#[utoipa::path(
    get,
    path = "/books",
    params(BookListParams),
    responses(
        (status = 200, description = "Matching books", body = [BookDetail]),
        (status = 400, description = "Unsupported sort column", body = ErrorResponse)
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = BookQuery::try_from(params)?;
    Ok(Json(state.db.list_books(&query).await?))
}

/// Get a book by id
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let book = state
        .db
        .find_book(id)
        .await?
        .ok_or(ServiceError::NotFound("Book"))?;
    Ok(Json(book))
}

/// Create a book (admin)
#[utoipa::path(
    post,
    path = "/books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or unknown author/category", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    tag = "Books",
    security(("bearer_auth" = []))
)]
pub async fn create_book(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let book = state
        .db
        .create_book(&req.title, req.author_id, &req.categories)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace a book's title, author and categories (admin)
#[utoipa::path(
    put,
    path = "/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input or unknown author/category", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    tag = "Books",
    security(("bearer_auth" = []))
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<BookRequest>,
) -> Result<impl IntoResponse, AppError> {
    let book = state
        .db
        .update_book(id, &req.title, req.author_id, &req.categories)
        .await?;
    Ok(Json(book))
}

/// Delete a book with its category links and reviews (admin)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    tag = "Books",
    security(("bearer_auth" = []))
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_book(id).await?;
    tracing::info!(book_id = id, "Book deleted");
    Ok(Json(MessageResponse::new("Book deleted")))
}

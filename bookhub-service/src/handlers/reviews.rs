use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};

use crate::{
    dtos::{
        catalog::{CreateReviewRequest, UpdateReviewRequest},
        ErrorResponse, MessageResponse,
    },
    middleware::CurrentIdentity,
    models::{Review, ReviewWithUser},
    utils::ValidatedJson,
    AppState,
};

/// List reviews for a book, each with its author account
#[utoipa::path(
    get,
    path = "/reviews/book/{bookId}",
    params(("bookId" = i64, Path, description = "Book id")),
    responses((status = 200, description = "Reviews for the book", body = [ReviewWithUser])),
    tag = "Reviews"
)]
pub async fn list_book_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.reviews_for_book(book_id).await?))
}

/// Review a book as the signed-in caller
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid input or unknown book", body = ErrorResponse),
        (status = 401, description = "Missing credential", body = ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    ValidatedJson(req): ValidatedJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let review = state
        .db
        .create_review(&req.content, req.rating, req.book_id, identity.subject_id)
        .await?;
    tracing::info!(review_id = review.id, user_id = identity.subject_id, "Review created");
    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit a review (owner or admin)
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let review = state.db.update_review(id, &req.content, req.rating).await?;
    Ok(Json(review))
}

/// Delete a review (owner or admin)
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
pub async fn delete_review(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_review(id).await?;
    tracing::info!(review_id = id, deleted_by = identity.subject_id, "Review deleted");
    Ok(Json(MessageResponse::new("Review deleted")))
}

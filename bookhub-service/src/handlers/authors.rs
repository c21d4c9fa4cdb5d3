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
    dtos::{catalog::AuthorRequest, ErrorResponse, MessageResponse},
    models::Author,
    services::ServiceError,
    utils::ValidatedJson,
    AppState,
};

/// List all authors
#[utoipa::path(
    get,
    path = "/authors",
    responses((status = 200, description = "All authors", body = [Author])),
    tag = "Authors"
)]
pub async fn list_authors(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.db.list_authors().await?))
}

/// Get an author by id
#[utoipa::path(
    get,
    path = "/authors/{id}",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author details", body = Author),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    tag = "Authors"
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let author = state
        .db
        .find_author(id)
        .await?
        .ok_or(ServiceError::NotFound("Author"))?;
    Ok(Json(author))
}

/// Create an author (admin)
#[utoipa::path(
    post,
    path = "/authors",
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing credential", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    tag = "Authors",
    security(("bearer_auth" = []))
)]
pub async fn create_author(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AuthorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let author = state
        .db
        .create_author(&req.name, req.bio.as_deref())
        .await?;
    tracing::info!(author_id = author.id, "Author created");
    Ok((StatusCode::CREATED, Json(author)))
}

/// Update an author (admin)
#[utoipa::path(
    put,
    path = "/authors/{id}",
    params(("id" = i64, Path, description = "Author id")),
    request_body = AuthorRequest,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    tag = "Authors",
    security(("bearer_auth" = []))
)]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<AuthorRequest>,
) -> Result<impl IntoResponse, AppError> {
    let author = state
        .db
        .update_author(id, &req.name, req.bio.as_deref())
        .await?;
    Ok(Json(author))
}

/// Delete an author (admin)
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author deleted", body = MessageResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse),
        (status = 409, description = "Author still has books", body = ErrorResponse)
    ),
    tag = "Authors",
    security(("bearer_auth" = []))
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_author(id).await?;
    tracing::info!(author_id = id, "Author deleted");
    Ok(Json(MessageResponse::new("Author deleted")))
}

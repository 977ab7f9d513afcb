//! User handlers.

use super::IdQuery;
use crate::api::AppState;
use crate::api::error_response::{json_rejection, query_rejection};
use crate::types::{User, UserUpdate};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /user/all - List all users
#[utoipa::path(
    get,
    path = "/user/all",
    tag = "users",
    responses(
        (status = 200, description = "All users ordered by id (empty when there are none)", body = Vec<User>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.service.list_users().await))
}

/// GET /user?id=N - Get one user
#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    params(IdQuery),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 400, description = "Missing or non-integer id", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Response {
    let Query(IdQuery { id }) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };

    match state.service.get_user(id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /user/create - Create a user and fetch their portfolio
#[utoipa::path(
    post,
    path = "/user/create",
    tag = "users",
    request_body(content = User, description = "New user; any Portfolio supplied is ignored"),
    responses(
        (status = 201, description = "User created with a freshly fetched portfolio", body = User),
        (status = 400, description = "Malformed JSON", body = crate::error::ApiError),
        (status = 409, description = "A user with this id already exists", body = crate::error::ApiError),
        (status = 415, description = "Body is not application/json", body = crate::error::ApiError),
        (status = 422, description = "Invalid user", body = crate::error::ApiError)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<User>, JsonRejection>,
) -> Response {
    let Json(user) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    match state.service.create_user(user).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// PUT /user/edit?id=N - Replace a user's details and refetch their portfolio
#[utoipa::path(
    put,
    path = "/user/edit",
    tag = "users",
    params(IdQuery),
    request_body(content = UserUpdate, description = "Replacement details"),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Missing or non-integer id, or malformed JSON", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
        (status = 415, description = "Body is not application/json", body = crate::error::ApiError),
        (status = 422, description = "Invalid update", body = crate::error::ApiError)
    )
)]
pub async fn edit_user(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> Response {
    let Query(IdQuery { id }) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    match state.service.edit_user(id, update).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /user/delete?id=N - Delete a user
#[utoipa::path(
    delete,
    path = "/user/delete",
    tag = "users",
    params(IdQuery),
    responses(
        (status = 200, description = "Confirmation message", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing or non-integer id", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Response {
    let Query(IdQuery { id }) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };

    match state.service.delete_user(id).await {
        Ok(_) => (StatusCode::OK, format!("Deleted User {id}")).into_response(),
        Err(e) => e.into_response(),
    }
}

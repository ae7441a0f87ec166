use axum::extract::{
    self, FromRequestParts,
    rejection::{PathRejection, QueryRejection},
};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::error::{AppError, NON_FIELD_ERRORS};

/// `axum::extract::Query` with rejections rendered as JSON validation errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extract::Query(value) = extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        Ok(Query(value))
    }
}

/// `axum::extract::Path` where a segment of the wrong shape reads as an unknown URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extract::Path(value) = extract::Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        Ok(Path(value))
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    tracing::debug!(error = %rejection, "rejected query string");
    AppError::field(NON_FIELD_ERRORS, rejection.body_text())
}

fn path_rejection(rejection: PathRejection) -> AppError {
    tracing::debug!(error = %rejection, "rejected path parameters");
    match rejection {
        PathRejection::FailedToDeserializePathParams(_) => {
            AppError::NotFound("Not found.".to_owned())
        }
        other => AppError::Internal(other.body_text()),
    }
}

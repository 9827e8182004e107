use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};

use bazaar_core::AppError;

use crate::error::ApiError;

/// `axum::Json` with rejections reported as the API's JSON error body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Request body rejected");
                Err(ApiError(AppError::InvalidInput(rejection.body_text())))
            }
        }
    }
}

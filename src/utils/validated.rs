use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::error::{AppError, FieldErrors, NON_FIELD_ERRORS};

/// JSON body extractor that runs `validator` rules before the handler sees the value.
///
/// Malformed JSON and rule violations both become a 400 with field-level messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate().map_err(validation_errors)?;
        Ok(ValidatedJson(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "rejected request body");
    AppError::field(NON_FIELD_ERRORS, rejection.body_text())
}

pub fn validation_errors(errors: ValidationErrors) -> AppError {
    let mut fields = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let key = if field == "__all__" {
            NON_FIELD_ERRORS.to_owned()
        } else {
            field.to_string()
        };
        let messages = errs.iter().map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({}).", e.code))
        });
        fields.entry(key).or_default().extend(messages);
    }
    AppError::Validation(fields)
}

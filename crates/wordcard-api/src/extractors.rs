//! Custom Axum Extractors
//!
//! Body extractors that answer with the API's error shape, and the
//! authenticated-owner extractor used by data handlers.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Form, Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};
use wordcard_auth::{AuthError, AuthenticatedUser, RequestContext};
use wordcard_db::DbUser;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Body Extractors
// =============================================================================

/// JSON body; any parse failure is `Invalid request payload`
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Rejected JSON body");
            ApiError::InvalidPayload
        })?;

        Ok(AppJson(value))
    }
}

/// JSON extractor with validation
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;

        value
            .validate()
            .map_err(|e| ApiError::Validation(format_validation_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// URL-encoded form body
pub struct AppForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Rejected form body");
            ApiError::InvalidPayload
        })?;

        Ok(AppForm(value))
    }
}

/// Format validation errors into a single message, fields in name order
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Current User Extractor
// =============================================================================

/// The stored user behind the request's access token
///
/// Only meaningful on routes behind the auth gate. A token whose user has
/// since disappeared is answered with 401, like a missing identity.
pub struct CurrentUser(pub DbUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext {
            identity: parts.extensions.get::<AuthenticatedUser>().cloned(),
        };

        match state.auth.identity.resolve_user(&ctx).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(AuthError::UserNotFound) => Err(ApiError::AccountGone),
            Err(e) => Err(e.into()),
        }
    }
}

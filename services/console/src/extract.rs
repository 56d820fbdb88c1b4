//! Request extractors

use crate::error::ConsoleError;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::{Form, Json};
use provisioner::MachineForm;

/// Caller's bearer token from the `Authorization` header
#[derive(Clone)]
pub struct BearerToken(pub String);

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ConsoleError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ConsoleError::Unauthorized)?;

        let (scheme, token) = value.split_once(' ').ok_or(ConsoleError::Unauthorized)?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(ConsoleError::Unauthorized);
        }

        Ok(Self(token.to_string()))
    }
}

/// Machine form from a JSON or urlencoded body, chosen by content type
#[derive(Debug, Clone)]
pub struct MachineFormBody(pub MachineForm);

impl<S: Send + Sync> FromRequest<S> for MachineFormBody {
    type Rejection = ConsoleError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let form = if is_json {
            let Json(form) = Json::<MachineForm>::from_request(req, state)
                .await
                .map_err(|e| ConsoleError::BadRequest(e.body_text()))?;
            form
        } else {
            let Form(form) = Form::<MachineForm>::from_request(req, state)
                .await
                .map_err(|e| ConsoleError::BadRequest(e.body_text()))?;
            form
        };

        Ok(Self(form))
    }
}

use super::basic::BasicCredentials;
use actix_web::http::StatusCode;
use actix_web::http::header::{self, Header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};
use actix_web_httpauth::headers::authorization::{Authorization, Basic};
use futures::future::{Ready, ready};
use shared::ErrorResponse;

const BASIC_CHALLENGE: &str = "Basic";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,
    #[error("Invalid authentication credentials")]
    MalformedHeader,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Authentication is not configured")]
    NotConfigured,
}

impl AuthError {
    fn log_message(&self, path: &str) -> String {
        match self {
            AuthError::MissingCredentials => {
                format!("No Authorization header found for path: {}", path)
            }
            AuthError::MalformedHeader => {
                format!("Authorization header for path {} is not valid Basic auth", path)
            }
            AuthError::InvalidCredentials => format!("Credential mismatch for path: {}", path),
            AuthError::NotConfigured => {
                format!("No credentials registered in app data for path: {}", path)
            }
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if self.status_code() == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, BASIC_CHALLENGE));
        }
        builder.json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

fn authenticate(req: &HttpRequest) -> Result<(), AuthError> {
    let expected = req
        .app_data::<web::Data<BasicCredentials>>()
        .ok_or(AuthError::NotConfigured)?;

    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Err(AuthError::MissingCredentials);
    }
    let basic = Authorization::<Basic>::parse(req)
        .map_err(|_| AuthError::MalformedHeader)?
        .into_scheme();

    if expected.verify(basic.user_id(), basic.password().unwrap_or_default()) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Extractor that admits the request only when it carries the configured
/// Basic credentials. Put it first in the handler signature so the gate runs
/// before the body is read.
pub struct BasicAuthenticated;

impl FromRequest for BasicAuthenticated {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let outcome = authenticate(req).map(|_| BasicAuthenticated);
        if let Err(auth_error) = &outcome {
            log::warn!("{}", auth_error.log_message(req.path()));
        }
        ready(outcome)
    }
}

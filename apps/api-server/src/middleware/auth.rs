//! Admin API key middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};

use inkwell_core::ports::{AuthError, KeyVerifier};

use super::{AppError, client_identity, key_prefix};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// A failed key check: what the client gets and what the log records.
#[derive(Debug)]
struct Rejection {
    error: AppError,
    reason: &'static str,
    /// Only for a wrong key; never the whole key.
    key_prefix: Option<String>,
}

impl Rejection {
    fn from_verdict(verdict: Result<(), AuthError>, provided: Option<&str>) -> Option<Self> {
        let (error, reason, key_prefix) = match verdict {
            Ok(()) => return None,
            Err(AuthError::NotConfigured) => (
                AppError::Misconfigured("Admin API keys not configured"),
                "Admin API keys not configured",
                None,
            ),
            Err(AuthError::MissingKey) => (AppError::Unauthorized, "Missing API key", None),
            Err(AuthError::InvalidKey) => (
                AppError::Unauthorized,
                "Invalid API key",
                provided.map(key_prefix),
            ),
        };
        Some(Self {
            error,
            reason,
            key_prefix,
        })
    }

    fn misconfigured(&self) -> bool {
        matches!(self.error, AppError::Misconfigured(_))
    }
}

/// Requires a valid `X-API-Key` header.
///
/// Missing and invalid keys get the same 401 body; an empty key set fails
/// closed with 500.
#[derive(Clone)]
pub struct ApiKeyAuth {
    verifier: Arc<dyn KeyVerifier>,
    trust_proxy: bool,
}

impl ApiKeyAuth {
    pub fn new(verifier: Arc<dyn KeyVerifier>, trust_proxy: bool) -> Self {
        Self {
            verifier,
            trust_proxy,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthService {
            service,
            verifier: self.verifier.clone(),
            trust_proxy: self.trust_proxy,
        }))
    }
}

pub struct ApiKeyAuthService<S> {
    service: S,
    verifier: Arc<dyn KeyVerifier>,
    trust_proxy: bool,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|k| !k.is_empty());

        if let Some(rejection) = Rejection::from_verdict(self.verifier.verify(provided), provided) {
            let client = client_identity(req.request(), self.trust_proxy);
            if rejection.misconfigured() {
                tracing::error!(
                    client = %client,
                    method = %req.method(),
                    path = %req.path(),
                    "{}", rejection.reason
                );
            } else {
                tracing::warn!(
                    client = %client,
                    method = %req.method(),
                    path = %req.path(),
                    key_prefix = rejection.key_prefix.as_deref(),
                    "{}", rejection.reason
                );
            }

            let response = rejection.error.error_response();
            let (http_req, _payload) = req.into_parts();
            let srv_response = ServiceResponse::new(http_req, response);
            return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
        }
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

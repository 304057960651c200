//! Input sanitizer - rejects query and path values carrying injection patterns.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::LazyLock;

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use regex::Regex;

use super::{AppError, client_identity};

/// Operator and script fragments, matched case-insensitively as substrings.
const SUSPICIOUS_FRAGMENTS: &[&str] = &[
    "$where",
    "$ne",
    "$gt",
    "$lt",
    "$regex",
    "$or",
    "$and",
    "$nor",
    "$not",
    "$exists",
    "$type",
    "$mod",
    "$text",
    "$search",
    "javascript:",
    "<script",
    "eval(",
    "function(",
];

static SCRIPT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(function\s*\(|eval\s*\(|this\.|document\.|window\.)")
        .expect("script pattern")
});

/// True if `input` contains a blocked fragment or a script-like construct.
pub fn is_suspicious(input: &str) -> bool {
    let lower = input.to_lowercase();
    SUSPICIOUS_FRAGMENTS.iter().any(|f| lower.contains(f)) || SCRIPT_PATTERN.is_match(input)
}

/// Finds the first offending `(name, value)` pair among the query string and
/// the matched path parameters.
fn find_suspicious(req: &ServiceRequest) -> Option<(String, String)> {
    let query = req.query_string();
    if !query.is_empty() {
        match web::Query::<Vec<(String, String)>>::from_query(query) {
            Ok(pairs) => {
                if let Some((key, value)) = pairs
                    .into_inner()
                    .into_iter()
                    .find(|(k, v)| is_suspicious(k) || is_suspicious(v))
                {
                    return Some((key, value));
                }
            }
            // Undecodable query: judge the raw text
            Err(_) if is_suspicious(query) => return Some(("query".to_string(), query.to_string())),
            Err(_) => {}
        }
    }

    req.match_info()
        .iter()
        .find(|(_, value)| is_suspicious(value))
        .map(|(key, value)| (key.to_string(), value.to_string()))
}

/// Sanitizer middleware factory. Attach it at resource level so path
/// parameters have been matched by the time it runs.
#[derive(Clone, Copy)]
pub struct InputSanitizer {
    trust_proxy: bool,
}

impl InputSanitizer {
    pub fn new(trust_proxy: bool) -> Self {
        Self { trust_proxy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for InputSanitizer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = InputSanitizerService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(InputSanitizerService {
            service,
            trust_proxy: self.trust_proxy,
        }))
    }
}

pub struct InputSanitizerService<S> {
    service: S,
    trust_proxy: bool,
}

impl<S, B> Service<ServiceRequest> for InputSanitizerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some((param, value)) = find_suspicious(&req) {
            tracing::warn!(
                client = %client_identity(req.request(), self.trust_proxy),
                method = %req.method(),
                path = %req.path(),
                param = %param,
                value = %value,
                "Suspicious input rejected"
            );

            let response = AppError::InvalidInput.error_response();
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

//! Middleware modules and the client identity used for rate limiting and engagement.

use std::future::{Ready, ready};
use std::net::SocketAddr;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};

use crate::state::AppState;

pub mod auth;
pub mod cors;
pub mod error;
pub mod rate_limit;
pub mod sanitize;

pub use auth::ApiKeyAuth;
pub use cors::Cors;
pub use error::{AppError, AppResult};
pub use rate_limit::{PublicTiers, RateLimitMiddleware};
pub use sanitize::InputSanitizer;

/// Identity key of the calling client: its IP address.
///
/// Proxy headers are honoured only when `trust_proxy` is set; otherwise the
/// socket peer address is used. Falls back to `"unknown"`.
pub fn client_identity(req: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return strip_port(addr);
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn strip_port(addr: &str) -> String {
    addr.parse::<SocketAddr>()
        .map(|socket| socket.ip().to_string())
        .unwrap_or_else(|_| addr.to_string())
}

/// First eight characters of a secret, for logs.
pub(crate) fn key_prefix(key: &str) -> String {
    key.chars().take(8).collect()
}

/// Extractor for the client identity key.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequest for ClientIp {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let trust_proxy = req
            .app_data::<web::Data<AppState>>()
            .is_some_and(|state| state.config.trust_proxy_headers);

        ready(Ok(ClientIp(client_identity(req, trust_proxy))))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_identity_ignores_proxy_headers_by_default() {
        let req = TestRequest::default()
            .peer_addr("10.1.2.3:5555".parse().unwrap())
            .insert_header(("X-Forwarded-For", "203.0.113.9"))
            .to_http_request();

        assert_eq!(client_identity(&req, false), "10.1.2.3");
        assert_eq!(client_identity(&req, true), "203.0.113.9");
    }

    #[test]
    fn test_identity_without_peer() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(client_identity(&req, false), "unknown");
    }

    #[test]
    fn test_key_prefix_is_char_safe() {
        assert_eq!(key_prefix("abcdefghijkl"), "abcdefgh");
        assert_eq!(key_prefix("short"), "short");
        assert_eq!(key_prefix("ключключключ"), "ключключ");
    }
}

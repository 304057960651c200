//! Rate limiting middleware over the sliding-window limiter.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{
    Error, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
};

use inkwell_core::ports::{Quota, RateLimiter};

use super::{AppError, client_identity};
use crate::config::RateLimitConfig;

/// Quotas for public routes, picked per request.
#[derive(Debug, Clone, Copy)]
pub struct PublicTiers {
    /// Read-only browsing.
    pub browse: Quota,
    /// Like, dislike and view.
    pub social: Quota,
    pub default: Quota,
}

impl PublicTiers {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            browse: Quota::new(config.public_get_per_window, config.window),
            social: Quota::new(config.public_social_per_window, config.window),
            default: Quota::new(config.public_default_per_window, config.window),
        }
    }

    pub fn quota_for(&self, method: &Method, path: &str) -> Quota {
        let path = path.trim_end_matches('/');
        if method == Method::GET {
            self.browse
        } else if path.ends_with("/like") || path.ends_with("/dislike") || path.ends_with("/view")
        {
            self.social
        } else {
            self.default
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Policy {
    Fixed(Quota),
    Tiered(PublicTiers),
}

impl Policy {
    fn quota_for(&self, method: &Method, path: &str) -> Quota {
        match self {
            Policy::Fixed(quota) => *quota,
            Policy::Tiered(tiers) => tiers.quota_for(method, path),
        }
    }
}

/// Rate limiting middleware factory.
///
/// Requests are keyed by client identity. A rejected request is answered with
/// 429 and a `Retry-After` header and never reaches the inner service.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    policy: Policy,
    trust_proxy: bool,
}

impl RateLimitMiddleware {
    /// One quota for every request, used in front of admin routes.
    pub fn admin(limiter: Arc<dyn RateLimiter>, quota: Quota, trust_proxy: bool) -> Self {
        Self {
            limiter,
            policy: Policy::Fixed(quota),
            trust_proxy,
        }
    }

    /// Quota chosen by method and path.
    pub fn public(limiter: Arc<dyn RateLimiter>, tiers: PublicTiers, trust_proxy: bool) -> Self {
        Self {
            limiter,
            policy: Policy::Tiered(tiers),
            trust_proxy,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service,
            limiter: self.limiter.clone(),
            policy: self.policy,
            trust_proxy: self.trust_proxy,
        }))
    }
}

pub struct RateLimitService<S> {
    service: S,
    limiter: Arc<dyn RateLimiter>,
    policy: Policy,
    trust_proxy: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = client_identity(req.request(), self.trust_proxy);
        let quota = self.policy.quota_for(req.method(), req.path());
        let result = self.limiter.check(&identity, quota);

        if !result.allowed {
            tracing::warn!(
                client = %identity,
                method = %req.method(),
                path = %req.path(),
                limit = quota.max_requests,
                "Rate limit exceeded"
            );

            let response = AppError::RateLimited {
                retry_after: result.reset_after,
            }
            .error_response();
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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{App, HttpResponse, http::StatusCode, web};
    use actix_web::test::{TestRequest, call_service, init_service};
    use inkwell_infra::SlidingWindowRateLimiter;

    use super::*;

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn tiers() -> PublicTiers {
        PublicTiers::from_config(&RateLimitConfig::default())
    }

    #[test]
    fn test_public_tier_selection() {
        let tiers = tiers();

        assert_eq!(tiers.quota_for(&Method::GET, "/api/v1/posts").max_requests, 120);
        assert_eq!(tiers.quota_for(&Method::GET, "/api/v1/posts/x/like").max_requests, 120);
        assert_eq!(tiers.quota_for(&Method::PUT, "/api/v1/posts/x/like").max_requests, 60);
        assert_eq!(tiers.quota_for(&Method::POST, "/api/v1/posts/x/view/").max_requests, 60);
        assert_eq!(tiers.quota_for(&Method::PUT, "/api/v1/posts/x/dislike").max_requests, 60);
        assert_eq!(tiers.quota_for(&Method::POST, "/api/v1/posts").max_requests, 100);
        assert_eq!(tiers.quota_for(&Method::PUT, "/api/v1/posts/x/views").max_requests, 100);
    }

    #[actix_web::test]
    async fn test_admin_quota_rejects_with_retry_after() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(SlidingWindowRateLimiter::new());
        let quota = Quota::new(2, Duration::from_secs(60));
        let app = init_service(App::new().route(
            "/",
            web::post()
                .to(ok)
                .wrap(RateLimitMiddleware::admin(limiter, quota, false)),
        ))
        .await;

        for _ in 0..2 {
            let req = TestRequest::post()
                .uri("/")
                .peer_addr("10.0.0.1:1000".parse().unwrap())
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = TestRequest::post()
            .uri("/")
            .peer_addr("10.0.0.1:1000".parse().unwrap())
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = res
            .headers()
            .get("Retry-After")
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));

        // Another client has its own window
        let req = TestRequest::post()
            .uri("/")
            .peer_addr("10.0.0.2:1000".parse().unwrap())
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
    }
}

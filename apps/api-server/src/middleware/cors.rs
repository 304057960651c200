//! CORS middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{
        Method,
        header::{self, HeaderMap, HeaderValue},
    },
};

const ALLOW_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, \
Authorization, X-API-Key, accept, origin, Cache-Control, X-Requested-With";
const ALLOW_METHODS: &str = "POST, OPTIONS, GET, PUT, DELETE";

/// CORS middleware factory.
///
/// With an empty allow-list every origin is allowed (`*`). Otherwise the
/// request's `Origin` is echoed back only on an exact match. Preflight
/// `OPTIONS` requests are answered with 204 and never reach a handler.
#[derive(Clone)]
pub struct Cors {
    allowed_origins: Arc<Vec<String>>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsService {
            service,
            allowed_origins: self.allowed_origins.clone(),
        }))
    }
}

pub struct CorsService<S> {
    service: S,
    allowed_origins: Arc<Vec<String>>,
}

impl<S> CorsService<S> {
    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        if self.allowed_origins.is_empty() {
            return Some(HeaderValue::from_static("*"));
        }
        origin
            .filter(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
            .and_then(|o| HeaderValue::from_str(o).ok())
    }
}

fn apply_headers(headers: &mut HeaderMap, allow_origin: Option<HeaderValue>, echoed: bool) {
    if let Some(origin) = allow_origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    if echoed {
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
}

impl<S, B> Service<ServiceRequest> for CorsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok());
        let allow_origin = self.allow_origin(origin);
        let echoed = !self.allowed_origins.is_empty();

        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::NoContent().finish();
            apply_headers(response.headers_mut(), allow_origin, echoed);

            let (http_req, _payload) = req.into_parts();
            let srv_response = ServiceResponse::new(http_req, response);
            return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            apply_headers(res.headers_mut(), allow_origin, echoed);
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};

    use super::*;

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_wildcard_without_allow_list() {
        let app = test::init_service(
            App::new()
                .wrap(Cors::new(vec![]))
                .route("/", web::get().to(ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "https://anywhere.example"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        assert_eq!(
            res.headers().get("Access-Control-Allow-Credentials").unwrap(),
            "true"
        );
    }

    #[actix_web::test]
    async fn test_allow_list_echoes_exact_match_only() {
        let app = test::init_service(
            App::new()
                .wrap(Cors::new(vec!["https://blog.example".to_string()]))
                .route("/", web::get().to(ok)),
        )
        .await;

        let allowed = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "https://blog.example"))
            .to_request();
        let res = test::call_service(&app, allowed).await;
        assert_eq!(
            res.headers().get("Access-Control-Allow-Origin").unwrap(),
            "https://blog.example"
        );

        let denied = test::TestRequest::get()
            .uri("/")
            .insert_header(("Origin", "https://blog.example.evil"))
            .to_request();
        let res = test::call_service(&app, denied).await;
        assert!(res.headers().get("Access-Control-Allow-Origin").is_none());
        assert_eq!(
            res.headers().get("Access-Control-Allow-Methods").unwrap(),
            ALLOW_METHODS
        );
    }

    #[actix_web::test]
    async fn test_preflight_short_circuits() {
        let app = test::init_service(
            App::new()
                .wrap(Cors::new(vec![]))
                .route("/", web::post().to(ok)),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(
            res.headers()
                .get("Access-Control-Allow-Headers")
                .unwrap()
                .to_str()
                .unwrap()
                .contains("X-API-Key")
        );
    }
}

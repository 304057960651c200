//! Application factory shared by the server and the HTTP tests.

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web,
};
use tracing_actix_web::TracingLogger;

use crate::handlers;
use crate::middleware::Cors;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

/// Build the app: request id outermost, then the request span, then CORS.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let cors = Cors::new(state.config.allowed_origins.clone());

    App::new()
        .app_data(handlers::json_config())
        .app_data(handlers::query_config())
        .app_data(web::Data::new(state.clone()))
        .configure(|cfg| handlers::configure_routes(cfg, &state))
        .wrap(cors)
        .wrap(TracingLogger::default())
        .wrap(RequestIdMiddleware)
}

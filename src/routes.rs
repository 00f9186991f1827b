use std::sync::Arc;

use log::{error, warn, Logger};
use warp::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
};
use warp::http::{Method, StatusCode};
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::Environment;
use crate::errors::BackendError;

mod handlers;
mod rejection;
mod response;

pub use internal::*;
pub use rejection::FlattenedRejection;

/// Methods advertised when a preflight request does not name one.
const CORS_METHODS: &str = "GET, POST, OPTIONS";

const CORS_MAX_AGE_SECS: &str = "86400";

/// Builds every route, with errors formatted and CORS applied.
pub fn make_routes(
    environment: Environment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    let routes = make_chart_route(environment.clone())
        .or(make_health_route(environment))
        .recover(move |r| format_rejection(logger.clone(), r))
        .with(cors());

    preflight().or(routes)
}

/// Adds `access-control-allow-origin` to responses for any origin.
pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
}

/// Answers CORS preflight requests for every origin, method and header
/// by echoing back whatever the browser asks for.
///
/// Anything that is not a preflight is rejected as not found, so the
/// rejection from the real routes always wins.
pub fn preflight() -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    warp::method()
        .and(warp::header::optional::<String>("origin"))
        .and(warp::header::optional::<String>(
            "access-control-request-method",
        ))
        .and(warp::header::optional::<String>(
            "access-control-request-headers",
        ))
        .and_then(
            |method: Method,
             origin: Option<String>,
             requested_method: Option<String>,
             requested_headers: Option<String>| async move {
                if method != Method::OPTIONS || origin.is_none() {
                    return Err(reject::not_found());
                }

                Ok(preflight_response(requested_method, requested_headers))
            },
        )
}

fn preflight_response(
    requested_method: Option<String>,
    requested_headers: Option<String>,
) -> warp::reply::Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(CORS_MAX_AGE_SECS),
    );

    let methods = requested_method
        .and_then(|m| HeaderValue::from_str(&m).ok())
        .unwrap_or_else(|| HeaderValue::from_static(CORS_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, methods);

    if let Some(allowed) = requested_headers.and_then(|h| HeaderValue::from_str(&h).ok()) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed);
    }

    response
}

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if status.is_server_error() {
            error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            warn!(logger, "Rejected request"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        return Ok(with_status(json(&r.flatten()), status));
    }

    if let Some(e) = rej.find::<reject::PayloadTooLarge>() {
        return Ok(with_status(
            json(&FlattenedRejection::new(e)),
            StatusCode::PAYLOAD_TOO_LARGE,
        ));
    }

    if let Some(e) = rej.find::<reject::LengthRequired>() {
        return Ok(with_status(
            json(&FlattenedRejection::new(e)),
            StatusCode::LENGTH_REQUIRED,
        ));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        MalformedRequest(..) => StatusCode::UNPROCESSABLE_ENTITY,
        InvalidDateTime { .. } | InvalidGender(..) | EmptyName | InvalidBirthData(..) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::body::{bytes, content_length_limit};
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, path as p, post};

    use super::handlers;
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident, $environment:ident; $($filters:expr),+) => (
        pub fn $name($environment: Environment) -> Route {
            let $route_variable = warp::any()
                .map({
                    let environment = $environment.clone();
                    move || environment.clone()
                });

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_chart_route => chart, rt, environment; p("chart"), end(), post(), content_length_limit(environment.config.max_content_length), bytes());
    route!(make_health_route => health, rt, environment; p("health"), end(), g());
}

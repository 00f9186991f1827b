use std::convert::TryFrom;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, o};
use uuid::Uuid;
use warp::{
    hyper::body::Bytes,
    reject,
    reply::{json, with_header, Reply},
};

use crate::birth::{BirthData, BirthDataRequest};
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn chart(environment: Environment, body: Bytes) -> RouteResult {
    timed! {
        let request_id = Uuid::new_v4();
        let logger = Arc::new(environment.logger.new(o!("request" => request_id.to_string())));

        let error_handler = |e: BackendError| Rejection::new(Context::chart(request_id), e);

        debug!(logger, "Parsing birth data...");
        let request = BirthDataRequest::from_slice(&body).map_err(error_handler)?;
        let data = BirthData::try_from(request).map_err(error_handler)?;

        debug!(logger, "Requesting chart...");
        let chart = environment
            .gateway
            .generate(logger.clone(), data)
            .await
            .map_err(error_handler)?;

        debug!(logger, "Sending response..."; "keys" => chart.len());
        json(&SuccessResponse::Chart {
            success: true,
            data: &chart,
        })
    }
}

pub async fn health(_environment: Environment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Health { status: "ok" })
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}

use std::error::Error;
use std::sync::Arc;

use chart_backend::config::{
    get_generator, get_optional_variable, get_timeout, parse_variable, split_arguments,
};
use chart_backend::environment::{Config, Environment};
use chart_backend::gateway::Gateway;
use chart_backend::library::mock::{Behavior, MockLibrary};
use chart_backend::library::process::ProcessLibrary;
use chart_backend::routes;
use log::{info, initialize_logger, warn, Logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger(env!("CARGO_PKG_VERSION"));

    let port: u16 = parse_variable("BACKEND_PORT");
    let timeout = get_timeout("BACKEND_CHART_TIMEOUT_SECS");

    info!(logger, "Starting..."; "port" => port, "timeout" => ?timeout);

    let gateway = Arc::new(make_gateway(&logger, timeout));
    let logger = Arc::new(logger);

    let environment = Environment::new(logger.clone(), gateway, Config::default());
    let routes = routes::make_routes(environment);

    let (_, server) =
        warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async {
            tokio::signal::ctrl_c()
                .await
                .expect("install Ctrl-C handler");
        });

    server.await;

    info!(logger, "Exiting gracefully...");

    Ok(())
}

fn make_gateway(logger: &Logger, timeout: Option<std::time::Duration>) -> Gateway {
    let library = get_optional_variable("BACKEND_LIBRARY").unwrap_or_else(|| "process".to_owned());

    match library.as_str() {
        "mock" => {
            warn!(logger, "Using the mock library; charts will only echo their input");
            Gateway::new(MockLibrary::new(Behavior::InMemory), timeout)
        }
        "process" => {
            let generator = get_generator(get_optional_variable("BACKEND_GENERATOR_PATH"))
                .expect("must define BACKEND_GENERATOR_PATH or install the chart generator on PATH");
            let args = split_arguments(get_optional_variable("BACKEND_GENERATOR_ARGS"));

            info!(logger, "Using chart generator"; "path" => %generator.display(), "args" => ?args);
            Gateway::new(ProcessLibrary::new(generator, args), timeout)
        }
        other => panic!("unknown BACKEND_LIBRARY {:?}; expected `process` or `mock`", other),
    }
}

//! Runs one chart request through the gateway without starting the
//! HTTP server, to check a generator against the real library.

use std::convert::TryFrom;
use std::error::Error;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use structopt::StructOpt;

use chart_backend::birth::{BirthData, BirthDataRequest};
use chart_backend::config::get_generator;
use chart_backend::gateway::Gateway;
use chart_backend::library::process::ProcessLibrary;
use chart_backend::routes::FlattenedRejection;
use log::{o, Discard, Logger};

#[derive(StructOpt)]
#[structopt(about = "Generates one chart from a request file.")]
struct Opt {
    /// A JSON file shaped like a `POST /chart` body.
    #[structopt(parse(from_os_str))]
    request: PathBuf,

    /// The chart generator to run. Defaults to `BACKEND_GENERATOR_PATH`,
    /// then to the generator on `PATH`.
    #[structopt(short, long, parse(from_os_str))]
    generator: Option<PathBuf>,

    /// Arguments to pass to the generator before its own flags.
    #[structopt(short = "a", long = "arg", parse(from_os_str), number_of_values = 1)]
    args: Vec<OsString>,

    /// Give up after this many seconds.
    #[structopt(short, long)]
    timeout: Option<u64>,

    /// Log every step to standard error as JSON.
    #[structopt(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let opt = Opt::from_args();

    let logger = if opt.verbose {
        log::initialize_logger(env!("CARGO_PKG_VERSION"))
    } else {
        Logger::root(Discard, o!())
    };

    let generator = opt
        .generator
        .or_else(|| get_generator(std::env::var("BACKEND_GENERATOR_PATH").ok()))
        .ok_or("no chart generator configured")?;

    let gateway = Gateway::new(
        ProcessLibrary::new(generator, opt.args),
        opt.timeout.map(Duration::from_secs),
    );

    let raw = fs::read(&opt.request)?;

    let result = match BirthDataRequest::from_slice(&raw).and_then(BirthData::try_from) {
        Ok(data) => gateway.generate(Arc::new(logger), data).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(chart) => {
            let envelope = serde_json::json!({ "success": true, "data": chart });
            println!("{}", serde_json::to_string_pretty(&envelope)?);

            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&FlattenedRejection::new(&e))?);

            Err(e.into())
        }
    }
}

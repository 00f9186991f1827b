use std::io::Write;
use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Discard, Logger};

/// Builds the JSON root logger that writes to standard error.
///
/// `version` is the version of the binary doing the logging, usually
/// its own `env!("CARGO_PKG_VERSION")`.
pub fn initialize_logger(version: &'static str) -> Logger {
    let drain = Async::new(json_drain(std::io::stderr())).build().fuse();

    Logger::root(drain, root_values(version))
}

/// Installs a `RUST_LOG`-filtered global logger instead of the JSON
/// one. The guard must be kept alive for as long as logging is needed.
#[cfg(feature = "env_logging")]
pub fn initialize_env_logger(version: &'static str) -> (Logger, slog_scope::GlobalLoggerGuard) {
    let guard = slog_envlogger::init().expect("initialize slog-envlogger");
    let logger = slog_scope::logger().new(root_values(version));

    (logger, guard)
}

fn json_drain<W: Write + Send + 'static>(writer: W) -> Fuse<Mutex<Json<W>>> {
    Mutex::new(Json::default(writer)).map(Fuse)
}

fn root_values(version: &'static str) -> slog::OwnedKV<impl slog::SendSyncRefUnwindSafeKV> {
    o!(
        "service" => info::NAME,
        "version" => version,
        "revision" => info::REVISION,
        "build_timestamp" => info::BUILD_TIMESTAMP
    )
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn records_carry_the_caller_version() {
        let buffer = Buffer::default();
        let logger = Logger::root(json_drain(buffer.clone()), root_values("1.0.0"));

        info!(logger, "Starting...");

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).expect("decode log");
        assert!(written.contains(r#""version":"1.0.0""#), "{}", written);
        assert!(written.contains(r#""service":"chart-backend""#), "{}", written);
    }
}

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// The executable looked up on `PATH` when no generator is configured.
pub const DEFAULT_GENERATOR: &str = "jyotishyamitra-chart";

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable if it exists and
/// isn't blank.
pub fn get_optional_variable(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses the named environment variable or panics.
pub fn parse_variable<T: FromStr>(name: &str) -> T {
    get_variable(name)
        .parse()
        .unwrap_or_else(|_| panic!("parse {} as {}", name, std::any::type_name::<T>()))
}

/// Reads an optional timeout in whole seconds. Zero disables it.
pub fn get_timeout(name: &str) -> Option<Duration> {
    get_optional_variable(name).and_then(|v| {
        let seconds: u64 = v
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("parse {} as a number of seconds", name));

        if seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(seconds))
        }
    })
}

/// Splits leading generator arguments on whitespace.
pub fn split_arguments(raw: Option<String>) -> Vec<OsString> {
    raw.map(|raw| raw.split_whitespace().map(OsString::from).collect())
        .unwrap_or_default()
}

#[cfg(feature = "which")]
pub fn get_generator(env: Option<String>) -> Option<PathBuf> {
    use which::which;

    env.map(PathBuf::from)
        .or_else(|| which(DEFAULT_GENERATOR).ok())
}

#[cfg(not(feature = "which"))]
pub fn get_generator(env: Option<String>) -> Option<PathBuf> {
    env.map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_split_on_whitespace() {
        assert_eq!(
            split_arguments(Some(" /opt/chart/run.py  --ayanamsa lahiri ".to_owned())),
            vec![
                OsString::from("/opt/chart/run.py"),
                OsString::from("--ayanamsa"),
                OsString::from("lahiri"),
            ]
        );
        assert!(split_arguments(None).is_empty());
    }

    #[test]
    fn configured_generators_win() {
        assert_eq!(
            get_generator(Some("/usr/local/bin/chart".to_owned())),
            Some(PathBuf::from("/usr/local/bin/chart"))
        );
    }
}

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lazy_static::lazy_static;
use tempfile::NamedTempFile;

use super::{check_record, BirthRecord, Generated, Library};
use crate::errors::LibraryError;

lazy_static! {
    static ref INPUT_FLAG: OsString = OsString::from("--input");
    static ref VALIDATE_FLAG: OsString = OsString::from("--validate-only");
    static ref OUTPUT_DIR_FLAG: OsString = OsString::from("--output-dir");
    static ref OUTPUT_NAME_FLAG: OsString = OsString::from("--output-name");
}

/// The exit status a generator uses to reject birth data (`EX_DATAERR`).
pub const INVALID_INPUT_STATUS: i32 = 65;

/// A library that keeps the birth-data slot in memory and hands
/// validation and generation to an external executable.
///
/// The generator is invoked as `<program> [args…] --input <file>`, where
/// `<file>` holds the stored record as JSON.
///
/// * With `--validate-only` appended it must run the library's own
///   validation and exit successfully if the record is accepted.
/// * Otherwise it must print the chart as a JSON object. Once an output
///   location is configured it is invoked with
///   `--output-dir <dir> --output-name <name>` appended and may write
///   `<dir>/<name>.json` instead of printing.
///
/// Either way, exiting with [`INVALID_INPUT_STATUS`] means the library
/// refused the record; its standard error is the reason.
/// `scripts/jyotishyamitra-chart.py` implements this for jyotishyamitra.
pub struct ProcessLibrary {
    program: PathBuf,
    args: Vec<OsString>,
    slot: Option<BirthRecord>,
    valid: bool,
    output: Option<(PathBuf, String)>,
}

impl ProcessLibrary {
    pub fn new(program: impl AsRef<Path>, args: Vec<OsString>) -> Self {
        ProcessLibrary {
            program: program.as_ref().to_owned(),
            args,
            slot: None,
            valid: false,
            output: None,
        }
    }

    fn command(&self, input: &Path, validate_only: bool) -> Command {
        let mut command = Command::new(&self.program);

        command
            .args(&self.args)
            .arg(INPUT_FLAG.as_os_str())
            .arg(input);

        if validate_only {
            command.arg(VALIDATE_FLAG.as_os_str());
        } else if let Some((dir, name)) = &self.output {
            command
                .arg(OUTPUT_DIR_FLAG.as_os_str())
                .arg(dir)
                .arg(OUTPUT_NAME_FLAG.as_os_str())
                .arg(name);
        }

        command
    }

    /// Runs the generator on `record` and returns its output if it exited
    /// successfully.
    fn run(&self, record: &BirthRecord, validate_only: bool) -> Result<Output, LibraryError> {
        let input_path = {
            let mut input = NamedTempFile::new().map_err(LibraryError::InputFileError)?;
            serde_json::to_writer(&mut input, record)
                .map_err(|e| LibraryError::InputFileError(e.into()))?;
            input.flush().map_err(LibraryError::InputFileError)?;
            input.into_temp_path()
        };

        let output = self
            .command(&input_path, validate_only)
            .output()
            .map_err(LibraryError::GeneratorFailed)?;

        if output.status.success() {
            return Ok(output);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();

        if output.status.code() == Some(INVALID_INPUT_STATUS) {
            return Err(LibraryError::InvalidInput(stderr.to_owned()));
        }

        Err(LibraryError::Failed(format!(
            "chart generator exited with {}: {}",
            output.status, stderr
        )))
    }
}

impl Library for ProcessLibrary {
    fn clear_birthdata(&mut self) {
        self.slot = None;
        self.valid = false;
        // output locations are scoped to a single request
        self.output = None;
    }

    fn input_birthdata(&mut self, record: BirthRecord) -> Result<(), LibraryError> {
        self.slot = Some(record);
        self.valid = false;

        Ok(())
    }

    fn validate_birthdata(&mut self) -> Result<(), LibraryError> {
        let record = self
            .slot
            .as_ref()
            .ok_or(LibraryError::InvalidState("no birth data has been input"))?;

        check_record(record)?;
        self.run(record, true)?;
        self.valid = true;

        Ok(())
    }

    fn is_birthdata_valid(&self) -> bool {
        self.valid && self.slot.is_some()
    }

    fn get_birthdata(&self) -> Option<BirthRecord> {
        if self.valid {
            self.slot.clone()
        } else {
            None
        }
    }

    fn set_output(&mut self, path: &Path, filename: &str) -> Result<(), LibraryError> {
        if filename.is_empty() || filename.contains(std::path::is_separator) {
            return Err(LibraryError::Failed(format!(
                "invalid output filename {:?}",
                filename
            )));
        }

        self.output = Some((path.to_owned(), filename.to_owned()));

        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.as_ref().map(|(dir, _)| dir.as_path())
    }

    fn generate(&mut self, record: &BirthRecord) -> Result<Generated, LibraryError> {
        let output = self.run(record, false)?;

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(match self.output {
                Some(_) => Generated::WrittenToOutput,
                None => Generated::Nothing,
            });
        }

        let chart: serde_json::Value =
            serde_json::from_slice(&output.stdout).map_err(LibraryError::MalformedOutput)?;

        match chart {
            serde_json::Value::Object(chart) => Ok(Generated::Chart(chart)),
            other => Err(LibraryError::Failed(format!(
                "chart generator printed {} instead of an object",
                kind(&other)
            ))),
        }
    }
}

fn kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value::*;

    match value {
        Null => "null",
        Bool(_) => "a boolean",
        Number(_) => "a number",
        String(_) => "a string",
        Array(_) => "an array",
        Object(_) => "an object",
    }
}

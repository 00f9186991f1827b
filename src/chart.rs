use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, warn, Logger};
use tempfile::TempDir;

use crate::birth::BirthData;
use crate::encoding::encode;
use crate::errors::BackendError;
use crate::library::{BirthRecord, Chart, Generated, Library};

/// The filename, without extension, configured for file-mode output.
pub const OUTPUT_NAME: &str = "chart";

const SCRATCH_PREFIX: &str = "chart-";

/// Where a generated chart ended up.
#[derive(Debug)]
pub enum ChartOutput {
    InMemory(Chart),
    File(PathBuf),
}

impl ChartOutput {
    /// Turns either form into a chart, reading and parsing the output
    /// file if necessary.
    pub fn resolve(self) -> Result<Chart, BackendError> {
        match self {
            ChartOutput::InMemory(chart) if !chart.is_empty() => Ok(chart),
            ChartOutput::InMemory(_) => Err(BackendError::GenerationFailed),
            ChartOutput::File(path) => {
                let raw = match fs::read(&path) {
                    Ok(raw) => raw,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        return Err(BackendError::GenerationFailed)
                    }
                    Err(e) => return Err(BackendError::TemporaryFileError(e)),
                };

                let chart: Chart =
                    serde_json::from_slice(&raw).map_err(BackendError::MalformedChartOutput)?;

                if chart.is_empty() {
                    return Err(BackendError::GenerationFailed);
                }

                Ok(chart)
            }
        }
    }
}

/// Runs one full clear → input → validate → retrieve → generate
/// sequence against `library`.
///
/// The caller must hold exclusive access to the library for the whole
/// call. Any scratch directory is removed before this returns.
pub fn generate(
    logger: &Logger,
    library: &mut dyn Library,
    data: &BirthData,
) -> Result<Chart, BackendError> {
    debug!(logger, "Clearing stored birth data...");
    library.clear_birthdata();

    let input = encode(data);
    debug!(logger, "Submitting birth data..."; "month" => input.month.token(), "timezone" => &input.timezone);
    library.input_birthdata(input)?;

    debug!(logger, "Validating birth data...");
    library.validate_birthdata()?;

    if !library.is_birthdata_valid() {
        return Err(BackendError::InvalidBirthData(
            "library did not accept the birth data".to_owned(),
        ));
    }

    let record = library.get_birthdata().ok_or_else(|| {
        BackendError::InvalidBirthData("library returned no stored birth data".to_owned())
    })?;

    debug!(logger, "Generating chart in memory...");
    match library.generate(&record) {
        Ok(Generated::Chart(chart)) if !chart.is_empty() => return Ok(chart),
        Ok(other) => {
            debug!(logger, "No in-memory chart, falling back to file output"; "result" => ?other)
        }
        Err(e) => {
            warn!(logger, "In-memory generation failed, falling back to file output"; "error" => %e)
        }
    }

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(BackendError::TemporaryFileError)?;

    let result = generate_to_file(logger, library, &record, &scratch);

    debug!(logger, "Removing scratch directory..."; "path" => %scratch.path().display());
    let cleanup = scratch.close().map_err(BackendError::TemporaryFileError);

    let chart = result?;
    cleanup?;

    Ok(chart)
}

fn generate_to_file(
    logger: &Logger,
    library: &mut dyn Library,
    record: &BirthRecord,
    scratch: &TempDir,
) -> Result<Chart, BackendError> {
    debug!(logger, "Configuring file output..."; "path" => %scratch.path().display());
    library.set_output(scratch.path(), OUTPUT_NAME)?;

    debug!(logger, "Generating chart to file...");
    let output = match library.generate(record)? {
        Generated::Chart(chart) if !chart.is_empty() => ChartOutput::InMemory(chart),
        Generated::Chart(_) | Generated::WrittenToOutput | Generated::Nothing => {
            let dir = library.output_path().unwrap_or_else(|| scratch.path());
            ChartOutput::File(dir.join(format!("{}.json", OUTPUT_NAME)))
        }
    };

    output.resolve()
}

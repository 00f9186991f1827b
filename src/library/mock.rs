use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use serde_json::json;

use super::{check_record, BirthRecord, Chart, Generated, Library};
use crate::errors::LibraryError;

/// How [`MockLibrary::generate`] answers.
#[derive(Clone, Debug, PartialEq)]
pub enum Behavior {
    /// Return the chart directly.
    InMemory,

    /// Fail the in-memory attempt and write the chart once an output
    /// location is configured.
    FileOnly,

    /// Report success without producing anything.
    Nothing,

    /// Fail every generation call with this message.
    Fail(String),

    /// Refuse every record at validation.
    RejectInput(String),
}

/// A library call, as recorded in the [`Journal`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Clear,
    Input(String),
    Validate,
    Retrieve,
    SetOutput(PathBuf),
    Generate(String),
}

/// Everything a [`MockLibrary`] was asked to do.
#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<Call>,
    pub output_dirs: Vec<PathBuf>,
}

impl Journal {
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }
}

/// An in-process library for tests and local runs. Charts echo the
/// stored record back so callers can tell which request produced them.
pub struct MockLibrary {
    behavior: Behavior,
    delay: Option<Duration>,
    slow_name: Option<String>,
    slot: Option<BirthRecord>,
    valid: bool,
    output: Option<(PathBuf, String)>,
    journal: Arc<RwLock<Journal>>,
}

impl MockLibrary {
    pub fn new(behavior: Behavior) -> Self {
        MockLibrary {
            behavior,
            delay: None,
            slow_name: None,
            slot: None,
            valid: false,
            output: None,
            journal: Default::default(),
        }
    }

    /// Makes every generation call sleep first, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Like [`with_delay`](Self::with_delay), but only for records with
    /// this name.
    pub fn with_delay_for(mut self, name: &str, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.slow_name = Some(name.to_owned());
        self
    }

    /// Returns a handle to the journal that stays valid after the
    /// library has been moved into a gateway.
    pub fn journal(&self) -> Arc<RwLock<Journal>> {
        self.journal.clone()
    }

    fn record(&self, call: Call) {
        self.journal
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .push(call);
    }
}

/// Builds the chart a [`MockLibrary`] returns for `record`.
pub fn mock_chart(record: &BirthRecord) -> Chart {
    let value = json!({
        "birthdata": record,
        "ascendant": { "sign": record.month.token() },
    });

    match value {
        serde_json::Value::Object(chart) => chart,
        _ => Chart::new(),
    }
}

impl Library for MockLibrary {
    fn clear_birthdata(&mut self) {
        self.record(Call::Clear);
        self.slot = None;
        self.valid = false;
        self.output = None;
    }

    fn input_birthdata(&mut self, record: BirthRecord) -> Result<(), LibraryError> {
        self.record(Call::Input(record.name.clone()));
        self.slot = Some(record);
        self.valid = false;

        Ok(())
    }

    fn validate_birthdata(&mut self) -> Result<(), LibraryError> {
        self.record(Call::Validate);

        let record = self
            .slot
            .as_ref()
            .ok_or(LibraryError::InvalidState("no birth data has been input"))?;

        if let Behavior::RejectInput(reason) = &self.behavior {
            return Err(LibraryError::InvalidInput(reason.clone()));
        }

        check_record(record)?;
        self.valid = true;

        Ok(())
    }

    fn is_birthdata_valid(&self) -> bool {
        self.valid && self.slot.is_some()
    }

    fn get_birthdata(&self) -> Option<BirthRecord> {
        self.record(Call::Retrieve);

        if self.valid {
            self.slot.clone()
        } else {
            None
        }
    }

    fn set_output(&mut self, path: &Path, filename: &str) -> Result<(), LibraryError> {
        self.record(Call::SetOutput(path.to_owned()));
        self.journal
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .output_dirs
            .push(path.to_owned());
        self.output = Some((path.to_owned(), filename.to_owned()));

        Ok(())
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.as_ref().map(|(dir, _)| dir.as_path())
    }

    fn generate(&mut self, record: &BirthRecord) -> Result<Generated, LibraryError> {
        self.record(Call::Generate(record.name.clone()));

        if let Some(delay) = self.delay {
            if self.slow_name.as_ref().map_or(true, |name| *name == record.name) {
                thread::sleep(delay);
            }
        }

        match &self.behavior {
            Behavior::InMemory | Behavior::RejectInput(_) => Ok(Generated::Chart(mock_chart(record))),
            Behavior::Nothing => Ok(Generated::Nothing),
            Behavior::Fail(message) => Err(LibraryError::Failed(message.clone())),
            Behavior::FileOnly => {
                let (dir, name) = self
                    .output
                    .as_ref()
                    .ok_or_else(|| LibraryError::Failed("no output location configured".to_owned()))?;

                let contents = serde_json::to_vec(&mock_chart(record))
                    .map_err(LibraryError::MalformedOutput)?;
                fs::write(dir.join(format!("{}.json", name)), contents)
                    .map_err(|e| LibraryError::Failed(e.to_string()))?;

                Ok(Generated::WrittenToOutput)
            }
        }
    }
}

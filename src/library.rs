use std::path::Path;

use serde_json::{Map, Value};
use time::Date;

use crate::encoding::{decode_timezone, NormalizedBirthInput};
use crate::errors::LibraryError;

pub mod mock;
pub mod process;

/// A chart as produced by the library. Its schema belongs to the
/// library; this crate only requires a JSON object.
pub type Chart = Map<String, Value>;

/// The record the library keeps in its birth-data slot.
pub type BirthRecord = NormalizedBirthInput;

/// What a generation call produced.
#[derive(Debug)]
pub enum Generated {
    /// The chart was returned directly.
    Chart(Chart),

    /// The chart was written under the configured output location.
    WrittenToOutput,

    /// The library finished without producing anything.
    Nothing,
}

/// The calling surface of the astrology library.
///
/// Implementations keep exactly one birth-data slot and make no promise
/// of reentrancy, so all calls must go through
/// [`Gateway`](crate::gateway::Gateway).
pub trait Library: Send {
    /// Empties the birth-data slot.
    fn clear_birthdata(&mut self);

    /// Stores `record` in the birth-data slot, replacing any previous
    /// record and marking it unvalidated.
    fn input_birthdata(&mut self, record: BirthRecord) -> Result<(), LibraryError>;

    /// Validates the stored record.
    fn validate_birthdata(&mut self) -> Result<(), LibraryError>;

    /// Returns whether the stored record has passed validation.
    fn is_birthdata_valid(&self) -> bool;

    /// Returns the stored record if it has passed validation.
    fn get_birthdata(&self) -> Option<BirthRecord>;

    /// Configures where file-mode generation writes its output.
    fn set_output(&mut self, path: &Path, filename: &str) -> Result<(), LibraryError>;

    /// Returns the configured output directory, if any.
    fn output_path(&self) -> Option<&Path>;

    /// Generates a chart for `record`.
    fn generate(&mut self, record: &BirthRecord) -> Result<Generated, LibraryError>;
}

/// The library's own field checks, applied to the encoded strings
/// exactly as they are stored in the slot.
pub fn check_record(record: &BirthRecord) -> Result<(), LibraryError> {
    let invalid = |message: String| Err(LibraryError::InvalidInput(message));

    if record.name.trim().is_empty() {
        return invalid("name must not be empty".to_owned());
    }

    if record.place.trim().is_empty() {
        return invalid("place must not be empty".to_owned());
    }

    let year = match record.year.parse::<i32>() {
        Ok(year) => year,
        Err(_) => return invalid(format!("year {:?} is not a number", record.year)),
    };

    let day = parse_component("day", &record.day)?;
    let hour = parse_component("hour", &record.hour)?;
    let minute = parse_component("min", &record.minute)?;
    let second = parse_component("sec", &record.second)?;

    if Date::try_from_ymd(year, record.month.number(), day).is_err() {
        return invalid(format!(
            "{} {} {} is not a calendar date",
            record.day,
            record.month.token(),
            record.year
        ));
    }

    if hour > 23 || minute > 59 || second > 59 {
        return invalid(format!(
            "{}:{}:{} is not a time of day",
            record.hour, record.minute, record.second
        ));
    }

    match decode_timezone(&record.timezone) {
        Some(tz) if (-12.0..=14.0).contains(&tz) => {}
        _ => return invalid(format!("timezone {:?} is out of range", record.timezone)),
    }

    if !(-90.0..=90.0).contains(&record.latitude) {
        return invalid(format!("latitude {} is out of range", record.latitude));
    }

    if !(-180.0..=180.0).contains(&record.longitude) {
        return invalid(format!("longitude {} is out of range", record.longitude));
    }

    Ok(())
}

fn parse_component(name: &str, value: &str) -> Result<u8, LibraryError> {
    value
        .parse::<u8>()
        .map_err(|_| LibraryError::InvalidInput(format!("{} {:?} is not a number", name, value)))
}

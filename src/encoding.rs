//! The argument encoding the astrology library accepts.
//!
//! Every coercion from [`BirthData`] to the library's call shape happens
//! in [`encode`]. Numeric fields become fixed-width decimal strings, the
//! month becomes the library's month token and the timezone becomes an
//! always-signed decimal string.

use serde::{Deserialize, Serialize};

use crate::birth::{BirthData, Gender, Month};

/// The place name submitted with every record. Coordinates are passed
/// separately, so the library only uses it as a label.
pub const PLACEHOLDER_PLACE: &str = "CustomLocation";

/// Birth data in the exact shape of the library's input call.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NormalizedBirthInput {
    pub name: String,
    pub gender: Gender,
    pub year: String,
    pub month: Month,
    pub day: String,
    pub hour: String,
    #[serde(rename = "min")]
    pub minute: String,
    #[serde(rename = "sec")]
    pub second: String,
    pub place: String,
    pub longitude: f64,
    // the library's spelling
    #[serde(rename = "lattitude")]
    pub latitude: f64,
    pub timezone: String,
}

/// Maps validated birth data onto the library's argument encoding.
pub fn encode(data: &BirthData) -> NormalizedBirthInput {
    let moment = data.moment;

    NormalizedBirthInput {
        name: data.name.clone(),
        gender: data.gender,
        year: format!("{:04}", moment.year()),
        month: data.month(),
        day: two_digits(moment.day()),
        hour: two_digits(moment.hour()),
        minute: two_digits(moment.minute()),
        second: two_digits(moment.second()),
        place: PLACEHOLDER_PLACE.to_owned(),
        longitude: data.longitude,
        latitude: data.latitude,
        timezone: encode_timezone(data.timezone),
    }
}

/// Formats an offset in hours as the shortest decimal with an explicit
/// sign. Negative zero is written as `+0`.
pub fn encode_timezone(hours: f64) -> String {
    let hours = if hours == 0.0 { 0.0 } else { hours };

    format!("{:+}", hours)
}

/// Parses a string produced by [`encode_timezone`].
pub fn decode_timezone(s: &str) -> Option<f64> {
    if !(s.starts_with('+') || s.starts_with('-')) {
        return None;
    }

    s.parse::<f64>().ok().filter(|h| h.is_finite())
}

fn two_digits(n: u8) -> String {
    format!("{:02}", n)
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::*;
    use crate::birth::BirthDataRequest;

    fn data(dob: &str, tob: &str, timezone: f64) -> BirthData {
        BirthData::try_from(BirthDataRequest {
            name: " Asha ".to_owned(),
            gender: "Female".to_owned(),
            dob: dob.to_owned(),
            tob: tob.to_owned(),
            latitude: 28.6,
            longitude: 77.2,
            timezone,
        })
        .expect("convert request")
    }

    #[test]
    fn records_are_encoded_canonically() {
        let input = encode(&data("1990-06-05", "08:07", 5.5));

        assert_eq!(input.name, "Asha");
        assert_eq!(input.gender, Gender::Female);
        assert_eq!(input.year, "1990");
        assert_eq!(input.month, Month::June);
        assert_eq!(input.day, "05");
        assert_eq!(input.hour, "08");
        assert_eq!(input.minute, "07");
        assert_eq!(input.second, "00");
        assert_eq!(input.place, "CustomLocation");
        assert_eq!(input.latitude, 28.6);
        assert_eq!(input.longitude, 77.2);
        assert_eq!(input.timezone, "+5.5");
    }

    #[test]
    fn early_years_are_zero_padded() {
        assert_eq!(encode(&data("0900-01-01", "00:00", 0.0)).year, "0900");
    }

    #[test]
    fn timezones_always_carry_a_sign() {
        assert_eq!(encode_timezone(5.5), "+5.5");
        assert_eq!(encode_timezone(10.0), "+10");
        assert_eq!(encode_timezone(5.75), "+5.75");
        assert_eq!(encode_timezone(-3.5), "-3.5");
        assert_eq!(encode_timezone(-10.0), "-10");
        assert_eq!(encode_timezone(0.0), "+0");
        assert_eq!(encode_timezone(-0.0), "+0");
    }

    #[test]
    fn timezones_decode() {
        assert_eq!(decode_timezone("+5.5"), Some(5.5));
        assert_eq!(decode_timezone("-3.5"), Some(-3.5));
        assert_eq!(decode_timezone("+0"), Some(0.0));
        assert_eq!(decode_timezone("5.5"), None);
        assert_eq!(decode_timezone("+inf"), None);
        assert_eq!(decode_timezone("+"), None);
    }

    #[test]
    fn serialized_input_uses_library_argument_names() {
        let value = serde_json::to_value(encode(&data("1990-06-15", "08:30", 5.5)))
            .expect("serialize input");

        assert_eq!(
            value,
            serde_json::json!({
                "name": "Asha",
                "gender": "female",
                "year": "1990",
                "month": "June",
                "day": "15",
                "hour": "08",
                "min": "30",
                "sec": "00",
                "place": "CustomLocation",
                "longitude": 77.2,
                "lattitude": 28.6,
                "timezone": "+5.5",
            })
        );
    }
}

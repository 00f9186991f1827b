use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};

use crate::errors::BackendError;
use crate::normalization::normalize_name;

/// A chart request as submitted by a client.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BirthDataRequest {
    pub name: String,

    /// `male` or `female`, in any case.
    pub gender: String,

    /// The date of birth as `YYYY-MM-DD`.
    pub dob: String,

    /// The time of birth as 24-hour `HH:MM`.
    pub tob: String,

    pub latitude: f64,
    pub longitude: f64,

    /// The offset from UTC in hours, e.g. `5.5`.
    pub timezone: f64,
}

impl BirthDataRequest {
    /// Parses a request body.
    pub fn from_slice(raw: &[u8]) -> Result<Self, BackendError> {
        serde_json::from_slice(raw).map_err(BackendError::MalformedRequest)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(BackendError::InvalidGender(s.to_owned())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar month, named the way the astrology library names it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

impl Month {
    /// Returns the library's token for this month.
    pub fn token(self) -> &'static str {
        use Month::*;

        match self {
            January => "January",
            February => "February",
            March => "March",
            April => "April",
            May => "May",
            June => "June",
            July => "July",
            August => "August",
            September => "September",
            October => "October",
            November => "November",
            December => "December",
        }
    }

    /// Returns the month number, 1 to 12.
    pub fn number(self) -> u8 {
        MONTHS
            .iter()
            .position(|m| *m == self)
            .map(|i| i as u8 + 1)
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn from_token(token: &str) -> Option<Self> {
        MONTHS.iter().copied().find(|m| m.token() == token)
    }
}

impl TryFrom<u8> for Month {
    type Error = u8;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1..=12 => Ok(MONTHS[number as usize - 1]),
            _ => Err(number),
        }
    }
}

/// A validated request: every field has been parsed and checked
/// without touching the library.
#[derive(Clone, Debug, PartialEq)]
pub struct BirthData {
    pub name: String,
    pub gender: Gender,
    pub moment: PrimitiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: f64,
}

impl BirthData {
    pub fn month(&self) -> Month {
        // `Date` guarantees 1..=12
        Month::try_from(self.moment.month()).unwrap_or(Month::January)
    }
}

impl TryFrom<BirthDataRequest> for BirthData {
    type Error = BackendError;

    fn try_from(request: BirthDataRequest) -> Result<Self, Self::Error> {
        let moment = parse_moment(&request.dob, &request.tob).ok_or_else(|| {
            BackendError::InvalidDateTime {
                dob: request.dob.clone(),
                tob: request.tob.clone(),
            }
        })?;

        let gender = request.gender.parse::<Gender>()?;

        let name = normalize_name(&request.name);

        if name.is_empty() {
            return Err(BackendError::EmptyName);
        }

        Ok(BirthData {
            name,
            gender,
            moment,
            latitude: request.latitude,
            longitude: request.longitude,
            timezone: request.timezone,
        })
    }
}

/// Combines `YYYY-MM-DD` and `HH:MM` into one instant with the seconds
/// fixed to zero, or returns `None` if either isn't well-formed or the
/// combination doesn't exist on the calendar.
pub fn parse_moment(dob: &str, tob: &str) -> Option<PrimitiveDateTime> {
    let mut date = dob.trim().split('-');
    let year = fixed_digits(date.next()?, 4)?;
    let month = fixed_digits(date.next()?, 2)?;
    let day = fixed_digits(date.next()?, 2)?;

    if date.next().is_some() {
        return None;
    }

    let mut time = tob.trim().split(':');
    let hour = fixed_digits(time.next()?, 2)?;
    let minute = fixed_digits(time.next()?, 2)?;

    if time.next().is_some() {
        return None;
    }

    let date = Date::try_from_ymd(year as i32, month as u8, day as u8).ok()?;
    let time = Time::try_from_hms(hour as u8, minute as u8, 0).ok()?;

    Some(PrimitiveDateTime::new(date, time))
}

fn fixed_digits(s: &str, width: usize) -> Option<u16> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use proptest::prelude::*;

    use super::*;

    fn request(dob: &str, tob: &str) -> BirthDataRequest {
        BirthDataRequest {
            name: "Asha".to_owned(),
            gender: "female".to_owned(),
            dob: dob.to_owned(),
            tob: tob.to_owned(),
            latitude: 28.6,
            longitude: 77.2,
            timezone: 5.5,
        }
    }

    #[test]
    fn valid_moments_parse() {
        let moment = parse_moment("1990-06-15", "08:30").expect("parse valid moment");

        assert_eq!(moment.year(), 1990);
        assert_eq!(moment.month(), 6);
        assert_eq!(moment.day(), 15);
        assert_eq!(moment.hour(), 8);
        assert_eq!(moment.minute(), 30);
        assert_eq!(moment.second(), 0);

        assert!(parse_moment("2024-02-29", "23:59").is_some());
        assert!(parse_moment("2000-01-01", "00:00").is_some());
    }

    #[test]
    fn impossible_moments_are_rejected() {
        for (dob, tob) in &[
            ("2024-02-30", "10:00"),
            ("2023-02-29", "10:00"),
            ("2024-13-01", "10:00"),
            ("2024-00-10", "10:00"),
            ("2024-04-31", "10:00"),
            ("2024-01-01", "25:00"),
            ("2024-01-01", "24:00"),
            ("2024-01-01", "10:60"),
        ] {
            assert!(
                parse_moment(dob, tob).is_none(),
                "{} {} must be rejected",
                dob,
                tob
            );
        }
    }

    #[test]
    fn malformed_moments_are_rejected() {
        for (dob, tob) in &[
            ("1990-6-15", "08:30"),
            ("15-06-1990", "08:30"),
            ("1990/06/15", "08:30"),
            ("1990-06-15-01", "08:30"),
            ("1990-06-15", "8:30"),
            ("1990-06-15", "08:30:00"),
            ("1990-06-15", "0830"),
            ("1990-06-15", "+8:30"),
            ("", ""),
        ] {
            assert!(
                parse_moment(dob, tob).is_none(),
                "{:?} {:?} must be rejected",
                dob,
                tob
            );
        }
    }

    #[test]
    fn requests_convert() {
        let data = BirthData::try_from(request("1990-06-15", "08:30")).expect("convert request");

        assert_eq!(data.name, "Asha");
        assert_eq!(data.gender, Gender::Female);
        assert_eq!(data.month(), Month::June);
        assert_eq!(data.timezone, 5.5);
    }

    #[test]
    fn genders_are_case_insensitive() {
        assert_eq!("MALE".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert!(matches!(
            "other".parse::<Gender>(),
            Err(BackendError::InvalidGender(g)) if g == "other"
        ));
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut r = request("1990-06-15", "08:30");
        r.name = "   ".to_owned();

        assert!(matches!(BirthData::try_from(r), Err(BackendError::EmptyName)));
    }

    #[test]
    fn date_errors_take_precedence() {
        let mut r = request("2024-02-30", "10:00");
        r.gender = "unknown".to_owned();
        r.name = String::new();

        assert!(matches!(
            BirthData::try_from(r),
            Err(BackendError::InvalidDateTime { .. })
        ));
    }

    #[test]
    fn month_numbers_round_trip_through_tokens() {
        for number in 1..=12u8 {
            let month = Month::try_from(number).expect("convert month number");
            assert_eq!(month.number(), number);
            assert_eq!(Month::from_token(month.token()), Some(month));
        }

        assert_eq!(Month::try_from(0), Err(0));
        assert_eq!(Month::try_from(13), Err(13));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let body = br#"{"name":"X","gender":"male","tob":"10:00","latitude":0,"longitude":0,"timezone":0}"#;

        assert!(matches!(
            BirthDataRequest::from_slice(body),
            Err(BackendError::MalformedRequest(_))
        ));
    }

    proptest! {
        #[test]
        fn out_of_range_components_are_rejected(
            month in 13u8..100,
            hour in 24u8..100,
            minute in 60u8..100,
        ) {
            let bad_month = format!("2001-{:02}-01", month);
            let bad_hour = format!("{:02}:00", hour);
            let bad_minute = format!("00:{:02}", minute);

            prop_assert!(parse_moment(&bad_month, "00:00").is_none());
            prop_assert!(parse_moment("2001-01-01", &bad_hour).is_none());
            prop_assert!(parse_moment("2001-01-01", &bad_minute).is_none());
        }
    }
}

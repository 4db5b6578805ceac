//! Fixed lookup tables from the dataset's numeric codes to readable labels.
//!
//! Each categorical column is an enum whose declaration order is the
//! natural display order of that dimension. `from_code` is the only way in
//! from raw data and rejects anything outside the known domain.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

fn unknown(field: &'static str, code: i64, line: u64) -> DataError {
    DataError::Mapping { field, code, line }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn from_code(code: i64, line: u64) -> DataResult<Self> {
        match code {
            1 => Ok(Season::Spring),
            2 => Ok(Season::Summer),
            3 => Ok(Season::Fall),
            4 => Ok(Season::Winter),
            _ => Err(unknown("season", code, line)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

/// Weather situation, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Weather {
    Clear,
    Mist,
    LightPrecipitation,
    HeavyPrecipitation,
}

impl Weather {
    pub const ALL: [Weather; 4] = [
        Weather::Clear,
        Weather::Mist,
        Weather::LightPrecipitation,
        Weather::HeavyPrecipitation,
    ];

    pub fn from_code(code: i64, line: u64) -> DataResult<Self> {
        match code {
            1 => Ok(Weather::Clear),
            2 => Ok(Weather::Mist),
            3 => Ok(Weather::LightPrecipitation),
            4 => Ok(Weather::HeavyPrecipitation),
            _ => Err(unknown("weather", code, line)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::Clear => "Clear",
            Weather::Mist => "Mist",
            Weather::LightPrecipitation => "Light Rain/Snow",
            Weather::HeavyPrecipitation => "Heavy Rain/Snow",
        }
    }
}

/// Day of week. The raw data counts from Sunday = 0, but the display
/// order starts on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn from_code(code: i64, line: u64) -> DataResult<Self> {
        match code {
            0 => Ok(Weekday::Sunday),
            1 => Ok(Weekday::Monday),
            2 => Ok(Weekday::Tuesday),
            3 => Ok(Weekday::Wednesday),
            4 => Ok(Weekday::Thursday),
            5 => Ok(Weekday::Friday),
            6 => Ok(Weekday::Saturday),
            _ => Err(unknown("weekday", code, line)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

static MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Calendar month, 1-based. Serialized as its number; deserializing goes
/// through the same range check as [`Month::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl TryFrom<u8> for Month {
    type Error = DataError;

    fn try_from(value: u8) -> DataResult<Self> {
        Month::from_code(i64::from(value), 0)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> u8 {
        month.number()
    }
}

impl Month {
    pub fn from_code(code: i64, line: u64) -> DataResult<Self> {
        match code {
            1..=12 => Ok(Month(code as u8)),
            _ => Err(unknown("month", code, line)),
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }

    pub fn all() -> impl Iterator<Item = Month> {
        (1..=12).map(Month)
    }
}

/// Maps the dataset's two-year code to the calendar year.
pub fn year_from_code(code: i64, line: u64) -> DataResult<u16> {
    match code {
        0 => Ok(2011),
        1 => Ok(2012),
        _ => Err(unknown("year", code, line)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayKind {
    NonWorking,
    Working,
}

impl DayKind {
    pub const ALL: [DayKind; 2] = [DayKind::NonWorking, DayKind::Working];

    pub fn from_code(code: i64, line: u64) -> DataResult<Self> {
        match code {
            0 => Ok(DayKind::NonWorking),
            1 => Ok(DayKind::Working),
            _ => Err(unknown("workingday", code, line)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayKind::NonWorking => "Non-Working Day",
            DayKind::Working => "Working Day",
        }
    }

    pub fn is_working(self) -> bool {
        self == DayKind::Working
    }
}

/// Holiday flag. Only 0 and 1 are meaningful.
pub fn holiday_from_code(code: i64, line: u64) -> DataResult<bool> {
    match code {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(unknown("holiday", code, line)),
    }
}

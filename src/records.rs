//! Row types for the bike-sharing tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};
use crate::labels::{
    DayKind, Month, Season, Weather, Weekday, holiday_from_code, year_from_code,
};

/// A single row as it appears in `hour.csv` or `day.csv`.
///
/// Categorical columns are kept as raw integer codes; they are only checked
/// against their lookup tables when the row is normalized. The daily table
/// has no `hr` column, so `hr` is `None` there.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    /// 1-based line in the source file. Not part of the CSV schema.
    #[serde(skip)]
    pub line: u64,

    pub instant: u64,
    pub dteday: NaiveDate,
    pub season: i64,
    pub yr: i64,
    pub mnth: i64,
    #[serde(default)]
    pub hr: Option<u8>,
    pub holiday: i64,
    pub weekday: i64,
    pub workingday: i64,
    pub weathersit: i64,

    // weather measurements, already normalized to 0..1 upstream
    pub temp: f64,
    #[serde(default)]
    pub atemp: Option<f64>,
    pub hum: f64,
    pub windspeed: f64,

    pub casual: u32,
    pub registered: u32,
    pub cnt: u32,
}

/// A raw row plus the labels derived from its codes.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub raw: RawRecord,
    pub season: Season,
    pub weather: Weather,
    pub weekday: Weekday,
    pub month: Month,
    pub year: u16,
    pub day_kind: DayKind,
    pub holiday: bool,
}

impl CanonicalRecord {
    /// Derives every label for `raw`.
    ///
    /// # Errors
    ///
    /// [`DataError::Mapping`] if any code is outside its table, and
    /// [`DataError::InconsistentTotal`] if `casual + registered != cnt`.
    pub fn from_raw(raw: RawRecord) -> DataResult<Self> {
        let line = raw.line;

        if u64::from(raw.casual) + u64::from(raw.registered) != u64::from(raw.cnt) {
            return Err(DataError::InconsistentTotal {
                line,
                casual: raw.casual,
                registered: raw.registered,
                total: raw.cnt,
            });
        }

        if let Some(hr) = raw.hr {
            if hr > 23 {
                return Err(DataError::Mapping {
                    field: "hour",
                    code: i64::from(hr),
                    line,
                });
            }
        }

        Ok(CanonicalRecord {
            season: Season::from_code(raw.season, line)?,
            weather: Weather::from_code(raw.weathersit, line)?,
            weekday: Weekday::from_code(raw.weekday, line)?,
            month: Month::from_code(raw.mnth, line)?,
            year: year_from_code(raw.yr, line)?,
            day_kind: DayKind::from_code(raw.workingday, line)?,
            holiday: holiday_from_code(raw.holiday, line)?,
            raw,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.raw.dteday
    }

    pub fn hour(&self) -> Option<u8> {
        self.raw.hr
    }

    pub fn casual(&self) -> u32 {
        self.raw.casual
    }

    pub fn registered(&self) -> u32 {
        self.raw.registered
    }

    pub fn total(&self) -> u32 {
        self.raw.cnt
    }
}

/// Flattened row of the derived working-set file: the raw columns followed
/// by their labels.
#[derive(Debug, Serialize)]
pub(crate) struct WorkingSetRow<'a> {
    pub instant: u64,
    pub dteday: NaiveDate,
    pub season: i64,
    pub yr: i64,
    pub mnth: i64,
    pub hr: Option<u8>,
    pub holiday: i64,
    pub weekday: i64,
    pub workingday: i64,
    pub weathersit: i64,
    pub temp: f64,
    pub atemp: Option<f64>,
    pub hum: f64,
    pub windspeed: f64,
    pub casual: u32,
    pub registered: u32,
    pub cnt: u32,
    pub season_name: &'a str,
    pub weather_label: &'a str,
    pub weekday_name: &'a str,
    pub month_name: &'a str,
    pub year: u16,
    pub day_kind: &'a str,
}

impl<'a> From<&'a CanonicalRecord> for WorkingSetRow<'a> {
    fn from(r: &'a CanonicalRecord) -> Self {
        let raw = &r.raw;
        WorkingSetRow {
            instant: raw.instant,
            dteday: raw.dteday,
            season: raw.season,
            yr: raw.yr,
            mnth: raw.mnth,
            hr: raw.hr,
            holiday: raw.holiday,
            weekday: raw.weekday,
            workingday: raw.workingday,
            weathersit: raw.weathersit,
            temp: raw.temp,
            atemp: raw.atemp,
            hum: raw.hum,
            windspeed: raw.windspeed,
            casual: raw.casual,
            registered: raw.registered,
            cnt: raw.cnt,
            season_name: r.season.label(),
            weather_label: r.weather.label(),
            weekday_name: r.weekday.label(),
            month_name: r.month.label(),
            year: r.year,
            day_kind: r.day_kind.label(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::raw;
    use super::*;

    #[test]
    fn test_from_raw_derives_labels() {
        let rec = CanonicalRecord::from_raw(raw(Some(8), 5, 50)).unwrap();

        assert_eq!(rec.season, Season::Spring);
        assert_eq!(rec.weather, Weather::Clear);
        assert_eq!(rec.weekday, Weekday::Monday);
        assert_eq!(rec.month.label(), "January");
        assert_eq!(rec.year, 2011);
        assert!(rec.day_kind.is_working());
        assert!(!rec.holiday);
        assert_eq!(rec.total(), 55);
    }

    #[test]
    fn test_from_raw_rejects_inconsistent_total() {
        let mut r = raw(Some(8), 5, 50);
        r.cnt = 56;
        assert!(matches!(
            CanonicalRecord::from_raw(r),
            Err(DataError::InconsistentTotal { total: 56, .. })
        ));
    }

    #[test]
    fn test_from_raw_rejects_hour_out_of_range() {
        assert!(matches!(
            CanonicalRecord::from_raw(raw(Some(24), 1, 1)),
            Err(DataError::Mapping { field: "hour", .. })
        ));
    }

    #[test]
    fn test_working_set_row_carries_labels() {
        let mut r = raw(None, 1, 2);
        r.weathersit = 2;
        let rec = CanonicalRecord::from_raw(r).unwrap();
        let row = WorkingSetRow::from(&rec);

        assert_eq!(row.weather_label, "Mist");
        assert_eq!(row.weekday_name, "Monday");
        assert_eq!(row.day_kind, "Working Day");
        assert_eq!(row.hr, None);
    }
}

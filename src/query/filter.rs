//! Row predicates built from the dashboard's filter widgets.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::NaiveDate;

use crate::labels::{Season, Weather, Weekday};
use crate::records::CanonicalRecord;

/// A conjunction of optional predicates. An empty spec keeps every row.
///
/// Ranges are inclusive at both ends. An empty selection set means "any".
/// A row with no hour never satisfies an hour range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub dates: Option<RangeInclusive<NaiveDate>>,
    pub hours: Option<RangeInclusive<u8>>,
    pub seasons: BTreeSet<Season>,
    pub weathers: BTreeSet<Weather>,
    pub weekdays: BTreeSet<Weekday>,
    pub working_day: Option<bool>,
    pub years: BTreeSet<u16>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.dates = Some(from..=to);
        self
    }

    pub fn hour_range(mut self, from: u8, to: u8) -> Self {
        self.hours = Some(from..=to);
        self
    }

    pub fn season(mut self, season: Season) -> Self {
        self.seasons.insert(season);
        self
    }

    pub fn weather(mut self, weather: Weather) -> Self {
        self.weathers.insert(weather);
        self
    }

    pub fn weekday(mut self, weekday: Weekday) -> Self {
        self.weekdays.insert(weekday);
        self
    }

    pub fn working_day(mut self, working: bool) -> Self {
        self.working_day = Some(working);
        self
    }

    pub fn year(mut self, year: u16) -> Self {
        self.years.insert(year);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterSpec::default()
    }

    /// Returns `true` if `rec` satisfies every predicate.
    pub fn matches(&self, rec: &CanonicalRecord) -> bool {
        if let Some(dates) = &self.dates {
            if !dates.contains(&rec.date()) {
                return false;
            }
        }

        if let Some(hours) = &self.hours {
            match rec.hour() {
                Some(h) if hours.contains(&h) => {}
                _ => return false,
            }
        }

        if !self.seasons.is_empty() && !self.seasons.contains(&rec.season) {
            return false;
        }

        if !self.weathers.is_empty() && !self.weathers.contains(&rec.weather) {
            return false;
        }

        if !self.weekdays.is_empty() && !self.weekdays.contains(&rec.weekday) {
            return false;
        }

        if let Some(working) = self.working_day {
            if rec.day_kind.is_working() != working {
                return false;
            }
        }

        if !self.years.is_empty() && !self.years.contains(&rec.year) {
            return false;
        }

        true
    }

    /// Keeps the matching rows of `table`, in table order.
    pub fn apply<'a>(&self, table: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        table.iter().filter(|r| self.matches(r)).collect()
    }
}

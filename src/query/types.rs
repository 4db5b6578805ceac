//! Data types used by the aggregation pipeline.

use std::fmt;

use clap::ValueEnum;
use serde::{Serialize, Serializer};

use crate::labels::{DayKind, Month, Season, Weather, Weekday};

/// Dimension a query groups its rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Hour,
    Weekday,
    Month,
    Season,
    Weather,
    WorkingDay,
    Year,
    UserType,
}

/// Whether each group reports summed counts or the mean count per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
pub enum UserType {
    Casual,
    Registered,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Casual, UserType::Registered];

    pub fn label(self) -> &'static str {
        match self {
            UserType::Casual => "Casual",
            UserType::Registered => "Registered",
        }
    }
}

/// One value of a [`GroupKey`] dimension.
///
/// The derived ordering is the natural order of each dimension (hours
/// ascending, Monday first, seasons Spring to Winter), which is the order
/// groups are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupValue {
    Hour(u8),
    Weekday(Weekday),
    Month(Month),
    Season(Season),
    Weather(Weather),
    DayKind(DayKind),
    Year(u16),
    UserType(UserType),
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Hour(h) => write!(f, "{}", h),
            GroupValue::Weekday(d) => f.write_str(d.label()),
            GroupValue::Month(m) => f.write_str(m.label()),
            GroupValue::Season(s) => f.write_str(s.label()),
            GroupValue::Weather(w) => f.write_str(w.label()),
            GroupValue::DayKind(k) => f.write_str(k.label()),
            GroupValue::Year(y) => write!(f, "{}", y),
            GroupValue::UserType(u) => f.write_str(u.label()),
        }
    }
}

impl Serialize for GroupValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counts for one group. Values are sums or per-row means depending on the
/// result's [`Metric`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: GroupValue,
    pub rows: usize,
    pub casual: f64,
    pub registered: f64,
    pub total: f64,
}

/// Output of a single query, groups in natural key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub group_key: GroupKey,
    pub metric: Metric,
    pub groups: Vec<GroupRow>,
}

impl AggregationResult {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, key: GroupValue) -> Option<&GroupRow> {
        self.groups.iter().find(|g| g.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_value_display() {
        assert_eq!(GroupValue::Hour(8).to_string(), "8");
        assert_eq!(GroupValue::Weekday(Weekday::Saturday).to_string(), "Saturday");
        assert_eq!(GroupValue::DayKind(DayKind::Working).to_string(), "Working Day");
        assert_eq!(GroupValue::UserType(UserType::Casual).to_string(), "Casual");
    }

    #[test]
    fn test_group_value_natural_order() {
        assert!(GroupValue::Hour(2) < GroupValue::Hour(10));
        assert!(GroupValue::Weekday(Weekday::Monday) < GroupValue::Weekday(Weekday::Sunday));
        assert!(GroupValue::Season(Season::Spring) < GroupValue::Season(Season::Winter));
    }

    #[test]
    fn test_group_row_serializes_label() {
        let row = GroupRow {
            key: GroupValue::Season(Season::Fall),
            rows: 1,
            casual: 1.0,
            registered: 2.0,
            total: 3.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["key"], "Fall");
        assert_eq!(json["total"], 3.0);
    }
}

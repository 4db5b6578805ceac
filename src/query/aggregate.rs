use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::query::filter::FilterSpec;
use crate::query::types::{AggregationResult, GroupKey, GroupRow, GroupValue, Metric, UserType};
use crate::records::CanonicalRecord;

#[derive(Default)]
struct Totals {
    rows: usize,
    casual: u64,
    registered: u64,
    total: u64,
}

impl Totals {
    fn add(&mut self, casual: u32, registered: u32, total: u32) {
        self.rows += 1;
        self.casual += u64::from(casual);
        self.registered += u64::from(registered);
        self.total += u64::from(total);
    }

    fn finish(self, key: GroupValue, metric: Metric) -> GroupRow {
        let divisor = match metric {
            Metric::Sum => 1.0,
            Metric::Mean => self.rows as f64,
        };
        GroupRow {
            key,
            rows: self.rows,
            casual: self.casual as f64 / divisor,
            registered: self.registered as f64 / divisor,
            total: self.total as f64 / divisor,
        }
    }
}

/// Adds `rec` to the group(s) it belongs to under `key`.
///
/// Every key puts a row in exactly one group except [`GroupKey::UserType`],
/// which feeds the casual count to `Casual` and the registered count to
/// `Registered`.
fn accumulate(
    groups: &mut BTreeMap<GroupValue, Totals>,
    rec: &CanonicalRecord,
    key: GroupKey,
) -> DataResult<()> {
    let value = match key {
        GroupKey::Hour => match rec.hour() {
            Some(h) => GroupValue::Hour(h),
            None => return Err(DataError::HourUnavailable { line: rec.raw.line }),
        },
        GroupKey::Weekday => GroupValue::Weekday(rec.weekday),
        GroupKey::Month => GroupValue::Month(rec.month),
        GroupKey::Season => GroupValue::Season(rec.season),
        GroupKey::Weather => GroupValue::Weather(rec.weather),
        GroupKey::WorkingDay => GroupValue::DayKind(rec.day_kind),
        GroupKey::Year => GroupValue::Year(rec.year),
        GroupKey::UserType => {
            groups
                .entry(GroupValue::UserType(UserType::Casual))
                .or_default()
                .add(rec.casual(), 0, rec.casual());
            groups
                .entry(GroupValue::UserType(UserType::Registered))
                .or_default()
                .add(0, rec.registered(), rec.registered());
            return Ok(());
        }
    };

    groups
        .entry(value)
        .or_default()
        .add(rec.casual(), rec.registered(), rec.total());
    Ok(())
}

/// Filters, groups and reduces `table` into summed counts per group.
pub fn aggregate(
    table: &[CanonicalRecord],
    filter: &FilterSpec,
    key: GroupKey,
) -> DataResult<AggregationResult> {
    aggregate_with(table, filter, key, Metric::Sum)
}

/// Filters `table`, partitions the surviving rows by `key` and reduces each
/// group with `metric`.
///
/// Groups come out in the natural order of the key's domain, and only
/// groups with at least one row are emitted; a filter that matches nothing
/// yields an empty result. For [`GroupKey::UserType`] every row feeds both
/// the `Casual` group (casual count only) and the `Registered` group.
///
/// # Errors
///
/// [`DataError::HourUnavailable`] when grouping by hour reaches a row from
/// the daily table.
pub fn aggregate_with(
    table: &[CanonicalRecord],
    filter: &FilterSpec,
    key: GroupKey,
    metric: Metric,
) -> DataResult<AggregationResult> {
    let mut groups: BTreeMap<GroupValue, Totals> = BTreeMap::new();
    let mut matched = 0usize;

    for rec in table.iter().filter(|r| filter.matches(r)) {
        matched += 1;
        accumulate(&mut groups, rec, key)?;
    }

    debug!(
        rows = table.len(),
        filtered = !filter.is_empty(),
        matched,
        groups = groups.len(),
        ?key,
        ?metric,
        "Aggregation complete"
    );

    Ok(AggregationResult {
        group_key: key,
        metric,
        groups: groups
            .into_iter()
            .map(|(value, totals)| totals.finish(value, metric))
            .collect(),
    })
}

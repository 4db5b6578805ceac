use bikeshare_dash::DataError;
use bikeshare_dash::labels::{Season, Weekday};
use bikeshare_dash::normalize::{
    load_working_set, normalize, read_raw_from_reader, read_raw_records, write_working_set,
};
use bikeshare_dash::query::{
    FilterSpec, GroupKey, GroupValue, KeyMetrics, Metric, Rider, WeatherVariable, aggregate,
    aggregate_with, fit_trend,
};
use bikeshare_dash::records::CanonicalRecord;

const HOURLY: &str = include_str!("fixtures/hour_sample.csv");
const DAILY: &str = include_str!("fixtures/day_sample.csv");

fn hourly() -> Vec<CanonicalRecord> {
    normalize(read_raw_from_reader(HOURLY.as_bytes()).expect("Failed to read hourly fixture"))
        .expect("Failed to normalize hourly fixture")
}

fn daily() -> Vec<CanonicalRecord> {
    normalize(read_raw_from_reader(DAILY.as_bytes()).expect("Failed to read daily fixture"))
        .expect("Failed to normalize daily fixture")
}

#[test]
fn test_normalize_keeps_every_row_in_order() {
    let raw = read_raw_from_reader(HOURLY.as_bytes()).unwrap();
    let raw_len = raw.len();
    let table = normalize(raw).unwrap();

    assert_eq!(raw_len, 48);
    assert_eq!(table.len(), raw_len);
    for (i, rec) in table.iter().enumerate() {
        assert_eq!(rec.raw.instant, i as u64 + 1);
        assert_eq!(rec.casual() + rec.registered(), rec.total());
    }
}

#[test]
fn test_full_pipeline_by_hour() {
    let table = hourly();
    let result = aggregate(&table, &FilterSpec::new(), GroupKey::Hour).unwrap();

    assert_eq!(result.len(), 24);
    for (h, group) in result.groups.iter().enumerate() {
        assert_eq!(group.key, GroupValue::Hour(h as u8));
        assert_eq!(group.rows, 2);
    }
    let covered: usize = result.groups.iter().map(|g| g.rows).sum();
    assert_eq!(covered, table.len());
}

#[test]
fn test_monday_morning_excludes_saturday() {
    let table = hourly();
    let filter = FilterSpec::new().weekday(Weekday::Monday).hour_range(8, 8);

    let result = aggregate(&table, &filter, GroupKey::Hour).unwrap();

    assert_eq!(result.len(), 1);
    let g = result.get(GroupValue::Hour(8)).unwrap();
    assert_eq!(g.casual, 8.0);
    assert_eq!(g.registered, 46.0);
    assert_eq!(g.total, 54.0);
}

#[test]
fn test_winter_filter_on_table_without_winter_is_empty() {
    let table = daily();
    let filter = FilterSpec::new().season(Season::Winter);

    let result = aggregate(&table, &filter, GroupKey::Season).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_daily_seasons_in_canonical_order() {
    let table = daily();
    let result =
        aggregate_with(&table, &FilterSpec::new(), GroupKey::Season, Metric::Mean).unwrap();

    let seasons: Vec<GroupValue> = result.groups.iter().map(|g| g.key).collect();
    assert_eq!(
        seasons,
        vec![
            GroupValue::Season(Season::Spring),
            GroupValue::Season(Season::Summer),
            GroupValue::Season(Season::Fall),
        ]
    );

    let summer = result.get(GroupValue::Season(Season::Summer)).unwrap();
    assert_eq!(summer.rows, 3);
    assert!((summer.total - 11650.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_hour_grouping_needs_hourly_table() {
    let table = daily();
    assert!(matches!(
        aggregate(&table, &FilterSpec::new(), GroupKey::Hour),
        Err(DataError::HourUnavailable { line: 2 })
    ));
}

#[test]
fn test_unknown_weather_code_stops_the_load() {
    let bad = DAILY.replace("3,2011-01-03,1,0,1,0,1,1,3,", "3,2011-01-03,1,0,1,0,1,1,5,");
    let raw = read_raw_from_reader(bad.as_bytes()).unwrap();

    match normalize(raw) {
        Err(DataError::Mapping { field, code, line }) => {
            assert_eq!(field, "weather");
            assert_eq!(code, 5);
            assert_eq!(line, 4);
        }
        other => panic!("expected mapping error, got {:?}", other),
    }
}

#[test]
fn test_derived_file_gives_same_answers_as_raw_table() {
    let path = std::env::temp_dir().join("bikeshare_dash_it_main_data.csv");
    let _ = std::fs::remove_file(&path);

    let raw_path = std::env::temp_dir().join("bikeshare_dash_it_hour.csv");
    std::fs::write(&raw_path, HOURLY).unwrap();

    let from_raw = normalize(read_raw_records(&raw_path).unwrap()).unwrap();
    write_working_set(&path, &from_raw).unwrap();
    let from_derived = load_working_set(&path).unwrap();

    for key in [GroupKey::Hour, GroupKey::Weekday, GroupKey::Weather, GroupKey::UserType] {
        let a = aggregate(&from_raw, &FilterSpec::new(), key).unwrap();
        let b = aggregate(&from_derived, &FilterSpec::new(), key).unwrap();
        assert_eq!(a, b);
    }

    std::fs::remove_file(&path).unwrap();
    std::fs::remove_file(&raw_path).unwrap();
}

#[test]
fn test_tighter_filters_match_fewer_rows() {
    let table = hourly();
    let loose = FilterSpec::new().hour_range(6, 20);
    let tight = loose.clone().working_day(true);
    let tighter = tight.clone().weekday(Weekday::Tuesday);

    let n_loose = loose.apply(&table).len();
    let n_tight = tight.apply(&table).len();
    let n_tighter = tighter.apply(&table).len();

    assert_eq!(n_loose, 30);
    assert_eq!(n_tight, 15);
    assert_eq!(n_tighter, 0);
}

#[test]
fn test_summary_for_one_year() {
    let table = daily();
    let rows = FilterSpec::new().year(2012).apply(&table);
    let metrics = KeyMetrics::from_rows(rows);

    assert_eq!(metrics.rows, 3);
    assert_eq!(metrics.total_rentals, 11650);
    assert!((metrics.casual_pct + metrics.registered_pct - 100.0).abs() < 1e-9);
}

#[test]
fn test_warmer_days_have_more_rentals() {
    let table = daily();
    let line = fit_trend(&table, WeatherVariable::Temp, Rider::Total).unwrap();

    assert_eq!(line.points, table.len());
    assert!(line.slope > 0.0);
    assert!(line.r_squared > 0.5);
}

//! Reading the rental tables and turning raw rows into canonical ones.
//!
//! Paths ending in `.gz` are read and written through gzip transparently.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};

use crate::error::{DataError, DataResult};
use crate::records::{CanonicalRecord, RawRecord, WorkingSetRow};

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

fn open_input(path: &Path) -> DataResult<Box<dyn Read>> {
    let file = BufReader::new(File::open(path)?);
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Parses raw rows from any CSV source with a header row.
///
/// Columns not in the raw schema (such as the label columns of a derived
/// file) are ignored.
///
/// # Errors
///
/// [`DataError::Parse`] on the first field that cannot be coerced. Nothing
/// is returned for a partially valid file.
pub fn read_raw_from_reader<R: Read>(reader: R) -> DataResult<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(DataError::from_csv)?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(DataError::from_csv)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let mut raw: RawRecord =
            record
                .deserialize(Some(&headers))
                .map_err(|e| DataError::Parse {
                    line,
                    message: e.to_string(),
                })?;
        raw.line = line;
        rows.push(raw);
    }

    Ok(rows)
}

/// Reads every raw row from the CSV file at `path`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_raw_records(path: impl AsRef<Path>) -> DataResult<Vec<RawRecord>> {
    let rows = read_raw_from_reader(open_input(path.as_ref())?)?;
    debug!(rows = rows.len(), "Raw records read");
    Ok(rows)
}

/// Derives the canonical table from raw rows.
///
/// Row count and row order are preserved exactly; nothing is filtered or
/// deduplicated. The first row that fails to map aborts the whole table.
pub fn normalize(raw: Vec<RawRecord>) -> DataResult<Vec<CanonicalRecord>> {
    raw.into_iter().map(CanonicalRecord::from_raw).collect()
}

/// Loads the working set the dashboard queries against.
///
/// Accepts either a raw table or a derived file written by
/// [`write_working_set`]; labels are always re-derived from the codes.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_working_set(path: impl AsRef<Path>) -> DataResult<Vec<CanonicalRecord>> {
    let raw = read_raw_records(path.as_ref())?;
    let table = normalize(raw)?;

    let hourly = table.iter().filter(|r| r.hour().is_some()).count();
    info!(rows = table.len(), hourly, "Working set loaded");

    Ok(table)
}

/// Writes canonical rows, with their label columns, to any CSV sink.
pub fn write_working_set_to<W: Write>(writer: W, rows: &[CanonicalRecord]) -> DataResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        wtr.serialize(WorkingSetRow::from(row))
            .map_err(DataError::from_csv)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Writes `path` through a sibling `.tmp` file that is renamed over the
/// target only after `write` succeeds and the data is synced. On any error
/// the temp file is removed and the existing target is left untouched.
fn replace_file<F>(path: &Path, write: F) -> DataResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> DataResult<()>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let result = File::create(&tmp_path)
        .map_err(DataError::from)
        .and_then(|file| {
            let mut file = BufWriter::new(file);
            write(&mut file)?;
            file.flush()?;
            file.get_ref().sync_all()?;
            Ok(())
        })
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(DataError::from));

    if let Err(e) = &result {
        warn!(tmp = %tmp_path.display(), error = %e, "Working set write failed, target left unchanged");
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

/// Writes the derived working-set file, replacing any previous one.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), rows = rows.len()))]
pub fn write_working_set(
    path: impl AsRef<Path>,
    rows: &[CanonicalRecord],
) -> DataResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    replace_file(path, |file| {
        if is_gzip(path) {
            let mut encoder = GzEncoder::new(&mut *file, Compression::default());
            write_working_set_to(&mut encoder, rows)?;
            encoder.finish()?;
            Ok(())
        } else {
            write_working_set_to(file, rows)
        }
    })?;

    info!("Working set written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{Season, Weather};
    use std::env;
    use std::fs;

    const HOURLY: &str = "\
instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,0,6,0,1,0.24,0.2879,0.81,0,3,13,16
2,2011-01-01,1,0,1,1,0,6,0,1,0.22,0.2727,0.8,0,8,32,40
3,2011-01-01,1,0,1,2,0,6,0,2,0.22,0.2727,0.8,0,5,27,32
";

    const DAILY: &str = "\
instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,6,0,2,0.344167,0.363625,0.805833,0.160446,331,654,985
2,2011-01-02,1,0,1,0,0,0,2,0.363478,0.353739,0.696087,0.248539,131,670,801
";

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_read_hourly_rows() {
        let rows = read_raw_from_reader(HOURLY.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].hr, Some(1));
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[2].cnt, 32);
    }

    #[test]
    fn test_read_daily_rows_have_no_hour() {
        let rows = read_raw_from_reader(DAILY.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.hr.is_none()));
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        let bad = HOURLY.replace("2011-01-01,1,0,1,1", "2011-13-45,1,0,1,1");
        match read_raw_from_reader(bad.as_bytes()) {
            Err(DataError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_count_is_parse_error() {
        let bad = HOURLY.replace(",3,13,16", ",three,13,16");
        assert!(matches!(
            read_raw_from_reader(bad.as_bytes()),
            Err(DataError::Parse { .. })
        ));
    }

    #[test]
    fn test_normalize_preserves_count_and_order() {
        let raw = read_raw_from_reader(HOURLY.as_bytes()).unwrap();
        let instants: Vec<u64> = raw.iter().map(|r| r.instant).collect();

        let table = normalize(raw).unwrap();

        assert_eq!(table.len(), 3);
        let after: Vec<u64> = table.iter().map(|r| r.raw.instant).collect();
        assert_eq!(after, instants);
        assert!(table.iter().all(|r| r.casual() + r.registered() == r.total()));
        assert_eq!(table[2].weather, Weather::Mist);
    }

    #[test]
    fn test_normalize_unknown_weather_fails() {
        let mut raw = read_raw_from_reader(HOURLY.as_bytes()).unwrap();
        raw[1].weathersit = 5;

        assert!(matches!(
            normalize(raw),
            Err(DataError::Mapping { field: "weather", code: 5, line: 3 })
        ));
    }

    #[test]
    fn test_working_set_file_reloads_identically() {
        let path = temp_path("bikeshare_dash_test_working_set.csv");
        let _ = fs::remove_file(&path);

        let table = normalize(read_raw_from_reader(DAILY.as_bytes()).unwrap()).unwrap();
        write_working_set(&path, &table).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().next().unwrap().ends_with("day_kind"));

        let reloaded = load_working_set(&path).unwrap();
        assert_eq!(reloaded.len(), table.len());
        for (a, b) in reloaded.iter().zip(&table) {
            assert_eq!(a.season, b.season);
            assert_eq!(a.raw.instant, b.raw.instant);
            assert_eq!(a.total(), b.total());
        }
        assert_eq!(reloaded[0].season, Season::Spring);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_gzip_working_set_round_trip() {
        let path = temp_path("bikeshare_dash_test_working_set.csv.gz");
        let _ = fs::remove_file(&path);

        let table = normalize(read_raw_from_reader(HOURLY.as_bytes()).unwrap()).unwrap();
        write_working_set(&path, &table).unwrap();

        let reloaded = load_working_set(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded[1].hour(), Some(1));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_write_leaves_existing_file_untouched() {
        let path = temp_path("bikeshare_dash_test_replace_failure.csv");
        fs::write(&path, "previous contents\n").unwrap();

        let result = replace_file(&path, |file| {
            file.write_all(b"instant,dteday\n1,2011-01-01\n")?;
            Err(DataError::Io(std::io::Error::other("disk full")))
        });

        assert!(matches!(result, Err(DataError::Io(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous contents\n");
        assert!(!temp_path("bikeshare_dash_test_replace_failure.csv.tmp").exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_rewrite_replaces_previous_working_set() {
        let path = temp_path("bikeshare_dash_test_rewrite.csv");
        fs::write(&path, "stale\n").unwrap();

        let table = normalize(read_raw_from_reader(DAILY.as_bytes()).unwrap()).unwrap();
        write_working_set(&path, &table).unwrap();

        assert_eq!(load_working_set(&path).unwrap().len(), 2);
        assert!(!temp_path("bikeshare_dash_test_rewrite.csv.tmp").exists());

        fs::remove_file(&path).unwrap();
    }
}

//! CSV export of the final series.
//!
//! One header row, then one row per (unit, date).

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::WriterBuilder;
use tracing::{debug, info};

use crate::model::SeriesPoint;

pub fn write_csv<W: Write>(writer: W, points: &[SeriesPoint]) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `points` to `path`, replacing any existing file.
pub fn write_csv_file(path: &Path, points: &[SeriesPoint]) -> Result<(), csv::Error> {
    debug!(path = %path.display(), rows = points.len(), "Writing series CSV");
    let file = File::create(path)?;
    write_csv(file, points)?;
    info!(path = %path.display(), rows = points.len(), "Exported series");
    Ok(())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<SeriesPoint>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn points() -> Vec<SeriesPoint> {
        let mut with_policy = SeriesPoint::new(
            "Ha Noi",
            NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
            -41.27,
        );
        with_policy.stringency_index = Some(96.3);
        with_policy.overlay_notes = Some("C1_Notes: Schools closed, nationwide".to_string());

        vec![
            with_policy,
            SeriesPoint::new("Ha Noi", NaiveDate::from_ymd_opt(2020, 4, 2).unwrap(), -39.5),
        ]
    }

    #[test]
    fn test_write_csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &points()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "unit_label,date,metric_value,stringency_index,overlay_notes"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Ha Noi,2020-04-02,-39.5,,");
    }

    #[test]
    fn test_round_trip_preserves_rows() {
        let original = points();
        let mut buf = Vec::new();
        write_csv(&mut buf, &original).unwrap();

        let parsed = read_csv(buf.as_slice()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_gap_point_is_empty_cell() {
        let gap = SeriesPoint::gap("Group 1", NaiveDate::from_ymd_opt(2020, 4, 3).unwrap());
        let mut buf = Vec::new();
        write_csv(&mut buf, std::slice::from_ref(&gap)).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.lines().nth(1), Some("Group 1,2020-04-03,,,"));
        assert_eq!(read_csv(buf.as_slice()).unwrap(), vec![gap]);
    }

    #[test]
    fn test_write_csv_file_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        std::fs::write(&path, "stale").unwrap();

        write_csv_file(&path, &points()).unwrap();

        let parsed = read_csv(File::open(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}

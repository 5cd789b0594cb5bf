//! The semicolon-delimited segment table.
//!
//! ```text
//! shortId;longId;code;Expression;E-box;Arnt;length
//! Integer;String;Integer;Double;Integer;Double;Integer
//! 1;chr1:0-50;1;2.5;1;;50
//! ```
//!
//! One row per segment in segment order. Values a segment does not have are
//! left empty. Paths ending in `.gz` are gzip-compressed.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use segcode_core::models::{FeatureColumn, SegmentSet, ValueType};
use segcode_core::utils::is_gzipped;

use crate::error::ExportError;

pub const DELIMITER: char = ';';

fn format_value(value: Option<f64>, value_type: ValueType) -> String {
    match (value, value_type) {
        (None, _) => String::new(),
        (Some(v), ValueType::Integer) => format!("{}", v.round() as i64),
        (Some(v), _) => format!("{}", v),
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    set: &SegmentSet,
    columns: &[&FeatureColumn],
) -> std::io::Result<()> {
    let mut header = vec!["shortId".to_string(), "longId".to_string(), "code".to_string()];
    header.extend(columns.iter().map(|c| c.label.clone()));
    header.push("length".to_string());
    writeln!(writer, "{}", header.join(&DELIMITER.to_string()))?;

    let mut types = vec![
        ValueType::Integer.to_string(),
        ValueType::String.to_string(),
        ValueType::Integer.to_string(),
    ];
    types.extend(columns.iter().map(|c| c.value_type.to_string()));
    types.push(ValueType::Integer.to_string());
    writeln!(writer, "{}", types.join(&DELIMITER.to_string()))?;

    for segment in &set.segments {
        let mut row = vec![
            segment.short_id.to_string(),
            segment.long_id.clone(),
            segment.code.to_string(),
        ];
        row.extend(
            columns
                .iter()
                .map(|c| format_value(segment.feature(&c.key), c.value_type)),
        );
        row.push(segment.length().to_string());
        writeln!(writer, "{}", row.join(&DELIMITER.to_string()))?;
    }
    Ok(())
}

///
/// Write the segment table to `path` and return the number of segment rows.
///
/// Dataset columns are not part of the table; the remaining `columns` are
/// written in the order given.
///
pub fn export_segments<T: AsRef<Path>>(
    set: &SegmentSet,
    columns: &[FeatureColumn],
    path: T,
) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let columns: Vec<&FeatureColumn> = columns.iter().filter(|c| !c.is_dataset()).collect();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;

    if is_gzipped(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_table(&mut encoder, set, &columns)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_table(&mut writer, set, &columns)?;
        writer.flush()?;
    }

    log::info!(
        "Exported {} segments with {} feature columns to {}",
        set.len(),
        columns.len(),
        path.display()
    );
    Ok(set.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::BufRead;

    use segcode_core::models::{FeatureKey, Segment};
    use segcode_core::utils::get_dynamic_reader;

    fn expression() -> FeatureColumn {
        FeatureColumn {
            key: FeatureKey::Additional("expr".to_string()),
            label: "Expression".to_string(),
            column_number: 1,
            value_type: ValueType::Double,
        }
    }

    fn make_set() -> SegmentSet {
        let mut first = Segment::new("chr1", 0, 50, 1);
        first.short_id = 1;
        first
            .features
            .insert(FeatureKey::Additional("expr".to_string()), 2.5);
        first.features.insert(FeatureKey::Dataset(0), 1.0);
        let mut second = Segment::new("chr1", 50, 60, 3);
        second.short_id = 2;
        second.short = true;
        SegmentSet {
            segments: vec![first, second],
            min_segment_length: 20,
            dataset_count: 2,
            dropped_peaks: 0,
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        get_dynamic_reader(path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect()
    }

    #[rstest]
    #[case("segments.data")]
    #[case("segments.data.gz")]
    fn test_export_rows(#[case] file_name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        let dataset = FeatureColumn {
            key: FeatureKey::Dataset(0),
            label: "Mark A".to_string(),
            column_number: 0,
            value_type: ValueType::Integer,
        };

        let rows = export_segments(&make_set(), &[dataset, expression()], &path).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            read_lines(&path),
            vec![
                "shortId;longId;code;Expression;length",
                "Integer;String;Integer;Double;Integer",
                "1;chr1:0-50;1;2.5;50",
                "2;chr1:50-60;3;;10",
            ]
        );
    }

    #[rstest]
    fn test_gz_is_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.data.gz");
        export_segments(&make_set(), &[expression()], &path).unwrap();
        let magic = std::fs::read(&path).unwrap();
        assert_eq!(&magic[..2], &[0x1f, 0x8b]);
    }

    #[rstest]
    #[case(Some(3.0), ValueType::Integer, "3")]
    #[case(Some(0.25), ValueType::Double, "0.25")]
    #[case(None, ValueType::Double, "")]
    fn test_format_value(
        #[case] value: Option<f64>,
        #[case] value_type: ValueType,
        #[case] expected: &str,
    ) {
        assert_eq!(format_value(value, value_type), expected);
    }

    #[rstest]
    fn test_bad_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let result = export_segments(&make_set(), &[], blocker.join("out.data"));
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}

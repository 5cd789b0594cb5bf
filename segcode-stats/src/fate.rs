use rayon::prelude::*;

use segcode_core::models::{FeatureKey, SegmentSet};

use crate::errors::{Result, StatsError};
use crate::models::{FateMatrix, FateOfCode, FateOfCodeParameter};

/// Matrices are `2^n x 2^n`; this caps them at 1024 x 1024.
pub const MAX_FATE_DATASETS: usize = 10;

impl FateOfCodeParameter {
    ///
    /// Check the selection against the reference dataset count and the
    /// additional data files that exist.
    ///
    pub fn validate<S: AsRef<str>>(&self, dataset_count: usize, known_files: &[S]) -> Result<()> {
        self.check_shape(dataset_count)?;
        for (_, files) in &self.selection {
            if let Some(unknown) = files
                .iter()
                .find(|f| !known_files.iter().any(|k| k.as_ref() == f.as_str()))
            {
                return Err(StatsError::UnknownDataFile(unknown.clone()));
            }
        }
        Ok(())
    }

    fn check_shape(&self, dataset_count: usize) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(StatsError::InvalidThreshold(self.threshold));
        }
        if self.selection.is_empty() {
            return Err(StatsError::EmptySelection);
        }
        if dataset_count > MAX_FATE_DATASETS {
            return Err(StatsError::TooManyDatasets(dataset_count, MAX_FATE_DATASETS));
        }
        for (column, files) in &self.selection {
            if files.len() != dataset_count {
                return Err(StatsError::SelectionSize {
                    column: *column,
                    expected: dataset_count,
                    found: files.len(),
                });
            }
        }
        Ok(())
    }
}

fn fate_matrix(
    set: &SegmentSet,
    column: usize,
    files: &[String],
    threshold: f64,
) -> FateMatrix {
    let number_of_codes = set.number_of_codes();
    let keys: Vec<FeatureKey> = files
        .iter()
        .map(|f| FeatureKey::Additional(f.clone()))
        .collect();
    let mut counts = vec![vec![0u64; number_of_codes]; number_of_codes];
    let mut incomplete = 0;

    'segments: for segment in set.iter_long() {
        let mut to_code = 0usize;
        for (bit, key) in keys.iter().enumerate() {
            match segment.feature(key) {
                Some(value) if value >= threshold => to_code |= 1 << bit,
                Some(_) => {}
                None => {
                    incomplete += 1;
                    continue 'segments;
                }
            }
        }
        if to_code != 0 {
            counts[segment.code as usize][to_code] += 1;
        }
    }

    if incomplete > 0 {
        log::debug!(
            "Fate-of-code column {}: {} segments without values skipped",
            column,
            incomplete
        );
    }

    FateMatrix {
        column,
        files: files.to_vec(),
        counts,
    }
}

///
/// One `number_of_codes x number_of_codes` matrix per selected column.
///
/// For each long segment, bit `i` of its `to_code` is set when the value of
/// the column's `i`-th file reaches the threshold. The segment is counted in
/// `counts[code][to_code]` unless `to_code` is zero, so a row sums to the
/// number of segments of that code exceeding the threshold somewhere in the
/// column. Segments missing any of the column's values are left out.
///
pub(crate) fn fate_of_code(set: &SegmentSet, param: &FateOfCodeParameter) -> Result<FateOfCode> {
    param.check_shape(set.dataset_count)?;

    let matrices = param
        .selection
        .par_iter()
        .map(|(column, files)| fate_matrix(set, *column, files, param.threshold))
        .collect();

    Ok(FateOfCode {
        number_of_codes: set.number_of_codes(),
        threshold: param.threshold,
        matrices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use segcode_core::models::Segment;

    use crate::statistics::SegmentSetStatistics;

    fn additional(id: &str) -> FeatureKey {
        FeatureKey::Additional(id.to_string())
    }

    /// two datasets; each row is (code, a_late, b_late)
    fn make_set(rows: Vec<(u32, Option<f64>, Option<f64>)>) -> SegmentSet {
        SegmentSet {
            segments: rows
                .into_iter()
                .enumerate()
                .map(|(i, (code, a, b))| {
                    let start = i as u32 * 100;
                    let mut s = Segment::new("chr1", start, start + 50, code);
                    s.short_id = i + 1;
                    if let Some(a) = a {
                        s.features.insert(additional("a_late"), a);
                    }
                    if let Some(b) = b {
                        s.features.insert(additional("b_late"), b);
                    }
                    s
                })
                .collect(),
            min_segment_length: 10,
            dataset_count: 2,
            dropped_peaks: 0,
        }
    }

    fn param(threshold: f64) -> FateOfCodeParameter {
        FateOfCodeParameter {
            selection: vec![(4, vec!["a_late".to_string(), "b_late".to_string()])],
            threshold,
        }
    }

    #[rstest]
    fn test_transition_counts() {
        let set = make_set(vec![
            (1, Some(5.0), Some(0.0)),
            (1, Some(5.0), Some(5.0)),
            (1, Some(0.0), Some(0.0)),
            (2, Some(0.0), Some(9.0)),
            (3, Some(1.0), Some(1.0)),
        ]);
        let fate = set.fate_of_code(&param(1.0)).unwrap();
        assert_eq!(fate.number_of_codes, 4);
        assert_eq!(fate.matrices.len(), 1);

        let counts = &fate.matrices[0].counts;
        assert_eq!(counts[1], vec![0, 1, 0, 1]);
        assert_eq!(counts[2], vec![0, 0, 1, 0]);
        assert_eq!(counts[3], vec![0, 0, 0, 1]);
        assert_eq!(counts[0], vec![0, 0, 0, 0]);
        assert_eq!(fate.matrices[0].column, 4);
    }

    #[rstest]
    fn test_row_sums_equal_segments_over_threshold() {
        let set = make_set(vec![
            (1, Some(2.0), Some(0.5)),
            (1, Some(0.1), Some(0.2)),
            (3, Some(0.1), Some(3.0)),
            (3, Some(4.0), Some(4.0)),
            (2, Some(0.0), Some(0.0)),
        ]);
        let threshold = 1.0;
        let fate = set.fate_of_code(&param(threshold)).unwrap();
        let counts = &fate.matrices[0].counts;

        for code in 0..4u32 {
            let exceeding = set
                .segments
                .iter()
                .filter(|s| s.code == code)
                .filter(|s| {
                    [additional("a_late"), additional("b_late")]
                        .iter()
                        .any(|k| s.feature(k).unwrap_or(0.0) >= threshold)
                })
                .count() as u64;
            assert_eq!(counts[code as usize].iter().sum::<u64>(), exceeding);
        }
    }

    #[rstest]
    fn test_segments_missing_values_are_skipped() {
        let set = make_set(vec![(1, Some(5.0), None), (1, Some(5.0), Some(0.0))]);
        let fate = set.fate_of_code(&param(1.0)).unwrap();
        assert_eq!(fate.matrices[0].counts[1], vec![0, 1, 0, 0]);
    }

    #[rstest]
    fn test_selection_order_is_kept() {
        let set = make_set(vec![(1, Some(5.0), Some(0.0))]);
        let p = FateOfCodeParameter {
            selection: vec![
                (9, vec!["b_late".to_string(), "a_late".to_string()]),
                (2, vec!["a_late".to_string(), "b_late".to_string()]),
            ],
            threshold: 1.0,
        };
        let fate = set.fate_of_code(&p).unwrap();
        let columns: Vec<usize> = fate.matrices.iter().map(|m| m.column).collect();
        assert_eq!(columns, vec![9, 2]);
        assert_eq!(fate.matrices[0].counts[1][2], 1);
        assert_eq!(fate.matrices[1].counts[1][1], 1);
    }

    #[rstest]
    fn test_invalid_selection() {
        let set = make_set(vec![]);
        let short = FateOfCodeParameter {
            selection: vec![(0, vec!["a_late".to_string()])],
            threshold: 1.0,
        };
        assert!(matches!(
            set.fate_of_code(&short),
            Err(StatsError::SelectionSize { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            set.fate_of_code(&param(f64::NAN)),
            Err(StatsError::InvalidThreshold(_))
        ));
    }

    #[rstest]
    fn test_validate_against_known_files() {
        let p = param(1.0);
        assert!(p.validate(2, &["a_late", "b_late", "c_late"]).is_ok());
        assert!(matches!(
            p.validate(2, &["a_late"]),
            Err(StatsError::UnknownDataFile(f)) if f == "b_late"
        ));
        assert!(matches!(
            p.validate(11, &["a_late", "b_late"]),
            Err(StatsError::TooManyDatasets(11, 10))
        ));
    }
}

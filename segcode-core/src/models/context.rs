use std::fs::read_to_string;
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::errors::{Result, SegcodeError};
use crate::models::{
    DataFile, DataFileKind, FeatureColumn, FeatureKey, Motif, MotifMode, PeakSet,
    PositionWeightMatrix, SegmentSet, SignalTrack, ValueType, parse_jaspar,
};
use crate::utils::resolve_path;

///
/// Everything one analysis run works against: the reference genome, the
/// loaded inputs, the feature definitions and, once built, the segmentation.
///
/// One context per analysis session. It is passed explicitly into every
/// operation; there is no process-wide state.
///
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub genome: PathBuf,
    pub threads: usize,
    pub min_segment_length: u32,
    pub datasets: Vec<DataFile>,
    /// peaks of `datasets[i]`
    pub peaks: Vec<PeakSet>,
    pub additional: Vec<DataFile>,
    /// measurements of `additional[i]`
    pub signals: Vec<SignalTrack>,
    pub motifs: Vec<Motif>,
    pub pwms: Vec<PositionWeightMatrix>,
    pub segments: Option<SegmentSet>,
}

impl TryFrom<&AnalysisConfig> for AnalysisContext {
    type Error = SegcodeError;

    ///
    /// Load every input named by the configuration. Any unreadable or
    /// malformed input fails the whole load.
    ///
    fn try_from(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let base = config.base_dir.as_deref();
        let mut column_number = 0;

        let mut datasets = Vec::with_capacity(config.datasets.len());
        let mut peaks = Vec::with_capacity(config.datasets.len());
        for (i, ds) in config.datasets.iter().enumerate() {
            let path = resolve_path(base, &ds.path);
            let peak_set = PeakSet::try_from(path.as_path())?;
            log::info!(
                "Loaded dataset '{}': {} peaks ({} dropped)",
                ds.id,
                peak_set.len(),
                peak_set.dropped
            );
            datasets.push(DataFile {
                id: ds.id.clone(),
                name: ds.name.clone().unwrap_or_else(|| ds.id.clone()),
                path,
                kind: DataFileKind::Reference,
                use_score: ds.use_score,
                column_number,
                data_list_number: i,
                lengths: peak_set.lengths.clone(),
            });
            peaks.push(peak_set);
            column_number += 1;
        }

        let mut additional = Vec::with_capacity(config.additional.len());
        let mut signals = Vec::with_capacity(config.additional.len());
        for (i, ad) in config.additional.iter().enumerate() {
            let path = resolve_path(base, &ad.path);
            let track = SignalTrack::try_from(path.as_path())?;
            log::info!("Loaded additional data '{}': {} records", ad.id, track.len());
            additional.push(DataFile {
                id: ad.id.clone(),
                name: ad.name.clone().unwrap_or_else(|| ad.id.clone()),
                path,
                kind: DataFileKind::Additional,
                use_score: false,
                column_number,
                data_list_number: i,
                lengths: Default::default(),
            });
            signals.push(track);
            column_number += 1;
        }

        let mut motifs = Vec::with_capacity(config.motifs.len());
        for mc in &config.motifs {
            let motif = Motif {
                id: mc.id.clone(),
                name: mc.name.clone().unwrap_or_else(|| mc.id.clone()),
                pattern: mc.pattern.to_ascii_uppercase(),
                mode: mc.mode,
                both_strands: mc.both_strands,
                column_number,
            };
            motif.validate()?;
            motifs.push(motif);
            column_number += 1;
        }

        let mut pwms = Vec::with_capacity(config.pwms.len());
        for pc in &config.pwms {
            let mut pwm = match (&pc.path, &pc.matrix) {
                (Some(path), _) => {
                    let path = resolve_path(base, path);
                    let text = read_to_string(&path)?;
                    parse_jaspar(&text)?.into_iter().next().ok_or_else(|| {
                        SegcodeError::MatrixParseError(format!(
                            "no matrix found in {}",
                            path.display()
                        ))
                    })?
                }
                (None, Some(rows)) => {
                    let mut pwm = PositionWeightMatrix::new(&pc.id, &pc.id, rows.clone());
                    pwm.normalized = pc.normalized;
                    pwm
                }
                (None, None) => {
                    return Err(SegcodeError::Config(format!(
                        "pwm '{}' has no matrix",
                        pc.id
                    )));
                }
            };
            pwm.id = pc.id.clone();
            if let Some(name) = &pc.name {
                pwm.name = name.clone();
            }
            pwm.aggregate = pc.aggregate;
            pwm.both_strands = pc.both_strands;
            pwm.column_number = column_number;
            pwm.validate()?;
            pwm.normalize(pc.pseudocount)?;
            pwms.push(pwm);
            column_number += 1;
        }

        Ok(AnalysisContext {
            genome: resolve_path(base, &config.genome),
            threads: config.thread_count(),
            min_segment_length: config.min_segment_length,
            datasets,
            peaks,
            additional,
            signals,
            motifs,
            pwms,
            segments: None,
        })
    }
}

impl AnalysisContext {
    /// Invalid peaks dropped across all reference datasets.
    pub fn dropped_peaks(&self) -> usize {
        self.peaks.iter().map(|p| p.dropped).sum()
    }

    /// Forget the segmentation, e.g. before a new import.
    pub fn clear(&mut self) {
        self.segments = None;
    }

    pub fn additional_by_id(&self, id: &str) -> Option<&DataFile> {
        self.additional.iter().find(|d| d.id == id)
    }

    ///
    /// All numeric feature columns: datasets, then additional data, then
    /// motifs, then PWMs, each in ascending `column_number`.
    ///
    pub fn feature_columns(&self) -> Vec<FeatureColumn> {
        let mut columns: Vec<FeatureColumn> = Vec::new();

        columns.extend(self.datasets.iter().map(|d| FeatureColumn {
            key: FeatureKey::Dataset(d.data_list_number),
            label: d.name.clone(),
            column_number: d.column_number,
            value_type: if d.use_score {
                ValueType::Double
            } else {
                ValueType::Integer
            },
        }));
        columns.extend(self.additional.iter().map(|d| FeatureColumn {
            key: FeatureKey::Additional(d.id.clone()),
            label: d.name.clone(),
            column_number: d.column_number,
            value_type: ValueType::Double,
        }));
        columns.extend(self.motifs.iter().map(|m| FeatureColumn {
            key: FeatureKey::Motif(m.id.clone()),
            label: m.name.clone(),
            column_number: m.column_number,
            value_type: match m.mode {
                MotifMode::Count => ValueType::Integer,
                MotifMode::Rate => ValueType::Double,
            },
        }));
        columns.extend(self.pwms.iter().map(|p| FeatureColumn {
            key: FeatureKey::Pwm(p.id.clone()),
            label: p.name.clone(),
            column_number: p.column_number,
            value_type: ValueType::Double,
        }));

        // stable: groups stay in order, ordinals ascend inside each group
        columns.sort_by_key(|c| {
            let group = match c.key {
                FeatureKey::Dataset(_) => 0,
                FeatureKey::Additional(_) => 1,
                FeatureKey::Motif(_) => 2,
                FeatureKey::Pwm(_) => 3,
            };
            (group, c.column_number)
        });
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn load_test_context() -> AnalysisContext {
        let path = PathBuf::from("../tests/data/config/analysis.toml");
        let config = AnalysisConfig::try_from(path.as_path()).unwrap();
        AnalysisContext::try_from(&config).unwrap()
    }

    #[rstest]
    fn test_context_from_config() {
        let ctx = load_test_context();
        assert_eq!(ctx.datasets.len(), 3);
        assert_eq!(ctx.peaks.len(), 3);
        assert_eq!(ctx.datasets[2].bit(), 0b100);
        assert_eq!(ctx.min_segment_length, 20);
        assert!(ctx.genome.ends_with("genome/toy.fa"));
        assert!(ctx.pwms.iter().all(|p| p.normalized));
        assert!(ctx.segments.is_none());
    }

    #[rstest]
    fn test_feature_column_order() {
        let ctx = load_test_context();
        let columns = ctx.feature_columns();
        let numbers: Vec<usize> = columns.iter().map(|c| c.column_number).collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        assert_eq!(numbers, sorted);
        assert!(columns[0].is_dataset());
        assert!(matches!(columns.last().unwrap().key, FeatureKey::Pwm(_)));
        assert_eq!(
            columns.len(),
            ctx.datasets.len() + ctx.additional.len() + ctx.motifs.len() + ctx.pwms.len()
        );
    }

    #[rstest]
    fn test_missing_dataset_file_fails_load() {
        let mut config: AnalysisConfig = toml::from_str(
            r#"
            genome = "genome.fa"
            [[datasets]]
            id = "a"
            path = "missing.bed"
            "#,
        )
        .unwrap();
        config.base_dir = Some(PathBuf::from("../tests/data/peaks"));
        assert!(AnalysisContext::try_from(&config).is_err());
    }
}

use std::io::BufRead;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rstest::*;

use segcode::core::config::AnalysisConfig;
use segcode::core::models::{AnalysisContext, FeatureKey};
use segcode::core::utils::get_dynamic_reader;
use segcode::engine::{Engine, EngineError, Request};
use segcode::io::{AnalysisResult, MemorySink, PublishError, ResultKind, ResultPublisher};
use segcode::seq::InMemoryGenome;
use segcode::stats::FateOfCodeParameter;

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap()
        .join("../tests/data/config/analysis.toml")
}

fn context_with_genome(genome: &str) -> AnalysisContext {
    let mut config = AnalysisConfig::try_from(config_path().as_path()).unwrap();
    config.genome = PathBuf::from(genome);
    AnalysisContext::try_from(&config).unwrap()
}

#[fixture]
fn engine_and_sink() -> (Engine, MemorySink) {
    let sink = MemorySink::new();
    let engine = Engine::from_config(&config_path(), ResultPublisher::new(sink.clone())).unwrap();
    (engine, sink)
}

fn find(sink: &MemorySink, kind: ResultKind) -> AnalysisResult {
    sink.results()
        .into_iter()
        .rev()
        .find(|r| r.kind() == kind)
        .unwrap()
}

#[rstest]
fn test_all_publishes_each_view(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, sink) = engine_and_sink;
    engine.handle(Request::All).unwrap();

    assert_eq!(
        sink.kinds(),
        vec![
            ResultKind::Segmentation,
            ResultKind::DroppedPeaks,
            ResultKind::FeatureScores,
            ResultKind::CodeDistribution,
            ResultKind::LengthDistributions,
            ResultKind::SegmentPairs,
            ResultKind::ShortSegmentChains,
            ResultKind::BreakSegments,
            ResultKind::Correlation,
        ]
    );

    let AnalysisResult::Segmentation(summary) = find(&sink, ResultKind::Segmentation) else {
        panic!("expected a segmentation summary");
    };
    assert_eq!(summary.segments, 19);
    assert_eq!(summary.long_segments, 12);
    assert_eq!(summary.short_segments, 7);
    assert_eq!(summary.chromosomes, 2);
}

#[rstest]
fn test_scores_are_attached(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, sink) = engine_and_sink;
    engine.handle(Request::Segment).unwrap();
    engine.handle(Request::Score).unwrap();

    let AnalysisResult::FeatureScores(report) = find(&sink, ResultKind::FeatureScores) else {
        panic!("expected feature scores");
    };
    assert_eq!(report.scored_segments, 12);
    assert_eq!(report.skipped_segments, 0);

    let set = engine.segments().unwrap();
    let first = &set.segments[0];
    assert_eq!((first.start, first.end, first.code), (0, 50, 1));
    assert_eq!(
        first.feature(&FeatureKey::Additional("expression".to_string())),
        Some(2.5)
    );
    // planted E-box at chr1:20-26
    assert!(first.feature(&FeatureKey::Motif("ebox".to_string())).unwrap() >= 1.0);
    assert!(first.feature(&FeatureKey::Pwm("arnt".to_string())).is_some());

    // mark_b reports the peak score
    let second = &set.segments[1];
    assert_eq!(second.feature(&FeatureKey::Dataset(1)), Some(4.0));

    // short segments carry no feature scores
    assert!(
        set.iter_short()
            .all(|s| s.feature(&FeatureKey::Motif("ebox".to_string())).is_none())
    );
}

#[rstest]
fn test_correlation_shape(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, sink) = engine_and_sink;
    engine.handle(Request::Segment).unwrap();
    engine.handle(Request::Score).unwrap();
    engine.handle(Request::Correlation).unwrap();

    let AnalysisResult::Correlation(matrix) = find(&sink, ResultKind::Correlation) else {
        panic!("expected a correlation matrix");
    };
    let columns = engine.context().feature_columns();
    assert_eq!(matrix.size(), columns.len());
    assert_eq!(matrix.observations, 12);
    assert!(matches!(matrix.keys[0], FeatureKey::Dataset(0)));
    for i in 0..matrix.size() {
        for j in 0..matrix.size() {
            let (a, b) = (matrix.get(i, j), matrix.get(j, i));
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}

#[rstest]
fn test_fate_of_code(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, sink) = engine_and_sink;
    engine.handle(Request::Segment).unwrap();
    engine.handle(Request::Score).unwrap();

    let param = FateOfCodeParameter {
        selection: vec![(
            4,
            vec![
                "a_late".to_string(),
                "b_late".to_string(),
                "c_late".to_string(),
            ],
        )],
        threshold: 5.0,
    };
    engine.handle(Request::FateOfCode(param)).unwrap();

    let AnalysisResult::FateOfCode(fate) = find(&sink, ResultKind::FateOfCode) else {
        panic!("expected fate-of-code matrices");
    };
    assert_eq!(fate.number_of_codes, 8);
    let counts = &fate.matrices[0].counts;
    let total: u64 = counts.iter().flatten().sum();
    assert_eq!(total, 9);
    assert_eq!(counts[1][1], 1);
    assert_eq!(counts[1][2], 1);
    assert_eq!(counts[2][2], 2);
    assert_eq!(counts[6][2], 1);
    assert_eq!(counts[6][6], 1);
}

#[rstest]
fn test_fate_of_code_unknown_file(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, _sink) = engine_and_sink;
    engine.handle(Request::Segment).unwrap();
    let param = FateOfCodeParameter {
        selection: vec![(0, vec!["x".to_string(), "y".to_string(), "z".to_string()])],
        threshold: 1.0,
    };
    assert!(matches!(
        engine.handle(Request::FateOfCode(param)),
        Err(EngineError::Stats(_))
    ));
}

#[rstest]
fn test_views_need_segmentation(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, sink) = engine_and_sink;
    assert!(matches!(
        engine.handle(Request::CodeDistribution),
        Err(EngineError::NotSegmented)
    ));
    // dropped peaks only need the loaded inputs
    engine.handle(Request::DroppedPeaks).unwrap();
    assert!(matches!(
        find(&sink, ResultKind::DroppedPeaks),
        AnalysisResult::DroppedPeaks { count: 0 }
    ));
    // a failed request does not leave its kind marked as running
    engine.handle(Request::Segment).unwrap();
    engine.handle(Request::CodeDistribution).unwrap();
}

#[rstest]
fn test_export(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, sink) = engine_and_sink;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("segments.data.gz");

    engine.handle(Request::Segment).unwrap();
    engine.handle(Request::Score).unwrap();
    engine
        .handle(Request::Export { path: path.clone() })
        .unwrap();

    assert!(matches!(
        find(&sink, ResultKind::Export),
        AnalysisResult::Export { rows: 19, .. }
    ));

    let lines: Vec<String> = get_dynamic_reader(&path)
        .unwrap()
        .lines()
        .map(|l| l.unwrap())
        .collect();
    assert_eq!(lines.len(), 21);
    assert_eq!(
        lines[0],
        "shortId;longId;code;Expression;a_late;b_late;c_late;E-box;cpg;Arnt;TATA-like;length"
    );
    assert_eq!(
        lines[1],
        "Integer;String;Integer;Double;Double;Double;Double;Integer;Double;Double;Double;Integer"
    );
    assert!(lines[2].starts_with("1;chr1:0-50;1;2.5;8;0;0;"));
    assert!(lines[2].ends_with(";50"));
}

#[rstest]
fn test_request_json() {
    let request: Request = serde_json::from_str(r#"{"request":"export","path":"out.data"}"#).unwrap();
    assert_eq!(
        request,
        Request::Export {
            path: PathBuf::from("out.data")
        }
    );
    let fate: Request = serde_json::from_str(
        r#"{"request":"fate_of_code","selection":[[0,["a","b"]]],"threshold":2.0}"#,
    )
    .unwrap();
    assert_eq!(fate.kind(), Some(ResultKind::FateOfCode));
}

#[rstest]
fn test_missing_genome_fails_before_publishing() {
    let sink = MemorySink::new();
    let ctx = context_with_genome("../genome/missing.fa");
    let result = Engine::new(ctx, ResultPublisher::new(sink.clone()));
    assert!(matches!(result, Err(EngineError::Genome(_))));
    assert!(sink.results().is_empty());
}

#[rstest]
fn test_supplied_accessor_replaces_genome_file() {
    let sink = MemorySink::new();
    let ctx = context_with_genome("../genome/missing.fa");
    let bases = "ACGT".repeat(100);
    let genome: InMemoryGenome = [("chr1", bases.as_bytes())].into_iter().collect();
    let mut engine =
        Engine::with_accessor(ctx, ResultPublisher::new(sink.clone()), Box::new(genome)).unwrap();
    engine.handle(Request::Segment).unwrap();
    engine.handle(Request::Score).unwrap();

    let AnalysisResult::FeatureScores(report) = find(&sink, ResultKind::FeatureScores) else {
        panic!("expected feature scores");
    };
    // chr2 is not in the supplied genome
    assert_eq!(report.scored_segments, 12);
    assert_eq!(report.skipped_segments, 3);
}

#[rstest]
fn test_segmentation_runs_on_configured_pool(engine_and_sink: (Engine, MemorySink)) {
    let (mut engine, _sink) = engine_and_sink;
    assert_eq!(engine.threads(), 2);
    engine.handle(Request::Segment).unwrap();
    assert_eq!(engine.segments().unwrap().len(), 19);
}

#[rstest]
fn test_shared_publisher_rejects_running_kind() {
    let sink = MemorySink::new();
    let publisher = ResultPublisher::new(sink.clone());
    let mut engine = Engine::from_config(&config_path(), publisher.clone()).unwrap();

    let guard = publisher.begin(ResultKind::Segmentation).unwrap();
    assert!(matches!(
        engine.handle(Request::Segment),
        Err(EngineError::Publish(PublishError::AlreadyRunning(
            ResultKind::Segmentation
        )))
    ));
    assert!(sink.results().is_empty());

    drop(guard);
    engine.handle(Request::Segment).unwrap();
    assert_eq!(sink.kinds(), vec![ResultKind::Segmentation]);
}

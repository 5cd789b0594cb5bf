//! Request dispatch for one analysis session.
//!
//! The [Engine] owns the [AnalysisContext], the opened reference genome and a
//! rayon pool sized from the context. Each [Request] is handled to completion
//! on the calling thread; the work inside it runs on the pool. Every result is
//! published the moment it is computed.
//!
//! Requests to one engine are serialized by `&mut self`. Engines sharing a
//! cloned [ResultPublisher] reject a request whose kind is already running
//! on another engine.
use std::path::{Path, PathBuf};

use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use segcode_core::SegcodeError;
use segcode_core::config::AnalysisConfig;
use segcode_core::models::{AnalysisContext, SegmentSet};
use segcode_io::{
    AnalysisResult, ExportError, PublishError, ResultKind, ResultPublisher, export_segments,
};
use segcode_scoring::{ScoringError, score_context};
use segcode_segment::{CodeAssigner, SegmentationError};
use segcode_seq::{IndexedFasta, SequenceAccessor, SequenceError};
use segcode_stats::{FateOfCodeParameter, SegmentSetStatistics, StatsError};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] SegcodeError),

    #[error("Reference genome: {0}")]
    Genome(#[from] SequenceError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("Could not build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("No segmentation yet, send a segment request first")]
    NotSegmented,
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// What the collaborator can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum Request {
    /// (re)build the segmentation
    Segment,
    Score,
    CodeDistribution,
    LengthDistributions,
    SegmentPairs,
    ShortSegmentChains,
    BreakSegments,
    Correlation,
    FateOfCode(FateOfCodeParameter),
    DroppedPeaks,
    Export { path: PathBuf },
    /// segment, score, then every view that needs no parameters
    All,
}

impl Request {
    /// Kind of the result this request publishes; `None` for [Request::All].
    pub fn kind(&self) -> Option<ResultKind> {
        let kind = match self {
            Request::Segment => ResultKind::Segmentation,
            Request::Score => ResultKind::FeatureScores,
            Request::CodeDistribution => ResultKind::CodeDistribution,
            Request::LengthDistributions => ResultKind::LengthDistributions,
            Request::SegmentPairs => ResultKind::SegmentPairs,
            Request::ShortSegmentChains => ResultKind::ShortSegmentChains,
            Request::BreakSegments => ResultKind::BreakSegments,
            Request::Correlation => ResultKind::Correlation,
            Request::FateOfCode(_) => ResultKind::FateOfCode,
            Request::DroppedPeaks => ResultKind::DroppedPeaks,
            Request::Export { .. } => ResultKind::Export,
            Request::All => return None,
        };
        Some(kind)
    }
}

pub struct Engine {
    ctx: AnalysisContext,
    genome: Box<dyn SequenceAccessor>,
    pool: ThreadPool,
    publisher: ResultPublisher,
    show_progress: bool,
}

impl Engine {
    ///
    /// Open the context's reference genome and size the pool. A missing or
    /// unreadable genome fails here, before any request is handled.
    ///
    pub fn new(ctx: AnalysisContext, publisher: ResultPublisher) -> Result<Self> {
        let genome = IndexedFasta::try_from(ctx.genome.as_path())?;
        Engine::with_accessor(ctx, publisher, Box::new(genome))
    }

    /// Like [Engine::new], reading bases from `genome` instead of the
    /// context's genome file.
    pub fn with_accessor(
        ctx: AnalysisContext,
        publisher: ResultPublisher,
        genome: Box<dyn SequenceAccessor>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.threads.max(1))
            .build()?;
        Ok(Engine {
            ctx,
            genome,
            pool,
            publisher,
            show_progress: false,
        })
    }

    /// Load the configuration at `path` and every input it names.
    pub fn from_config(path: &Path, publisher: ResultPublisher) -> Result<Self> {
        let config = AnalysisConfig::try_from(path)?;
        let ctx = AnalysisContext::try_from(&config)?;
        Engine::new(ctx, publisher)
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    pub fn segments(&self) -> Option<&SegmentSet> {
        self.ctx.segments.as_ref()
    }

    /// Drop the segmentation and everything scored on it.
    pub fn clear(&mut self) {
        self.ctx.clear();
    }

    fn require_segments(&self) -> Result<&SegmentSet> {
        self.ctx.segments.as_ref().ok_or(EngineError::NotSegmented)
    }

    /// Worker threads of the engine's pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    ///
    /// Handle one request and publish its result. [Request::All] publishes
    /// one result per step, each as soon as it is done.
    ///
    pub fn handle(&mut self, request: Request) -> Result<()> {
        let Some(kind) = request.kind() else {
            return self.handle_all();
        };
        let _guard = self.publisher.begin(kind)?;
        log::info!("Handling {} request", kind);

        let result = match request {
            Request::Segment => {
                let ctx = &mut self.ctx;
                let summary = self.pool.install(|| CodeAssigner::segment_context(ctx))?;
                AnalysisResult::Segmentation(summary)
            }
            Request::Score => {
                self.require_segments()?;
                let report = score_context(
                    &mut self.ctx,
                    self.genome.as_ref(),
                    &self.pool,
                    self.show_progress,
                )?;
                AnalysisResult::FeatureScores(report)
            }
            Request::CodeDistribution => AnalysisResult::CodeDistribution {
                distribution: self.require_segments()?.code_distribution(),
            },
            Request::LengthDistributions => {
                AnalysisResult::LengthDistributions(self.require_segments()?.length_distributions())
            }
            Request::SegmentPairs => {
                AnalysisResult::SegmentPairs(self.require_segments()?.segment_pairs())
            }
            Request::ShortSegmentChains => {
                AnalysisResult::ShortSegmentChains(self.require_segments()?.short_segment_chains())
            }
            Request::BreakSegments => {
                AnalysisResult::BreakSegments(self.require_segments()?.break_segments())
            }
            Request::Correlation => {
                let set = self.require_segments()?;
                let columns = self.ctx.feature_columns();
                let matrix = self.pool.install(|| set.correlation_matrix(&columns));
                AnalysisResult::Correlation(matrix)
            }
            Request::FateOfCode(param) => {
                let set = self.require_segments()?;
                let known: Vec<&str> = self.ctx.additional.iter().map(|d| d.id.as_str()).collect();
                param.validate(self.ctx.datasets.len(), known.as_slice())?;
                let fate = self.pool.install(|| set.fate_of_code(&param))?;
                AnalysisResult::FateOfCode(fate)
            }
            Request::DroppedPeaks => AnalysisResult::DroppedPeaks {
                count: self.ctx.dropped_peaks(),
            },
            Request::Export { path } => {
                let set = self.require_segments()?;
                let rows = export_segments(set, &self.ctx.feature_columns(), &path)?;
                AnalysisResult::Export { path, rows }
            }
            Request::All => return self.handle_all(),
        };

        self.publisher.publish(result)?;
        Ok(())
    }

    fn handle_all(&mut self) -> Result<()> {
        for request in [
            Request::Segment,
            Request::DroppedPeaks,
            Request::Score,
            Request::CodeDistribution,
            Request::LengthDistributions,
            Request::SegmentPairs,
            Request::ShortSegmentChains,
            Request::BreakSegments,
            Request::Correlation,
        ] {
            self.handle(request)?;
        }
        Ok(())
    }
}

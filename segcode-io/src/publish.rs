use std::collections::HashSet;
use std::fmt::{self, Display};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use serde::Serialize;

use segcode_scoring::ScoringReport;
use segcode_segment::SegmentationSummary;
use segcode_stats::{
    BreakSegments, CodeDistribution, CorrelationMatrix, FateOfCode, LengthDistributions,
    SegmentPairs, ShortSegmentChains,
};

use crate::error::{PublishError, Result};

///
/// One computed result, ready to leave the engine. Serialized with a `kind`
/// field naming the variant.
///
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisResult {
    Segmentation(SegmentationSummary),
    FeatureScores(ScoringReport),
    CodeDistribution { distribution: CodeDistribution },
    LengthDistributions(LengthDistributions),
    SegmentPairs(SegmentPairs),
    ShortSegmentChains(ShortSegmentChains),
    BreakSegments(BreakSegments),
    Correlation(CorrelationMatrix),
    FateOfCode(FateOfCode),
    DroppedPeaks { count: usize },
    Export { path: PathBuf, rows: usize },
}

/// The kind of an [AnalysisResult], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Segmentation,
    FeatureScores,
    CodeDistribution,
    LengthDistributions,
    SegmentPairs,
    ShortSegmentChains,
    BreakSegments,
    Correlation,
    FateOfCode,
    DroppedPeaks,
    Export,
}

impl Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultKind::Segmentation => "segmentation",
            ResultKind::FeatureScores => "feature scores",
            ResultKind::CodeDistribution => "code distribution",
            ResultKind::LengthDistributions => "length distributions",
            ResultKind::SegmentPairs => "segment pairs",
            ResultKind::ShortSegmentChains => "short segment chains",
            ResultKind::BreakSegments => "break segments",
            ResultKind::Correlation => "correlation",
            ResultKind::FateOfCode => "fate of code",
            ResultKind::DroppedPeaks => "dropped peaks",
            ResultKind::Export => "export",
        };
        write!(f, "{}", s)
    }
}

impl AnalysisResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            AnalysisResult::Segmentation(_) => ResultKind::Segmentation,
            AnalysisResult::FeatureScores(_) => ResultKind::FeatureScores,
            AnalysisResult::CodeDistribution { .. } => ResultKind::CodeDistribution,
            AnalysisResult::LengthDistributions(_) => ResultKind::LengthDistributions,
            AnalysisResult::SegmentPairs(_) => ResultKind::SegmentPairs,
            AnalysisResult::ShortSegmentChains(_) => ResultKind::ShortSegmentChains,
            AnalysisResult::BreakSegments(_) => ResultKind::BreakSegments,
            AnalysisResult::Correlation(_) => ResultKind::Correlation,
            AnalysisResult::FateOfCode(_) => ResultKind::FateOfCode,
            AnalysisResult::DroppedPeaks { .. } => ResultKind::DroppedPeaks,
            AnalysisResult::Export { .. } => ResultKind::Export,
        }
    }
}

///
/// Receives published results. Sinks are shared with the publisher's
/// callers, so delivery goes through `&self`.
///
pub trait ResultSink: Send + Sync {
    fn deliver(&self, result: &AnalysisResult) -> Result<()>;
}

/// Writes each result as one line of JSON.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    fn deliver(&self, result: &AnalysisResult) -> Result<()> {
        let line = serde_json::to_string(result)?;
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Forwards results to a receiver, e.g. a transport thread.
pub struct ChannelSink {
    sender: Sender<AnalysisResult>,
}

impl ChannelSink {
    pub fn new(sender: Sender<AnalysisResult>) -> Self {
        ChannelSink { sender }
    }
}

impl ResultSink for ChannelSink {
    fn deliver(&self, result: &AnalysisResult) -> Result<()> {
        self.sender
            .send(result.clone())
            .map_err(|_| PublishError::Disconnected)
    }
}

/// Keeps every result in memory.
#[derive(Default, Clone)]
pub struct MemorySink {
    results: Arc<Mutex<Vec<AnalysisResult>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn kinds(&self) -> Vec<ResultKind> {
        self.results().iter().map(AnalysisResult::kind).collect()
    }
}

impl ResultSink for MemorySink {
    fn deliver(&self, result: &AnalysisResult) -> Result<()> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(result.clone());
        Ok(())
    }
}

///
/// Marks a kind of result as being computed. Dropping the guard, on success
/// or on error, frees the kind again.
///
#[derive(Debug)]
pub struct InFlight {
    kind: ResultKind,
    running: Arc<Mutex<HashSet<ResultKind>>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.kind);
    }
}

///
/// Hands each result to the sink as soon as it is ready. Results are
/// independent: there is no barrier between kinds.
///
/// Clones share the sink and the set of running kinds.
///
#[derive(Clone)]
pub struct ResultPublisher {
    sink: Arc<dyn ResultSink>,
    running: Arc<Mutex<HashSet<ResultKind>>>,
}

impl ResultPublisher {
    pub fn new<S: ResultSink + 'static>(sink: S) -> Self {
        ResultPublisher {
            sink: Arc::new(sink),
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    ///
    /// Claim `kind` for the duration of a computation. A second claim of the
    /// same kind while the first guard is alive is rejected.
    ///
    pub fn begin(&self, kind: ResultKind) -> Result<InFlight> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(kind) {
            log::warn!("Rejecting {} request: one is already running", kind);
            return Err(PublishError::AlreadyRunning(kind));
        }
        Ok(InFlight {
            kind,
            running: Arc::clone(&self.running),
        })
    }

    pub fn is_running(&self, kind: ResultKind) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&kind)
    }

    pub fn publish(&self, result: AnalysisResult) -> Result<()> {
        log::debug!("Publishing {}", result.kind());
        self.sink.deliver(&result)
    }
}

pub mod canon;
pub mod diversity;
pub mod explanation;
pub mod insights;
pub mod pipeline;
pub mod scoring;

pub use canon::CanonPartitioner;
pub use diversity::DiversityReranker;
pub use explanation::ExplanationGenerator;
pub use insights::{InsightBuilder, InsightMatcher};
pub use pipeline::{
    PipelinePhase, RankingError, RankingOptions, RankingOutcome, RankingPipeline,
    SnapshotProvider, StaticSnapshotProvider,
};
pub use scoring::{classify_model, FitScorer, SignalScorer};

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{ModelSegment, RankingConfig, WeightTable};
pub use models::{
    BlockReason, Candidate, HistoryEntry, Insight, InteractionKind, InteractionRecord,
    PreviewProfile, ProfileRecord, ProfileView, RankedResult, RankingSnapshot, RankingStats,
    ScoreFactors, ScoredCandidate, StatusEffect, StatusRecord, StoredProfile,
};
pub use services::{
    CanonPartitioner, DiversityReranker, ExplanationGenerator, FitScorer, InsightBuilder,
    InsightMatcher, RankingError, RankingOptions, RankingOutcome, RankingPipeline, SignalScorer,
    SnapshotProvider, StaticSnapshotProvider,
};

/// Ranking Pipeline
///
/// Sequences the scoring stages over one immutable snapshot:
/// load → score → rerank → partition → explain. Raises the
/// insufficient-signal control condition when personalized scoring cannot
/// produce a usable ranking; callers then run the fallback path, which uses
/// fit scoring against catalog-level curation only.
use crate::config::{RankingConfig, WeightTable};
use crate::models::{
    Candidate, ProfileView, RankedResult, RankingSnapshot, RankingStats, ScoreBreakdown,
    ScoredCandidate,
};
use crate::services::canon::CanonPartitioner;
use crate::services::diversity::DiversityReranker;
use crate::services::explanation::ExplanationGenerator;
use crate::services::insights::{InsightBuilder, InsightMatcher};
use crate::services::scoring::{classify_model, FitScorer, SignalScorer};
use crate::utils::round2;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RankingError {
    /// Control signal, not an application error: the caller is expected to
    /// run the fallback path.
    #[error("insufficient signal to produce a personalized ranking")]
    InsufficientSignal,

    #[error("snapshot load failed: {0}")]
    Snapshot(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RankingError>;

/// Phases of a ranking request, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Loaded,
    Scored,
    Reranked,
    Partitioned,
    Explained,
    Done,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Loaded => "loaded",
            PipelinePhase::Scored => "scored",
            PipelinePhase::Reranked => "reranked",
            PipelinePhase::Partitioned => "partitioned",
            PipelinePhase::Explained => "explained",
            PipelinePhase::Done => "done",
        }
    }
}

/// Batch-loads the immutable snapshot a ranking request operates on. The
/// store behind it is free to assemble the bundle however it likes; a missing
/// status store must degrade to an empty list, not an error.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn load(&self, user_id: Uuid) -> anyhow::Result<RankingSnapshot>;
}

/// In-memory provider for preview mode and tests.
pub struct StaticSnapshotProvider {
    snapshot: RankingSnapshot,
}

impl StaticSnapshotProvider {
    pub fn new(snapshot: RankingSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotProvider for StaticSnapshotProvider {
    async fn load(&self, _user_id: Uuid) -> anyhow::Result<RankingSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// Per-call options.
#[derive(Debug, Clone)]
pub struct RankingOptions {
    pub limit: usize,
    /// Attach the ScoreFactors/matched-insight breakdown to each result.
    pub debug: bool,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            limit: RankingConfig::default().default_limit,
            debug: false,
        }
    }
}

/// Results plus the per-request counters.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub results: Vec<RankedResult>,
    pub stats: RankingStats,
}

pub struct RankingPipeline {
    provider: Arc<dyn SnapshotProvider>,
    weights: WeightTable,
    config: RankingConfig,
}

impl RankingPipeline {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        weights: WeightTable,
        config: RankingConfig,
    ) -> Self {
        Self {
            provider,
            weights,
            config,
        }
    }

    pub fn with_defaults(provider: Arc<dyn SnapshotProvider>) -> Self {
        Self::new(provider, WeightTable::default(), RankingConfig::default())
    }

    /// Personalized ranking for a user. Raises `InsufficientSignal` when the
    /// snapshot cannot support one.
    pub async fn rank(&self, user_id: Uuid, options: &RankingOptions) -> Result<RankingOutcome> {
        let snapshot = self.provider.load(user_id).await?;
        self.rank_snapshot(&snapshot, options)
    }

    /// Personalized then fallback: the control signal is handled here so
    /// callers always get a list (possibly empty).
    pub async fn rank_or_fallback(
        &self,
        user_id: Uuid,
        options: &RankingOptions,
    ) -> Result<RankingOutcome> {
        let snapshot = self.provider.load(user_id).await?;
        match self.rank_snapshot(&snapshot, options) {
            Ok(outcome) => Ok(outcome),
            Err(RankingError::InsufficientSignal) => {
                info!(user_id = %user_id, "Falling back to non-personalized ranking");
                Ok(self.rank_fallback_snapshot(&snapshot, options))
            }
            Err(err) => Err(err),
        }
    }

    /// Fallback ranking for a user: fit scoring against catalog-level
    /// curation only, recency-ordered when no curation criteria apply.
    pub async fn rank_fallback(
        &self,
        user_id: Uuid,
        options: &RankingOptions,
    ) -> Result<RankingOutcome> {
        let snapshot = self.provider.load(user_id).await?;
        Ok(self.rank_fallback_snapshot(&snapshot, options))
    }

    /// The personalized pipeline over an already-loaded snapshot. Used
    /// directly for preview mode (`RankingSnapshot::preview`).
    pub fn rank_snapshot(
        &self,
        snapshot: &RankingSnapshot,
        options: &RankingOptions,
    ) -> Result<RankingOutcome> {
        let mut phase = PipelinePhase::Loaded;
        let profile = snapshot.profile.as_ref().map(|p| p as &dyn ProfileView);
        let mut stats = RankingStats {
            total_candidates: snapshot.candidates.len(),
            ..Default::default()
        };
        debug!(
            phase = phase.as_str(),
            candidates = stats.total_candidates,
            interactions = snapshot.interactions.len(),
            history_rows = snapshot.history.len(),
            "Snapshot loaded"
        );

        // Hard blocks come off the pool before any scorer runs.
        let signal = SignalScorer::new(&self.weights);
        let blocked = signal.resolve_blocks(&snapshot.interactions, &snapshot.statuses);
        let pool: Vec<&Candidate> = snapshot
            .candidates
            .iter()
            .filter(|c| !blocked.contains_key(&c.id))
            .collect();
        stats.blocked = stats.total_candidates - pool.len();

        if pool.is_empty() {
            warn!("Candidate pool empty after filtering");
            return Err(RankingError::InsufficientSignal);
        }

        let insights = InsightBuilder::new(&self.weights).build(profile);
        let signal_scores = signal.score(
            &pool,
            &snapshot.interactions,
            &snapshot.statuses,
            &snapshot.history,
        );
        let fit = FitScorer::new(&self.weights);

        let scored: Vec<ScoredCandidate> = pool
            .iter()
            .map(|candidate| {
                let fit_out = fit.score(profile, candidate);
                let (insight_boost, matched) =
                    InsightMatcher::match_candidate(&insights, candidate);
                let dominant = InsightMatcher::dominant(&matched);
                let behavioral = signal_scores.get(&candidate.id).copied().unwrap_or(0.0);

                ScoredCandidate {
                    candidate: (*candidate).clone(),
                    score: behavioral + fit_out.score + insight_boost,
                    factors: fit_out.factors,
                    matched_insights: matched,
                    dominant_insight: dominant,
                }
            })
            .collect();
        stats.scored = scored.len();
        phase = PipelinePhase::Scored;
        debug!(phase = phase.as_str(), scored = stats.scored, "Scoring complete");

        if !scored.iter().any(|s| s.score > 0.0) {
            warn!("No candidate scored above zero");
            return Err(RankingError::InsufficientSignal);
        }

        let reranker = DiversityReranker::new(self.config.diversity_penalty_step);
        let (reranked, penalized) = reranker.rerank(scored);
        stats.penalized = penalized;
        phase = PipelinePhase::Reranked;
        debug!(phase = phase.as_str(), penalized, "Diversity pass complete");

        let segment = profile
            .and_then(|p| p.business_model())
            .and_then(classify_model);
        stats.partition_applied = segment.is_some();
        let partitioner = CanonPartitioner::new(self.config.canon_niche_ratio);
        let selected = partitioner.select(reranked, segment, options.limit);
        phase = PipelinePhase::Partitioned;
        debug!(
            phase = phase.as_str(),
            selected = selected.len(),
            "Partition complete"
        );

        let results = self.explain_all(profile, selected, options);
        phase = PipelinePhase::Explained;
        stats.final_count = results.len();
        debug!(phase = phase.as_str(), "Explanations attached");

        phase = PipelinePhase::Done;
        info!(
            phase = phase.as_str(),
            final_count = stats.final_count,
            blocked = stats.blocked,
            top_score = results.first().map(|r| r.score),
            "Ranking complete"
        );
        Ok(RankingOutcome { results, stats })
    }

    /// The fallback pipeline over an already-loaded snapshot. Never fails:
    /// total absence of signal yields an empty list.
    pub fn rank_fallback_snapshot(
        &self,
        snapshot: &RankingSnapshot,
        options: &RankingOptions,
    ) -> RankingOutcome {
        let profile = snapshot.profile.as_ref().map(|p| p as &dyn ProfileView);
        let mut stats = RankingStats {
            total_candidates: snapshot.candidates.len(),
            ..Default::default()
        };

        // Hard blocks still apply; a blocked candidate never comes back.
        let signal = SignalScorer::new(&self.weights);
        let blocked = signal.resolve_blocks(&snapshot.interactions, &snapshot.statuses);
        let pool: Vec<&Candidate> = snapshot
            .candidates
            .iter()
            .filter(|c| !blocked.contains_key(&c.id))
            .collect();
        stats.blocked = stats.total_candidates - pool.len();

        let fit = FitScorer::new(&self.weights);
        let mut scored: Vec<ScoredCandidate> = pool
            .iter()
            .map(|candidate| {
                let fit_out = fit.score(profile, candidate);
                ScoredCandidate {
                    candidate: (*candidate).clone(),
                    score: fit_out.score,
                    factors: fit_out.factors,
                    matched_insights: Vec::new(),
                    dominant_insight: None,
                }
            })
            .collect();
        stats.scored = scored.len();

        let has_curation = scored.iter().any(|s| s.score > 0.0);
        let selected = if has_curation {
            let segment = profile
                .and_then(|p| p.business_model())
                .and_then(classify_model);
            stats.partition_applied = segment.is_some();
            let partitioner = CanonPartitioner::new(self.config.canon_niche_ratio);
            partitioner.select(scored, segment, options.limit)
        } else {
            // No curation criteria apply: newest catalog entries first.
            scored.sort_by(|a, b| b.candidate.added_at.cmp(&a.candidate.added_at));
            scored.truncate(options.limit);
            scored
        };

        let results = self.explain_all(profile, selected, options);
        stats.final_count = results.len();
        info!(
            final_count = stats.final_count,
            curated = has_curation,
            "Fallback ranking complete"
        );
        RankingOutcome { results, stats }
    }

    fn explain_all(
        &self,
        profile: Option<&dyn ProfileView>,
        selected: Vec<ScoredCandidate>,
        options: &RankingOptions,
    ) -> Vec<RankedResult> {
        let explainer = ExplanationGenerator::new(
            self.config.explanation_max_chars,
            self.config.max_signal_chips,
        );

        selected
            .into_iter()
            .map(|item| {
                let (explanation, signal_chips) = explainer.explain(profile, &item);
                let breakdown = options.debug.then(|| ScoreBreakdown {
                    factors: item.factors.clone(),
                    matched_insights: item.matched_insights.clone(),
                    dominant_insight: item.dominant_insight.clone(),
                });
                RankedResult {
                    candidate_id: item.candidate.id,
                    score: round2(item.score),
                    explanation,
                    signal_chips,
                    breakdown,
                }
            })
            .collect()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel theme tag marking service-business canon membership.
pub const SERVICE_CANON_TAG: &str = "services_canon";
/// Sentinel theme tag marking SaaS canon membership.
pub const SAAS_CANON_TAG: &str = "saas_canon";

/// Immutable catalog record. Owned by the catalog collaborator; read-only
/// within a ranking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// One-line pitch for what the book delivers.
    pub promise: String,
    pub frameworks: Vec<String>,
    pub anti_patterns: Vec<String>,
    pub outcomes: Vec<String>,
    pub categories: Vec<String>,
    pub stage_tags: Vec<String>,
    pub functional_tags: Vec<String>,
    pub theme_tags: Vec<String>,
    pub difficulty: Difficulty,
    pub page_count: u32,
    pub rating_avg: f32,
    pub rating_count: u32,
    /// When the record entered the catalog. Drives recency ordering in the
    /// fallback path.
    pub added_at: DateTime<Utc>,
}

impl Candidate {
    pub fn is_service_canon(&self) -> bool {
        self.theme_tags.iter().any(|t| t == SERVICE_CANON_TAG)
    }

    pub fn is_saas_canon(&self) -> bool {
        self.theme_tags.iter().any(|t| t == SAAS_CANON_TAG)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Introductory,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Introductory => "introductory",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// Read interface over the user's stated context. Scorers only ever see this
/// trait, so a persisted profile and an ad hoc preview profile rank
/// identically.
pub trait ProfileView: Send + Sync {
    fn business_stage(&self) -> Option<&str>;
    fn business_model(&self) -> Option<&str>;
    fn biggest_challenge(&self) -> Option<&str>;
    fn areas_of_focus(&self) -> &[String];
    fn revenue_range(&self) -> Option<&str>;
    fn vision(&self) -> Option<&str>;
}

/// Persisted profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub user_id: Uuid,
    pub business_stage: Option<String>,
    pub business_model: Option<String>,
    pub biggest_challenge: Option<String>,
    pub areas_of_focus: Vec<String>,
    pub revenue_range: Option<String>,
    pub vision: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileView for StoredProfile {
    fn business_stage(&self) -> Option<&str> {
        self.business_stage.as_deref()
    }

    fn business_model(&self) -> Option<&str> {
        self.business_model.as_deref()
    }

    fn biggest_challenge(&self) -> Option<&str> {
        self.biggest_challenge.as_deref()
    }

    fn areas_of_focus(&self) -> &[String] {
        &self.areas_of_focus
    }

    fn revenue_range(&self) -> Option<&str> {
        self.revenue_range.as_deref()
    }

    fn vision(&self) -> Option<&str> {
        self.vision.as_deref()
    }
}

/// Ad hoc profile for preview mode. Not tied to a stored user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewProfile {
    pub business_stage: Option<String>,
    pub business_model: Option<String>,
    pub biggest_challenge: Option<String>,
    pub areas_of_focus: Vec<String>,
    pub revenue_range: Option<String>,
    pub vision: Option<String>,
}

impl ProfileView for PreviewProfile {
    fn business_stage(&self) -> Option<&str> {
        self.business_stage.as_deref()
    }

    fn business_model(&self) -> Option<&str> {
        self.business_model.as_deref()
    }

    fn biggest_challenge(&self) -> Option<&str> {
        self.biggest_challenge.as_deref()
    }

    fn areas_of_focus(&self) -> &[String] {
        &self.areas_of_focus
    }

    fn revenue_range(&self) -> Option<&str> {
        self.revenue_range.as_deref()
    }

    fn vision(&self) -> Option<&str> {
        self.vision.as_deref()
    }
}

/// Either profile shape, as loaded into a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProfileRecord {
    Stored(StoredProfile),
    Preview(PreviewProfile),
}

impl ProfileView for ProfileRecord {
    fn business_stage(&self) -> Option<&str> {
        match self {
            ProfileRecord::Stored(p) => p.business_stage(),
            ProfileRecord::Preview(p) => p.business_stage(),
        }
    }

    fn business_model(&self) -> Option<&str> {
        match self {
            ProfileRecord::Stored(p) => p.business_model(),
            ProfileRecord::Preview(p) => p.business_model(),
        }
    }

    fn biggest_challenge(&self) -> Option<&str> {
        match self {
            ProfileRecord::Stored(p) => p.biggest_challenge(),
            ProfileRecord::Preview(p) => p.biggest_challenge(),
        }
    }

    fn areas_of_focus(&self) -> &[String] {
        match self {
            ProfileRecord::Stored(p) => p.areas_of_focus(),
            ProfileRecord::Preview(p) => p.areas_of_focus(),
        }
    }

    fn revenue_range(&self) -> Option<&str> {
        match self {
            ProfileRecord::Stored(p) => p.revenue_range(),
            ProfileRecord::Preview(p) => p.revenue_range(),
        }
    }

    fn vision(&self) -> Option<&str> {
        match self {
            ProfileRecord::Stored(p) => p.vision(),
            ProfileRecord::Preview(p) => p.vision(),
        }
    }
}

/// Direct (user, candidate) interaction. At most one per pair survives;
/// last write wins on `recorded_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: Uuid,
    pub candidate_id: Uuid,
    pub kind: InteractionKind,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    LikedAfterReading,
    DislikedAfterReading,
    Interested,
    NotInterested,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::LikedAfterReading => "liked-after-reading",
            InteractionKind::DislikedAfterReading => "disliked-after-reading",
            InteractionKind::Interested => "interested",
            InteractionKind::NotInterested => "not-interested",
        }
    }
}

/// Imported reading-history row. Matched to a candidate by case-insensitive
/// (title, author) equality; unmatched rows are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub author: String,
    pub shelf: String,
    pub rating: Option<u8>,
}

/// Latest lightweight status overlay for a (user, candidate) pair. A superset
/// of the interaction states, kept as UI bookkeeping by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub user_id: Uuid,
    pub candidate_id: Uuid,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Resolved effect of the overlays for one candidate. Computed once before
/// scoring begins; blocked candidates never reach a scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusEffect {
    Block(BlockReason),
    Nudge(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockReason {
    NotInterested,
    NotForMe,
    DislikedAfterReading,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::NotInterested => "not-interested",
            BlockReason::NotForMe => "not-for-me",
            BlockReason::DislikedAfterReading => "disliked-after-reading",
        }
    }
}

/// Derived, weighted preference tag. Built fresh per request from the
/// profile; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// `<namespace>:<normalized-value>`, e.g. `bottleneck:sales`.
    pub key: String,
    pub weight: f32,
    pub reason: String,
}

/// Per-candidate fit breakdown. Exists for transparency and explanation
/// generation only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub stage_fit: f32,
    pub challenge_fit: f32,
    pub business_model_fit: f32,
    pub areas_fit: f32,
    pub promise_match: f32,
    pub framework_match: f32,
    pub outcome_match: f32,
}

/// A candidate carrying its accumulated score through the pipeline stages.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f32,
    pub factors: ScoreFactors,
    pub matched_insights: Vec<Insight>,
    pub dominant_insight: Option<Insight>,
}

/// Final per-candidate output. The breakdown is attached only when the caller
/// sets the debug flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub candidate_id: Uuid,
    /// Rounded to 2 decimals.
    pub score: f32,
    pub explanation: String,
    pub signal_chips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub factors: ScoreFactors,
    pub matched_insights: Vec<Insight>,
    pub dominant_insight: Option<Insight>,
}

/// The immutable bundle a ranking request operates on. Loaded in one batch;
/// a missing status store degrades to an empty list upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub profile: Option<ProfileRecord>,
    pub interactions: Vec<InteractionRecord>,
    pub history: Vec<HistoryEntry>,
    pub statuses: Vec<StatusRecord>,
    pub candidates: Vec<Candidate>,
}

impl RankingSnapshot {
    /// Snapshot for preview mode: an ad hoc profile against a catalog, with
    /// no behavioral signal.
    pub fn preview(profile: PreviewProfile, candidates: Vec<Candidate>) -> Self {
        Self {
            profile: Some(ProfileRecord::Preview(profile)),
            interactions: Vec::new(),
            history: Vec::new(),
            statuses: Vec::new(),
            candidates,
        }
    }
}

/// Per-request counters surfaced next to the results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingStats {
    pub total_candidates: usize,
    pub blocked: usize,
    pub scored: usize,
    pub penalized: usize,
    pub partition_applied: bool,
    pub final_count: usize,
}

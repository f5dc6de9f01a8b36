use serde::{Deserialize, Serialize};
use std::env;

/// Every scoring weight in one immutable table, injected into the scorers.
/// Tests can vary weights by constructing their own table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTable {
    // Insight derivation
    pub insight_stage: f32,
    pub insight_model: f32,
    pub insight_focus_area: f32,
    pub insight_challenge: f32,

    // Direct interactions
    pub interaction_liked: f32,
    pub interaction_interested: f32,
    pub interaction_disliked: f32,

    // Status overlay nudges
    pub status_interested: f32,
    pub status_liked: f32,

    // Imported history
    pub history_read_loved: f32,
    pub history_read_neutral: f32,
    pub history_read_disliked: f32,
    pub history_read_unrated: f32,
    pub history_to_read: f32,

    // Fit alignment
    pub stage_match: f32,
    pub revenue_stage_bonus: f32,
    pub model_match: f32,
    pub canon_bonus: f32,
    pub areas_match: f32,
    pub challenge_match: f32,
    pub promise_match: f32,
    pub framework_match: f32,
    pub outcome_match: f32,

    /// Domain-adjacent theme tags and their bonuses for service-like users.
    pub service_adjacency: Vec<(String, f32)>,
    /// Domain-adjacent theme tags and their bonuses for SaaS-like users.
    pub saas_adjacency: Vec<(String, f32)>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            insight_stage: 1.2,
            insight_model: 1.0,
            insight_focus_area: 0.8,
            insight_challenge: 1.1,

            interaction_liked: 5.0,
            interaction_interested: 3.0,
            interaction_disliked: -4.0,

            status_interested: 1.0,
            status_liked: 1.5,

            history_read_loved: 4.0,
            history_read_neutral: 2.0,
            history_read_disliked: -3.0,
            history_read_unrated: 1.0,
            history_to_read: 2.0,

            stage_match: 3.0,
            revenue_stage_bonus: 0.35,
            model_match: 2.0,
            canon_bonus: 6.0,
            areas_match: 1.5,
            challenge_match: 1.5,
            promise_match: 1.2,
            framework_match: 0.6,
            outcome_match: 0.6,

            service_adjacency: vec![
                ("sales".to_string(), 1.5),
                ("client-acquisition".to_string(), 1.5),
                ("pricing".to_string(), 1.0),
                ("referrals".to_string(), 1.0),
            ],
            saas_adjacency: vec![
                ("growth".to_string(), 1.5),
                ("product".to_string(), 1.0),
                ("metrics".to_string(), 1.0),
                ("churn".to_string(), 1.0),
            ],
        }
    }
}

impl WeightTable {
    /// Defaults with the headline weights overridable from the environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut table = Self::default();
        table.stage_match = env_f32("WEIGHT_STAGE_MATCH", table.stage_match);
        table.canon_bonus = env_f32("WEIGHT_CANON_BONUS", table.canon_bonus);
        table.model_match = env_f32("WEIGHT_MODEL_MATCH", table.model_match);
        table
    }

    /// Adjacency table for a recognized business-model segment.
    pub fn adjacency(&self, segment: ModelSegment) -> &[(String, f32)] {
        match segment {
            ModelSegment::ServiceLike => &self.service_adjacency,
            ModelSegment::SaasLike => &self.saas_adjacency,
        }
    }
}

/// Recognized business-model segments that unlock the canon bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelSegment {
    ServiceLike,
    SaasLike,
}

impl ModelSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSegment::ServiceLike => "service-like",
            ModelSegment::SaasLike => "saas-like",
        }
    }
}

/// Pipeline-level knobs, separate from the scoring weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Default result count when the caller does not specify one.
    pub default_limit: usize,
    /// Share of the final list reserved for canon candidates.
    pub canon_niche_ratio: f32,
    /// Penalty step per repeated dominant insight key.
    pub diversity_penalty_step: f32,
    /// Character cap on explanation prose.
    pub explanation_max_chars: usize,
    /// Cap on signal chips per result.
    pub max_signal_chips: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            canon_niche_ratio: 0.7,
            diversity_penalty_step: 0.15,
            explanation_max_chars: 240,
            max_signal_chips: 3,
        }
    }
}

impl RankingConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            default_limit: env::var("RANKING_DEFAULT_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("RANKING_DEFAULT_LIMIT must be a valid usize"),
            canon_niche_ratio: env::var("RANKING_CANON_NICHE_RATIO")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()
                .expect("RANKING_CANON_NICHE_RATIO must be a valid f32"),
            diversity_penalty_step: env::var("RANKING_DIVERSITY_PENALTY_STEP")
                .unwrap_or_else(|_| "0.15".to_string())
                .parse()
                .expect("RANKING_DIVERSITY_PENALTY_STEP must be a valid f32"),
            explanation_max_chars: env::var("RANKING_EXPLANATION_MAX_CHARS")
                .unwrap_or_else(|_| "240".to_string())
                .parse()
                .expect("RANKING_EXPLANATION_MAX_CHARS must be a valid usize"),
            max_signal_chips: env::var("RANKING_MAX_SIGNAL_CHIPS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("RANKING_MAX_SIGNAL_CHIPS must be a valid usize"),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid f32", key)),
        Err(_) => default,
    }
}

use crate::config::{ModelSegment, WeightTable};
use crate::models::{Candidate, ProfileView, ScoreFactors};
use crate::utils::normalize_token;

/// Normalized business-model strings recognized as service-like.
const SERVICE_LIKE_MODELS: &[&str] = &[
    "service",
    "services",
    "agency",
    "consulting",
    "consultancy",
    "freelance",
    "freelancing",
    "done-for-you",
    "client-services",
];

/// Normalized business-model strings recognized as SaaS-like.
const SAAS_LIKE_MODELS: &[&str] = &[
    "saas",
    "micro-saas",
    "software",
    "subscription-software",
    "app",
    "platform",
];

/// Coarse revenue-range to implied-stage lookup.
const REVENUE_STAGE_MAP: &[(&str, &str)] = &[
    ("none", "idea"),
    ("pre-revenue", "idea"),
    ("under-1k", "early-revenue"),
    ("1k-10k", "early-revenue"),
    ("10k-50k", "growth"),
    ("50k-plus", "scale"),
    ("100k-plus", "scale"),
];

/// Classify a free-text business model into a recognized segment, if any.
pub fn classify_model(model: &str) -> Option<ModelSegment> {
    let normalized = normalize_token(model);
    if SERVICE_LIKE_MODELS.contains(&normalized.as_str()) {
        Some(ModelSegment::ServiceLike)
    } else if SAAS_LIKE_MODELS.contains(&normalized.as_str()) {
        Some(ModelSegment::SaasLike)
    } else {
        None
    }
}

fn revenue_implied_stage(revenue_range: &str) -> Option<&'static str> {
    let normalized = normalize_token(revenue_range);
    REVENUE_STAGE_MAP
        .iter()
        .find(|(range, _)| *range == normalized)
        .map(|(_, stage)| *stage)
}

/// One candidate's fit contribution.
#[derive(Debug, Clone, Default)]
pub struct FitOutcome {
    pub score: f32,
    pub factors: ScoreFactors,
}

/// Scores a candidate against the user's stated context. Every rule is
/// additive and independent; a candidate may collect all of them.
pub struct FitScorer<'a> {
    weights: &'a WeightTable,
}

impl<'a> FitScorer<'a> {
    pub fn new(weights: &'a WeightTable) -> Self {
        Self { weights }
    }

    pub fn score(&self, profile: Option<&dyn ProfileView>, candidate: &Candidate) -> FitOutcome {
        let Some(profile) = profile else {
            return FitOutcome::default();
        };

        let mut out = FitOutcome::default();
        let candidate_stages: Vec<String> = candidate
            .stage_tags
            .iter()
            .map(|t| normalize_token(t))
            .collect();
        let candidate_themes: Vec<String> = candidate
            .theme_tags
            .iter()
            .map(|t| normalize_token(t))
            .collect();

        self.score_stage(profile, &candidate_stages, &mut out);
        self.score_model(profile, candidate, &candidate_themes, &mut out);
        self.score_areas(profile, candidate, &mut out);
        self.score_challenge(profile, candidate, &mut out);
        self.score_insight_fields(profile, candidate, &mut out);

        out
    }

    fn score_stage(
        &self,
        profile: &dyn ProfileView,
        candidate_stages: &[String],
        out: &mut FitOutcome,
    ) {
        if let Some(stage) = non_empty(profile.business_stage()) {
            if candidate_stages.contains(&normalize_token(stage)) {
                out.factors.stage_fit += self.weights.stage_match;
                out.score += self.weights.stage_match;
            }
        }

        // Revenue-implied stage combines additively with the stated stage.
        if let Some(revenue) = non_empty(profile.revenue_range()) {
            if let Some(implied) = revenue_implied_stage(revenue) {
                if candidate_stages.iter().any(|s| s == implied) {
                    out.factors.stage_fit += self.weights.revenue_stage_bonus;
                    out.score += self.weights.revenue_stage_bonus;
                }
            }
        }
    }

    fn score_model(
        &self,
        profile: &dyn ProfileView,
        candidate: &Candidate,
        candidate_themes: &[String],
        out: &mut FitOutcome,
    ) {
        let Some(model) = non_empty(profile.business_model()) else {
            return;
        };

        let model_normalized = normalize_token(model);
        if candidate_themes.iter().any(|t| *t == model_normalized) {
            out.factors.business_model_fit += self.weights.model_match;
            out.score += self.weights.model_match;
        }

        let Some(segment) = classify_model(model) else {
            return;
        };

        let is_canon = match segment {
            ModelSegment::ServiceLike => candidate.is_service_canon(),
            ModelSegment::SaasLike => candidate.is_saas_canon(),
        };
        if is_canon {
            out.factors.business_model_fit += self.weights.canon_bonus;
            out.score += self.weights.canon_bonus;
        }

        for (tag, bonus) in self.weights.adjacency(segment) {
            if candidate_themes.iter().any(|t| t == tag) {
                out.factors.business_model_fit += bonus;
                out.score += bonus;
            }
        }
    }

    fn score_areas(&self, profile: &dyn ProfileView, candidate: &Candidate, out: &mut FitOutcome) {
        let functional: Vec<String> = candidate
            .functional_tags
            .iter()
            .map(|t| normalize_token(t))
            .collect();

        // Counted once no matter how many areas overlap.
        let any_match = profile
            .areas_of_focus()
            .iter()
            .filter(|a| !a.trim().is_empty())
            .any(|area| functional.contains(&normalize_token(area)));
        if any_match {
            out.factors.areas_fit += self.weights.areas_match;
            out.score += self.weights.areas_match;
        }
    }

    fn score_challenge(
        &self,
        profile: &dyn ProfileView,
        candidate: &Candidate,
        out: &mut FitOutcome,
    ) {
        let Some(challenge) = non_empty(profile.biggest_challenge()) else {
            return;
        };

        let needle = challenge.trim().to_lowercase();
        let matched = candidate
            .theme_tags
            .iter()
            .any(|t| t.to_lowercase().contains(&needle));
        if matched {
            out.factors.challenge_fit += self.weights.challenge_match;
            out.score += self.weights.challenge_match;
        }
    }

    /// Matches against the candidate's free-text insight fields, distinct
    /// from the tag bonuses above.
    fn score_insight_fields(
        &self,
        profile: &dyn ProfileView,
        candidate: &Candidate,
        out: &mut FitOutcome,
    ) {
        if let Some(challenge) = non_empty(profile.biggest_challenge()) {
            let needle = challenge.trim().to_lowercase();
            if candidate.promise.to_lowercase().contains(&needle) {
                out.factors.promise_match = 1.0;
                out.score += self.weights.promise_match;
            }
        }

        if let Some(model) = non_empty(profile.business_model()) {
            let needle = model.trim().to_lowercase();
            if candidate
                .frameworks
                .iter()
                .any(|f| f.to_lowercase().contains(&needle))
            {
                out.factors.framework_match = 1.0;
                out.score += self.weights.framework_match;
            }
        }

        if let Some(vision) = non_empty(profile.vision()) {
            let haystack = vision.to_lowercase();
            if candidate
                .outcomes
                .iter()
                .filter(|o| !o.trim().is_empty())
                .any(|o| haystack.contains(&o.trim().to_lowercase()))
            {
                out.factors.outcome_match = 1.0;
                out.score += self.weights.outcome_match;
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, PreviewProfile};
    use chrono::Utc;
    use uuid::Uuid;

    fn base_candidate() -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            author: "a".to_string(),
            promise: String::new(),
            frameworks: vec![],
            anti_patterns: vec![],
            outcomes: vec![],
            categories: vec![],
            stage_tags: vec![],
            functional_tags: vec![],
            theme_tags: vec![],
            difficulty: Difficulty::Intermediate,
            page_count: 220,
            rating_avg: 4.2,
            rating_count: 90,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_classify_model_membership_sets() {
        assert_eq!(classify_model("service"), Some(ModelSegment::ServiceLike));
        assert_eq!(classify_model("Agency"), Some(ModelSegment::ServiceLike));
        assert_eq!(classify_model("SaaS"), Some(ModelSegment::SaasLike));
        assert_eq!(classify_model("micro saas"), Some(ModelSegment::SaasLike));
        assert_eq!(classify_model("ecommerce"), None);
    }

    #[test]
    fn test_stage_match_with_revenue_bonus() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let profile = PreviewProfile {
            business_stage: Some("growth".to_string()),
            revenue_range: Some("10k-50k".to_string()),
            ..Default::default()
        };
        let mut candidate = base_candidate();
        candidate.stage_tags = vec!["growth".to_string()];

        let out = scorer.score(Some(&profile), &candidate);

        // Stated stage (+3.0) and revenue-implied stage (+0.35) combine.
        assert!((out.factors.stage_fit - 3.35).abs() < 1e-6);
        assert!((out.score - 3.35).abs() < 1e-6);
    }

    #[test]
    fn test_service_scenario_reaches_canon_dominated_score() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let profile = PreviewProfile {
            business_stage: Some("early-revenue".to_string()),
            business_model: Some("service".to_string()),
            biggest_challenge: Some("sales".to_string()),
            ..Default::default()
        };
        let mut candidate = base_candidate();
        candidate.stage_tags = vec!["early-revenue".to_string()];
        candidate.theme_tags = vec!["services_canon".to_string(), "sales".to_string()];

        let out = scorer.score(Some(&profile), &candidate);

        // stage 3.0 + canon 6.0 + sales adjacency 1.5, plus the challenge
        // tag match 1.5 on top.
        assert!(out.score >= 10.5, "score was {}", out.score);
        assert!((out.factors.business_model_fit - 7.5).abs() < 1e-6);
        assert!((out.factors.challenge_fit - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_model_theme_match_is_exact_membership() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let profile = PreviewProfile {
            business_model: Some("service".to_string()),
            ..Default::default()
        };
        let mut candidate = base_candidate();
        // "services_canon" is not an exact theme membership match for
        // "service"; only the canon bonus applies.
        candidate.theme_tags = vec!["services_canon".to_string()];

        let out = scorer.score(Some(&profile), &candidate);
        assert!((out.factors.business_model_fit - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_saas_adjacency_bonuses() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let profile = PreviewProfile {
            business_model: Some("saas".to_string()),
            ..Default::default()
        };
        let mut candidate = base_candidate();
        candidate.theme_tags = vec!["growth".to_string(), "metrics".to_string()];

        let out = scorer.score(Some(&profile), &candidate);
        // growth 1.5 + metrics 1.0
        assert!((out.score - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_areas_fit_counted_once() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let profile = PreviewProfile {
            areas_of_focus: vec!["marketing".to_string(), "ops".to_string()],
            ..Default::default()
        };
        let mut candidate = base_candidate();
        candidate.functional_tags = vec!["marketing".to_string(), "ops".to_string()];

        let out = scorer.score(Some(&profile), &candidate);
        assert!((out.factors.areas_fit - 1.5).abs() < 1e-6);
        assert!((out.score - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_insight_field_matches_are_weighted() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let profile = PreviewProfile {
            business_model: Some("consulting".to_string()),
            biggest_challenge: Some("churn".to_string()),
            vision: Some("Reach repeatable client acquisition by spring".to_string()),
            ..Default::default()
        };
        let mut candidate = base_candidate();
        candidate.promise = "Stop churn before it starts".to_string();
        candidate.frameworks = vec!["The consulting value ladder".to_string()];
        candidate.outcomes = vec!["repeatable client acquisition".to_string()];

        let out = scorer.score(Some(&profile), &candidate);

        assert_eq!(out.factors.promise_match, 1.0);
        assert_eq!(out.factors.framework_match, 1.0);
        assert_eq!(out.factors.outcome_match, 1.0);
        // 1.2 + 0.6 + 0.6
        assert!((out.score - 2.4).abs() < 1e-6);
    }

    #[test]
    fn test_no_profile_scores_zero() {
        let weights = WeightTable::default();
        let scorer = FitScorer::new(&weights);
        let candidate = base_candidate();

        let out = scorer.score(None, &candidate);
        assert_eq!(out.score, 0.0);
        assert_eq!(out.factors, ScoreFactors::default());
    }
}

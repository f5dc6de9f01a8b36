/// Insight Derivation Module
///
/// Turns a user profile into weighted preference tags ("insights") and
/// matches them against candidate tag sets. This is a soft-signal layer: it
/// never fails, and an empty insight list is a valid state (cold start).
use crate::config::WeightTable;
use crate::models::{Candidate, Insight, ProfileView};
use crate::utils::normalize_token;
use std::collections::HashSet;
use tracing::debug;

pub const NS_BUSINESS_STAGE: &str = "business_stage";
pub const NS_BUSINESS_MODEL: &str = "business_model";
pub const NS_FOCUS_AREA: &str = "focus_area";
pub const NS_BOTTLENECK: &str = "bottleneck";

/// Derives insights from a profile with fixed per-namespace weights.
pub struct InsightBuilder<'a> {
    weights: &'a WeightTable,
}

impl<'a> InsightBuilder<'a> {
    pub fn new(weights: &'a WeightTable) -> Self {
        Self { weights }
    }

    /// Build the insight list. Absence of a profile, or a profile with no
    /// usable fields, yields an empty list rather than an error.
    pub fn build(&self, profile: Option<&dyn ProfileView>) -> Vec<Insight> {
        let Some(profile) = profile else {
            return Vec::new();
        };

        let mut insights = Vec::new();

        if let Some(stage) = non_empty(profile.business_stage()) {
            insights.push(Insight {
                key: format!("{}:{}", NS_BUSINESS_STAGE, normalize_token(stage)),
                weight: self.weights.insight_stage,
                reason: format!("you're building at the {} stage", stage.trim()),
            });
        }

        if let Some(model) = non_empty(profile.business_model()) {
            insights.push(Insight {
                key: format!("{}:{}", NS_BUSINESS_MODEL, normalize_token(model)),
                weight: self.weights.insight_model,
                reason: format!("you run a {} business", model.trim()),
            });
        }

        for area in profile.areas_of_focus() {
            if area.trim().is_empty() {
                continue;
            }
            insights.push(Insight {
                key: format!("{}:{}", NS_FOCUS_AREA, normalize_token(area)),
                weight: self.weights.insight_focus_area,
                reason: format!("you're focused on {}", area.trim()),
            });
        }

        if let Some(challenge) = non_empty(profile.biggest_challenge()) {
            insights.push(Insight {
                key: format!("{}:{}", NS_BOTTLENECK, normalize_token(challenge)),
                weight: self.weights.insight_challenge,
                reason: format!("your biggest bottleneck is {}", challenge.trim()),
            });
        }

        debug!(insight_count = insights.len(), "Derived profile insights");
        insights
    }
}

/// Matches derived insights against a candidate's projected tag set.
pub struct InsightMatcher;

impl InsightMatcher {
    /// Project candidate tags into the insight namespace: stage tags become
    /// `business_stage:`, functional tags `focus_area:`, theme tags
    /// `bottleneck:`.
    pub fn project_tags(candidate: &Candidate) -> HashSet<String> {
        let mut projected = HashSet::new();
        for tag in &candidate.stage_tags {
            projected.insert(format!("{}:{}", NS_BUSINESS_STAGE, normalize_token(tag)));
        }
        for tag in &candidate.functional_tags {
            projected.insert(format!("{}:{}", NS_FOCUS_AREA, normalize_token(tag)));
        }
        for tag in &candidate.theme_tags {
            projected.insert(format!("{}:{}", NS_BOTTLENECK, normalize_token(tag)));
        }
        projected
    }

    /// Exact-match the user's insights against the candidate. Returns the
    /// summed weight contribution and the matched insights, in derivation
    /// order.
    pub fn match_candidate(insights: &[Insight], candidate: &Candidate) -> (f32, Vec<Insight>) {
        if insights.is_empty() {
            return (0.0, Vec::new());
        }

        let projected = Self::project_tags(candidate);
        let matched: Vec<Insight> = insights
            .iter()
            .filter(|insight| projected.contains(&insight.key))
            .cloned()
            .collect();
        let boost = matched.iter().map(|insight| insight.weight).sum();

        (boost, matched)
    }

    /// The highest-weight matched insight; ties keep derivation order.
    pub fn dominant(matched: &[Insight]) -> Option<Insight> {
        let mut best: Option<&Insight> = None;
        for insight in matched {
            if best.map_or(true, |b| insight.weight > b.weight) {
                best = Some(insight);
            }
        }
        best.cloned()
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

    fn full_profile() -> PreviewProfile {
        PreviewProfile {
            business_stage: Some("Early Revenue".to_string()),
            business_model: Some("service".to_string()),
            biggest_challenge: Some("sales".to_string()),
            areas_of_focus: vec!["marketing".to_string(), "hiring".to_string()],
            revenue_range: None,
            vision: None,
        }
    }

    fn candidate(stage: &[&str], functional: &[&str], themes: &[&str]) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            author: "a".to_string(),
            promise: String::new(),
            frameworks: vec![],
            anti_patterns: vec![],
            outcomes: vec![],
            categories: vec![],
            stage_tags: stage.iter().map(|s| s.to_string()).collect(),
            functional_tags: functional.iter().map(|s| s.to_string()).collect(),
            theme_tags: themes.iter().map(|s| s.to_string()).collect(),
            difficulty: Difficulty::Intermediate,
            page_count: 200,
            rating_avg: 4.0,
            rating_count: 10,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_applies_fixed_weights_and_normalization() {
        let weights = WeightTable::default();
        let builder = InsightBuilder::new(&weights);
        let profile = full_profile();

        let insights = builder.build(Some(&profile));

        assert_eq!(insights.len(), 5);
        assert_eq!(insights[0].key, "business_stage:early-revenue");
        assert_eq!(insights[0].weight, 1.2);
        assert_eq!(insights[1].key, "business_model:service");
        assert_eq!(insights[1].weight, 1.0);
        assert_eq!(insights[2].key, "focus_area:marketing");
        assert_eq!(insights[2].weight, 0.8);
        assert_eq!(insights[4].key, "bottleneck:sales");
        assert_eq!(insights[4].weight, 1.1);
    }

    #[test]
    fn test_build_without_profile_is_empty() {
        let weights = WeightTable::default();
        let builder = InsightBuilder::new(&weights);
        assert!(builder.build(None).is_empty());
    }

    #[test]
    fn test_build_skips_empty_fields() {
        let weights = WeightTable::default();
        let builder = InsightBuilder::new(&weights);
        let profile = PreviewProfile {
            business_stage: Some("  ".to_string()),
            areas_of_focus: vec![String::new(), "ops".to_string()],
            ..Default::default()
        };

        let insights = builder.build(Some(&profile));

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].key, "focus_area:ops");
    }

    #[test]
    fn test_build_is_deterministic() {
        let weights = WeightTable::default();
        let builder = InsightBuilder::new(&weights);
        let profile = full_profile();

        assert_eq!(builder.build(Some(&profile)), builder.build(Some(&profile)));
    }

    #[test]
    fn test_match_candidate_by_projected_namespace() {
        let weights = WeightTable::default();
        let insights = InsightBuilder::new(&weights).build(Some(&full_profile()));
        let candidate = candidate(&["early-revenue"], &["marketing"], &["sales"]);

        let (boost, matched) = InsightMatcher::match_candidate(&insights, &candidate);

        // stage (1.2) + focus area (0.8) + bottleneck (1.1)
        assert_eq!(matched.len(), 3);
        assert!((boost - 3.1).abs() < 1e-6);
    }

    #[test]
    fn test_business_model_namespace_has_no_projection() {
        let weights = WeightTable::default();
        let insights = InsightBuilder::new(&weights).build(Some(&full_profile()));
        // "service" appears as a theme tag, which projects to bottleneck:,
        // not business_model:.
        let candidate = candidate(&[], &[], &["service"]);

        let (_, matched) = InsightMatcher::match_candidate(&insights, &candidate);
        assert!(matched.iter().all(|i| !i.key.starts_with("business_model:")));
    }

    #[test]
    fn test_dominant_picks_highest_weight() {
        let matched = vec![
            Insight {
                key: "focus_area:marketing".to_string(),
                weight: 0.8,
                reason: "r".to_string(),
            },
            Insight {
                key: "business_stage:growth".to_string(),
                weight: 1.2,
                reason: "r".to_string(),
            },
        ];

        let dominant = InsightMatcher::dominant(&matched).unwrap();
        assert_eq!(dominant.key, "business_stage:growth");
    }
}

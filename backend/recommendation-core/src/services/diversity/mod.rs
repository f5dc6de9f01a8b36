use crate::models::ScoredCandidate;
use std::collections::HashMap;
use tracing::debug;

/// Penalizes repeated dominant insight keys so one theme cannot monopolize
/// the result list. The best-scoring representative of each theme is never
/// penalized.
pub struct DiversityReranker {
    penalty_step: f32,
}

impl DiversityReranker {
    pub fn new(penalty_step: f32) -> Self {
        Self { penalty_step }
    }

    /// Walk the candidates in descending score order, charging
    /// `penalty_step × occurrences_seen_so_far` for each repeat of a dominant
    /// insight key. Adjusted scores are floored at zero, then the list is
    /// stably re-sorted so ordering changes only when a penalty causes an
    /// inversion.
    pub fn rerank(&self, mut scored: Vec<ScoredCandidate>) -> (Vec<ScoredCandidate>, usize) {
        sort_desc(&mut scored);

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut penalized = 0usize;
        for item in scored.iter_mut() {
            let Some(dominant) = &item.dominant_insight else {
                continue;
            };
            let occurrences = seen.entry(dominant.key.clone()).or_insert(0);
            if *occurrences > 0 {
                let penalty = self.penalty_step * (*occurrences as f32);
                item.score = (item.score - penalty).max(0.0);
                penalized += 1;
            }
            *occurrences += 1;
        }

        sort_desc(&mut scored);

        debug!(penalized, "Applied diversity penalties");
        (scored, penalized)
    }
}

fn sort_desc(scored: &mut [ScoredCandidate]) {
    // Stable: equal scores keep their prior relative order.
    // NaN never occurs; weights are finite.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Difficulty, Insight, ScoreFactors};
    use chrono::Utc;
    use uuid::Uuid;

    fn scored(score: f32, dominant_key: Option<&str>) -> ScoredCandidate {
        let dominant = dominant_key.map(|key| Insight {
            key: key.to_string(),
            weight: 1.1,
            reason: "r".to_string(),
        });
        ScoredCandidate {
            candidate: Candidate {
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
                page_count: 100,
                rating_avg: 4.0,
                rating_count: 5,
                added_at: Utc::now(),
            },
            score,
            factors: ScoreFactors::default(),
            matched_insights: dominant.iter().cloned().collect(),
            dominant_insight: dominant,
        }
    }

    #[test]
    fn test_penalty_tiers_for_repeated_key() {
        let reranker = DiversityReranker::new(0.15);
        let items = vec![
            scored(10.0, Some("bottleneck:sales")),
            scored(9.0, Some("bottleneck:sales")),
            scored(8.0, Some("bottleneck:sales")),
        ];

        let (reranked, penalized) = reranker.rerank(items);

        assert_eq!(penalized, 2);
        assert!((reranked[0].score - 10.0).abs() < 1e-6);
        assert!((reranked[1].score - 8.85).abs() < 1e-6);
        assert!((reranked[2].score - 7.70).abs() < 1e-6);
    }

    #[test]
    fn test_distinct_keys_are_not_penalized() {
        let reranker = DiversityReranker::new(0.15);
        let items = vec![
            scored(10.0, Some("bottleneck:sales")),
            scored(9.0, Some("focus_area:marketing")),
            scored(8.0, None),
        ];

        let (reranked, penalized) = reranker.rerank(items);

        assert_eq!(penalized, 0);
        let scores: Vec<f32> = reranked.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![10.0, 9.0, 8.0]);
    }

    #[test]
    fn test_penalty_can_invert_rank() {
        let reranker = DiversityReranker::new(0.15);
        let items = vec![
            scored(10.0, Some("bottleneck:sales")),
            scored(9.05, Some("bottleneck:sales")),
            scored(9.0, Some("focus_area:marketing")),
        ];

        let (reranked, _) = reranker.rerank(items);

        // 9.05 - 0.15 = 8.90 drops below 9.0.
        assert_eq!(reranked[1].dominant_insight.as_ref().unwrap().key, "focus_area:marketing");
        assert!((reranked[2].score - 8.90).abs() < 1e-6);
    }

    #[test]
    fn test_adjusted_score_floors_at_zero() {
        let reranker = DiversityReranker::new(0.15);
        let items = vec![
            scored(0.2, Some("bottleneck:sales")),
            scored(0.1, Some("bottleneck:sales")),
        ];

        let (reranked, _) = reranker.rerank(items);
        assert!((reranked[1].score - 0.0).abs() < 1e-6);
    }
}

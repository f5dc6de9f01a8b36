use crate::config::ModelSegment;
use crate::models::ScoredCandidate;
use tracing::debug;

/// Interleaves niche-domain ("canon") and general candidates for users with
/// a recognized business-model segment. Users without one get a plain
/// top-N by score.
pub struct CanonPartitioner {
    niche_ratio: f32,
}

impl CanonPartitioner {
    pub fn new(niche_ratio: f32) -> Self {
        Self { niche_ratio }
    }

    pub fn select(
        &self,
        scored: Vec<ScoredCandidate>,
        segment: Option<ModelSegment>,
        limit: usize,
    ) -> Vec<ScoredCandidate> {
        let Some(segment) = segment else {
            let mut all = scored;
            sort_desc(&mut all);
            all.truncate(limit);
            return all;
        };

        let (mut niche, mut general): (Vec<ScoredCandidate>, Vec<ScoredCandidate>) =
            scored.into_iter().partition(|item| match segment {
                ModelSegment::ServiceLike => item.candidate.is_service_canon(),
                ModelSegment::SaasLike => item.candidate.is_saas_canon(),
            });
        sort_desc(&mut niche);
        sort_desc(&mut general);

        let niche_quota = (limit as f32 * self.niche_ratio).floor() as usize;
        let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(limit);

        let take_niche = niche_quota.min(niche.len());
        selected.extend(niche.drain(..take_niche));

        let take_general = (limit - selected.len()).min(general.len());
        selected.extend(general.drain(..take_general));

        // Either pool exhausted: backfill from whatever remains, best first.
        if selected.len() < limit {
            let mut rest: Vec<ScoredCandidate> = niche.into_iter().chain(general).collect();
            sort_desc(&mut rest);
            let take_rest = (limit - selected.len()).min(rest.len());
            selected.extend(rest.into_iter().take(take_rest));
        }

        debug!(
            segment = segment.as_str(),
            niche_quota,
            selected = selected.len(),
            "Applied canon partition"
        );
        selected
    }
}

fn sort_desc(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

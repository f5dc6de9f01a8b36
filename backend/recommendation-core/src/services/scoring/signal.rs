use crate::config::WeightTable;
use crate::models::{
    BlockReason, Candidate, HistoryEntry, InteractionKind, InteractionRecord, StatusEffect,
    StatusRecord,
};
use crate::utils::title_author_key;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Scores candidates from behavioral signal: direct interactions, the status
/// overlay, and imported history. Hard blocks are resolved separately so the
/// pool can be filtered before any scoring happens.
pub struct SignalScorer<'a> {
    weights: &'a WeightTable,
}

impl<'a> SignalScorer<'a> {
    pub fn new(weights: &'a WeightTable) -> Self {
        Self { weights }
    }

    /// Resolve the status overlay value for one candidate into its effect.
    /// Unrecognized values carry no effect.
    pub fn resolve_status(&self, status: &str) -> Option<StatusEffect> {
        match status.trim() {
            "not-for-me" => Some(StatusEffect::Block(BlockReason::NotForMe)),
            "disliked-after-reading" => {
                Some(StatusEffect::Block(BlockReason::DislikedAfterReading))
            }
            "interested" => Some(StatusEffect::Nudge(self.weights.status_interested)),
            "liked-after-reading" => Some(StatusEffect::Nudge(self.weights.status_liked)),
            _ => None,
        }
    }

    /// Compute the hard-block set across interactions and the status overlay.
    /// Runs before scoring; a blocked candidate is never scored.
    pub fn resolve_blocks(
        &self,
        interactions: &[InteractionRecord],
        statuses: &[StatusRecord],
    ) -> HashMap<Uuid, BlockReason> {
        let mut blocked = HashMap::new();

        for record in latest_interactions(interactions).values() {
            if record.kind == InteractionKind::NotInterested {
                blocked.insert(record.candidate_id, BlockReason::NotInterested);
            }
        }

        for record in latest_statuses(statuses).values() {
            if let Some(StatusEffect::Block(reason)) = self.resolve_status(&record.status) {
                blocked.entry(record.candidate_id).or_insert(reason);
            }
        }

        debug!(blocked_count = blocked.len(), "Resolved hard blocks");
        blocked
    }

    /// Accumulate behavioral scores for the (already filtered) candidate
    /// pool. Order-independent: every rule is additive.
    pub fn score(
        &self,
        pool: &[&Candidate],
        interactions: &[InteractionRecord],
        statuses: &[StatusRecord],
        history: &[HistoryEntry],
    ) -> HashMap<Uuid, f32> {
        let pool_ids: HashSet<Uuid> = pool.iter().map(|c| c.id).collect();
        let mut scores: HashMap<Uuid, f32> = HashMap::new();

        for record in latest_interactions(interactions).values() {
            if !pool_ids.contains(&record.candidate_id) {
                continue;
            }
            let weight = match record.kind {
                InteractionKind::LikedAfterReading => self.weights.interaction_liked,
                InteractionKind::Interested => self.weights.interaction_interested,
                InteractionKind::DislikedAfterReading => self.weights.interaction_disliked,
                // Blocked upstream; nothing to accumulate.
                InteractionKind::NotInterested => continue,
            };
            *scores.entry(record.candidate_id).or_insert(0.0) += weight;
        }

        for record in latest_statuses(statuses).values() {
            if !pool_ids.contains(&record.candidate_id) {
                continue;
            }
            if let Some(StatusEffect::Nudge(nudge)) = self.resolve_status(&record.status) {
                *scores.entry(record.candidate_id).or_insert(0.0) += nudge;
            }
        }

        let by_title_author: HashMap<(String, String), Uuid> = pool
            .iter()
            .map(|c| (title_author_key(&c.title, &c.author), c.id))
            .collect();

        let mut matched_rows = 0usize;
        for entry in history {
            let key = title_author_key(&entry.title, &entry.author);
            let Some(candidate_id) = by_title_author.get(&key) else {
                continue;
            };
            matched_rows += 1;
            *scores.entry(*candidate_id).or_insert(0.0) += self.history_weight(entry);
        }

        debug!(
            scored_count = scores.len(),
            history_matched = matched_rows,
            "Accumulated behavioral signal"
        );
        scores
    }

    /// Weight for one matched history row. A rating of 0 is treated the same
    /// as an absent rating (unrated import).
    fn history_weight(&self, entry: &HistoryEntry) -> f32 {
        match entry.shelf.trim().to_lowercase().as_str() {
            "read" => match entry.rating {
                Some(rating) if rating >= 4 => self.weights.history_read_loved,
                Some(3) => self.weights.history_read_neutral,
                Some(rating) if rating > 0 => self.weights.history_read_disliked,
                _ => self.weights.history_read_unrated,
            },
            "to-read" | "want-to-read" => self.weights.history_to_read,
            _ => 0.0,
        }
    }
}

/// Collapse interactions to at most one per candidate, last write wins.
fn latest_interactions(
    interactions: &[InteractionRecord],
) -> HashMap<Uuid, &InteractionRecord> {
    let mut latest: HashMap<Uuid, &InteractionRecord> = HashMap::new();
    for record in interactions {
        match latest.get(&record.candidate_id) {
            Some(existing) if existing.recorded_at >= record.recorded_at => {}
            _ => {
                latest.insert(record.candidate_id, record);
            }
        }
    }
    latest
}

/// Collapse status rows to the latest per candidate.
fn latest_statuses(statuses: &[StatusRecord]) -> HashMap<Uuid, &StatusRecord> {
    let mut latest: HashMap<Uuid, &StatusRecord> = HashMap::new();
    for record in statuses {
        match latest.get(&record.candidate_id) {
            Some(existing) if existing.updated_at >= record.updated_at => {}
            _ => {
                latest.insert(record.candidate_id, record);
            }
        }
    }
    latest
}

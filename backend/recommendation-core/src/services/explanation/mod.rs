use crate::models::{ProfileView, ScoredCandidate};
use crate::utils::normalize_token;

const GENERIC_FALLBACK: &str = "A well-regarded pick from our catalog.";
const ELLIPSIS: char = '…';

/// Builds the human-readable justification for each surviving candidate:
/// short prose plus up to a handful of signal chips.
pub struct ExplanationGenerator {
    max_chars: usize,
    max_chips: usize,
}

impl ExplanationGenerator {
    pub fn new(max_chars: usize, max_chips: usize) -> Self {
        Self {
            max_chars,
            max_chips,
        }
    }

    pub fn explain(
        &self,
        profile: Option<&dyn ProfileView>,
        item: &ScoredCandidate,
    ) -> (String, Vec<String>) {
        (self.prose(profile, item), self.chips(profile, item))
    }

    /// Prose in strict priority order: dominant insight, stated challenge,
    /// stage, bare promise, generic fallback. One to two sentences, capped at
    /// `max_chars` with word-boundary truncation.
    fn prose(&self, profile: Option<&dyn ProfileView>, item: &ScoredCandidate) -> String {
        let promise = item.candidate.promise.trim();

        let text = if let Some(dominant) = &item.dominant_insight {
            join_with_promise(format!("Picked because {}.", dominant.reason), promise)
        } else if let Some(challenge) = profile.and_then(|p| non_empty(p.biggest_challenge())) {
            join_with_promise(
                format!("Speaks directly to your challenge with {}.", challenge.trim()),
                promise,
            )
        } else if let Some(stage) = profile.and_then(|p| non_empty(p.business_stage())) {
            join_with_promise(
                format!("A strong fit for the {} stage.", stage.trim()),
                promise,
            )
        } else if !promise.is_empty() {
            promise.to_string()
        } else {
            GENERIC_FALLBACK.to_string()
        };

        truncate_at_word(&text, self.max_chars)
    }

    /// Chips in fixed priority order: canon membership, stage match,
    /// functional-area overlap, challenge topic. Never duplicated, never more
    /// than `max_chips`.
    fn chips(&self, profile: Option<&dyn ProfileView>, item: &ScoredCandidate) -> Vec<String> {
        let mut chips: Vec<String> = Vec::new();
        let candidate = &item.candidate;

        if candidate.is_service_canon() {
            push_unique(&mut chips, "Service business canon".to_string());
        } else if candidate.is_saas_canon() {
            push_unique(&mut chips, "SaaS canon".to_string());
        }

        if let Some(stage) = profile.and_then(|p| non_empty(p.business_stage())) {
            let normalized = normalize_token(stage);
            if candidate
                .stage_tags
                .iter()
                .any(|t| normalize_token(t) == normalized)
            {
                push_unique(&mut chips, format!("Fits {}", stage.trim()));
            }
        }

        if let Some(profile) = profile {
            let overlap: Vec<&str> = profile
                .areas_of_focus()
                .iter()
                .filter(|area| {
                    let normalized = normalize_token(area);
                    !normalized.is_empty()
                        && candidate
                            .functional_tags
                            .iter()
                            .any(|t| normalize_token(t) == normalized)
                })
                .map(|area| area.trim())
                .take(2)
                .collect();
            if !overlap.is_empty() {
                push_unique(&mut chips, overlap.join(" + "));
            }
        }

        if let Some(challenge) = profile.and_then(|p| non_empty(p.biggest_challenge())) {
            let needle = challenge.trim().to_lowercase();
            if candidate
                .theme_tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle))
            {
                push_unique(&mut chips, format!("Covers {}", challenge.trim()));
            }
        }

        chips.truncate(self.max_chips);
        chips
    }
}

fn join_with_promise(lead: String, promise: &str) -> String {
    if promise.is_empty() {
        lead
    } else {
        format!("{} {}", lead, promise)
    }
}

fn push_unique(chips: &mut Vec<String>, chip: String) {
    if !chips.contains(&chip) {
        chips.push(chip);
    }
}

/// Cut text to `max_chars` characters, never mid-word, ending with an
/// ellipsis when anything was dropped.
fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(1);
    let mut kept: String = text.chars().take(keep).collect();
    if let Some(cut) = kept.rfind(char::is_whitespace) {
        kept.truncate(cut);
    }
    let trimmed = kept.trim_end_matches(|c: char| c.is_whitespace() || c == ',' || c == ';');
    let mut out = trimmed.to_string();
    out.push(ELLIPSIS);
    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

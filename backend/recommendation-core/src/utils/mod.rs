// Utility functions for recommendation-core

/// Normalize a free-text token: lower-case, trim, runs of spaces and
/// underscores collapsed to a single hyphen.
pub fn normalize_token(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    let mut out = String::with_capacity(trimmed.len());
    let mut pending_separator = false;

    for ch in trimmed.chars() {
        if ch == ' ' || ch == '_' || ch == '-' {
            pending_separator = !out.is_empty();
        } else {
            if pending_separator {
                out.push('-');
                pending_separator = false;
            }
            out.push(ch);
        }
    }

    out
}

/// Case-insensitive (title, author) key for matching imported history rows to
/// catalog records.
pub fn title_author_key(title: &str, author: &str) -> (String, String) {
    (
        title.trim().to_lowercase(),
        author.trim().to_lowercase(),
    )
}

/// Round a score to 2 decimals for the final output.
pub fn round2(score: f32) -> f32 {
    (score * 100.0).round() / 100.0
}

use std::collections::HashSet;

/// Scores how alike two pieces of catalog text are, in `[0.0, 1.0]`.
///
/// Both inputs are normalized first (lowercased, punctuation stripped,
/// whitespace collapsed). Equal strings score 1.0, a substring containment
/// scores 0.8, anything else falls back to Jaccard overlap of the word sets.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = normalize(a);
    let right = normalize(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }
    if left.contains(&right) || right.contains(&left) {
        return 0.8;
    }

    let left_tokens: HashSet<&str> = left.split_whitespace().collect();
    let right_tokens: HashSet<&str> = right.split_whitespace().collect();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }

    let overlap = left_tokens.intersection(&right_tokens).count();
    let union = left_tokens.union(&right_tokens).count();
    overlap as f64 / union as f64
}

fn normalize(value: &str) -> String {
    let stripped: String = value
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#![forbid(unsafe_code)]

//! Fuzzy-match arithmetic and the fulltext term policy used by the indexer
//! and the query engine.

/// Maximum edit distance allowed for a fuzzy match, scaled to the length of
/// the query string. Very short strings must match exactly.
pub fn max_edit_distance(query: &str) -> usize {
    match query.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Bounded Levenshtein check: true when `a` and `b` are within `max` edits.
/// Rows whose minimum exceeds `max` abort early, so index scans stay cheap
/// for non-matches.
pub fn within_distance(a: &str, b: &str, max: usize) -> bool {
    if a == b {
        return true;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return false;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        let mut row_min = cur[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
            row_min = row_min.min(cur[j + 1]);
        }
        if row_min > max {
            return false;
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()] <= max
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn fold_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a search string for the fuzzy path: lowercased, whitespace
/// folded.
pub fn normalize_query(value: &str) -> String {
    fold_whitespace(&value.to_lowercase())
}

/// The entries a single stored value contributes to a fulltext index: one per
/// lowercased whitespace-split token, plus the full lowercased value with
/// whitespace folded. Duplicates are dropped; single-token values contribute
/// one entry.
pub fn fulltext_terms(value: &str) -> Vec<String> {
    let lowered = value.to_lowercase();
    let mut terms: Vec<String> = Vec::new();
    for token in lowered.split_whitespace() {
        if !terms.iter().any(|t| t == token) {
            terms.push(token.to_string());
        }
    }
    let phrase = fold_whitespace(&lowered);
    if !phrase.is_empty() && !terms.iter().any(|t| *t == phrase) {
        terms.push(phrase);
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_scales_with_query_length() {
        assert_eq!(max_edit_distance("ab"), 0);
        assert_eq!(max_edit_distance("canis"), 1);
        assert_eq!(max_edit_distance("sapiens"), 2);
    }

    #[test]
    fn bounded_distance() {
        assert!(within_distance("sapiens", "sapiens", 0));
        assert!(within_distance("sapiens", "sapien", 1));
        assert!(within_distance("sapiens", "sapeins", 2));
        assert!(!within_distance("sapiens", "sapins", 1));
        assert!(!within_distance("felis", "canis", 2));
    }

    #[test]
    fn fulltext_terms_tokenize_and_keep_the_phrase() {
        assert_eq!(
            fulltext_terms("Homo  sapiens"),
            vec![
                "homo".to_string(),
                "sapiens".to_string(),
                "homo sapiens".to_string()
            ]
        );
        assert_eq!(fulltext_terms("Carex"), vec!["carex".to_string()]);
        assert!(fulltext_terms("   ").is_empty());
    }

    #[test]
    fn query_normalization_matches_term_policy() {
        assert_eq!(normalize_query("  Homo   Sapiens "), "homo sapiens");
    }
}

//! Recommendation lexicon: categorical terms to numeric scores

/// Score for go-equivalent terms
pub const GO_SCORE: f64 = 90.0;
/// Score for pivot / caution terms
pub const PIVOT_SCORE: f64 = 60.0;
/// Score for hold / no-go terms
pub const HOLD_SCORE: f64 = 10.0;

const GO_TERMS: &[&str] = &["go", "proceed", "accelerate", "accelerates", "build"];

const PIVOT_TERMS: &[&str] = &[
    "pivot",
    "proceed_with_caution",
    "go_with_changes",
    "build_with_constraints",
    "buy",
    "neutral",
];

const HOLD_TERMS: &[&str] = &[
    "hold",
    "no_go",
    "no_build",
    "dont_build",
    "don't_build",
    "decelerate",
    "decelerates",
];

/// Lowercase a term and fold spaces and hyphens into underscores.
pub fn normalize_term(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Map a recommendation term to its score; unknown terms have none.
pub fn recommendation_score(term: &str) -> Option<f64> {
    let normalized = normalize_term(term);
    let term = normalized.as_str();
    if GO_TERMS.contains(&term) {
        Some(GO_SCORE)
    } else if PIVOT_TERMS.contains(&term) {
        Some(PIVOT_SCORE)
    } else if HOLD_TERMS.contains(&term) {
        Some(HOLD_SCORE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_vocabularies_are_covered() {
        for term in ["proceed", "proceed_with_caution", "hold", "pivot"] {
            assert!(recommendation_score(term).is_some(), "cfo term {term}");
        }
        for term in ["go", "go_with_changes", "hold", "no_go"] {
            assert!(recommendation_score(term).is_some(), "cpo term {term}");
        }
        for term in ["build", "build_with_constraints", "buy", "no_build"] {
            assert!(recommendation_score(term).is_some(), "cto term {term}");
        }
        for term in ["accelerates", "neutral", "decelerates"] {
            assert!(recommendation_score(term).is_some(), "cro term {term}");
        }
    }

    #[test]
    fn test_normalization() {
        assert_eq!(recommendation_score("GO"), Some(GO_SCORE));
        assert_eq!(recommendation_score("Proceed with caution"), Some(PIVOT_SCORE));
        assert_eq!(recommendation_score("go-with-changes"), Some(PIVOT_SCORE));
        assert_eq!(recommendation_score(" No Go "), Some(HOLD_SCORE));
        assert_eq!(recommendation_score("Don't build"), Some(HOLD_SCORE));
    }

    #[test]
    fn test_unknown_terms() {
        assert_eq!(recommendation_score(""), None);
        assert_eq!(recommendation_score("maybe"), None);
        assert_eq!(recommendation_score("accelerates revenue"), None);
    }
}

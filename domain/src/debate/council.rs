//! Council peer review and rating matrix
//!
//! After the first round every provider reviews every *other* provider's
//! answer and scores it 1-10. [`RatingMatrix::aggregate`] folds those reviews
//! into per-target averages and picks the chairman.

use crate::core::provider::Provider;
use crate::util::{extract_json_object, value_as_string_list};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variance at which council alignment bottoms out
pub const MAX_SCORE_VARIANCE: f64 = 20.0;

/// One provider's review of another provider's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerReview {
    pub reviewer: Provider,
    pub target: Provider,
    /// Score in 1-10
    pub score: f64,
    #[serde(default)]
    pub critique: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl PeerReview {
    pub fn new(reviewer: Provider, target: Provider, score: f64) -> Self {
        Self {
            reviewer,
            target,
            score: score.clamp(1.0, 10.0),
            critique: String::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
        }
    }

    pub fn with_critique(mut self, critique: impl Into<String>) -> Self {
        self.critique = critique.into();
        self
    }
}

fn score_from_value(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        // "8" or "8/10"
        Value::String(s) => s.split('/').next()?.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    raw.is_finite().then(|| raw.clamp(1.0, 10.0))
}

/// Parse a reviewer's answer. Returns `None` when no score can be read, in
/// which case the review contributes nothing to the matrix.
pub fn parse_peer_review(reviewer: &Provider, target: &Provider, raw: &str) -> Option<PeerReview> {
    let map = extract_json_object(raw)?;
    let score = map.get("score").and_then(score_from_value)?;

    let critique = map
        .get("critique")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let list = |key: &str| map.get(key).map(value_as_string_list).unwrap_or_default();

    Some(PeerReview {
        reviewer: reviewer.clone(),
        target: target.clone(),
        score,
        critique,
        strengths: list("strengths"),
        weaknesses: list("weaknesses"),
    })
}

/// Average score one provider received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetScore {
    pub provider: Provider,
    pub average: f64,
    pub review_count: usize,
}

/// Aggregated peer ratings (reviewer x target)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingMatrix {
    /// Every successful review, in completion order
    pub reviews: Vec<PeerReview>,
    /// Per-target averages, in identity order
    pub aggregated_scores: Vec<TargetScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_rated: Option<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_rated: Option<Provider>,
    /// Population variance of every received score
    pub score_variance: f64,
    /// `clamp(1 - variance / 20, 0, 1)`; 0 when nothing was reviewed
    pub alignment: f64,
}

impl RatingMatrix {
    /// Aggregate reviews. `order` is the first-seen identity order used to
    /// break ties; targets outside it follow in review order.
    pub fn aggregate(order: &[Provider], reviews: Vec<PeerReview>) -> Self {
        let mut targets: Vec<Provider> = order
            .iter()
            .filter(|p| reviews.iter().any(|r| &r.target == *p))
            .cloned()
            .collect();
        for review in &reviews {
            if !targets.contains(&review.target) {
                targets.push(review.target.clone());
            }
        }

        let aggregated_scores: Vec<TargetScore> = targets
            .into_iter()
            .map(|provider| {
                let received: Vec<f64> = reviews
                    .iter()
                    .filter(|r| r.target == provider)
                    .map(|r| r.score)
                    .collect();
                TargetScore {
                    average: received.iter().sum::<f64>() / received.len() as f64,
                    review_count: received.len(),
                    provider,
                }
            })
            .collect();

        // strict comparisons keep the first-seen target on ties
        let mut highest: Option<&TargetScore> = None;
        let mut lowest: Option<&TargetScore> = None;
        for entry in &aggregated_scores {
            if highest.is_none_or(|h| entry.average > h.average) {
                highest = Some(entry);
            }
            if lowest.is_none_or(|l| entry.average < l.average) {
                lowest = Some(entry);
            }
        }
        let highest_rated = highest.map(|t| t.provider.clone());
        let lowest_rated = lowest.map(|t| t.provider.clone());

        let (score_variance, alignment) = if reviews.is_empty() {
            (0.0, 0.0)
        } else {
            let n = reviews.len() as f64;
            let mean = reviews.iter().map(|r| r.score).sum::<f64>() / n;
            let variance = reviews.iter().map(|r| (r.score - mean).powi(2)).sum::<f64>() / n;
            (variance, (1.0 - variance / MAX_SCORE_VARIANCE).clamp(0.0, 1.0))
        };

        Self {
            reviews,
            aggregated_scores,
            highest_rated,
            lowest_rated,
            score_variance,
            alignment,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Average score received by `provider`
    pub fn score_for(&self, provider: &Provider) -> Option<f64> {
        self.aggregated_scores
            .iter()
            .find(|t| &t.provider == provider)
            .map(|t| t.average)
    }

    /// Score `reviewer` gave `target`
    pub fn score(&self, reviewer: &Provider, target: &Provider) -> Option<f64> {
        self.reviews
            .iter()
            .find(|r| &r.reviewer == reviewer && &r.target == target)
            .map(|r| r.score)
    }
}

/// Pick the provider that writes the council's final synthesis: the configured
/// one when enabled, else the highest-rated provider, else the first.
///
/// This only chooses the backend. The lead perspective in the synthesis is
/// always the highest-rated answer.
pub fn select_synthesizer(
    enabled: &[Provider],
    configured: Option<&Provider>,
    matrix: &RatingMatrix,
) -> Option<Provider> {
    configured
        .filter(|p| enabled.contains(p))
        .or(matrix.highest_rated.as_ref())
        .or(enabled.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(reviewer: Provider, target: Provider, score: f64) -> PeerReview {
        PeerReview::new(reviewer, target, score)
    }

    #[test]
    fn test_parse_peer_review() {
        let raw = r#"```json
{"score": 8, "critique": "Solid numbers.", "strengths": ["clear ROI"], "weaknesses": ["ignores churn"]}
```"#;
        let parsed = parse_peer_review(&Provider::Anthropic, &Provider::Google, raw).unwrap();
        assert_eq!(parsed.score, 8.0);
        assert_eq!(parsed.critique, "Solid numbers.");
        assert_eq!(parsed.strengths, vec!["clear ROI".to_string()]);
        assert_eq!(parsed.weaknesses, vec!["ignores churn".to_string()]);
    }

    #[test]
    fn test_parse_peer_review_tolerates_string_scores() {
        let parsed =
            parse_peer_review(&Provider::Azure, &Provider::Google, r#"{"score": "7/10"}"#).unwrap();
        assert_eq!(parsed.score, 7.0);
        let parsed =
            parse_peer_review(&Provider::Azure, &Provider::Google, r#"{"score": 14}"#).unwrap();
        assert_eq!(parsed.score, 10.0);
    }

    #[test]
    fn test_unparseable_review_has_no_score() {
        assert!(parse_peer_review(&Provider::Azure, &Provider::Google, "Great answer!").is_none());
        assert!(
            parse_peer_review(&Provider::Azure, &Provider::Google, r#"{"critique": "ok"}"#)
                .is_none()
        );
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let a = Provider::Azure;
        let b = Provider::Anthropic;
        let c = Provider::Google;
        // A: 8.5, B: 8.5, C: 7.0
        let reviews = vec![
            review(c.clone(), b.clone(), 8.0),
            review(a.clone(), b.clone(), 9.0),
            review(b.clone(), a.clone(), 9.0),
            review(c.clone(), a.clone(), 8.0),
            review(a.clone(), c.clone(), 7.0),
            review(b.clone(), c.clone(), 7.0),
        ];
        let order = vec![a.clone(), b.clone(), c.clone()];
        let matrix = RatingMatrix::aggregate(&order, reviews);

        assert_eq!(matrix.score_for(&a), Some(8.5));
        assert_eq!(matrix.score_for(&b), Some(8.5));
        assert_eq!(matrix.score_for(&c), Some(7.0));
        assert_eq!(matrix.highest_rated, Some(a.clone()));
        assert_eq!(matrix.lowest_rated, Some(c.clone()));
        assert_eq!(matrix.score(&c, &a), Some(8.0));
        assert_eq!(matrix.score(&a, &a), None);

        let providers: Vec<&Provider> = matrix.aggregated_scores.iter().map(|t| &t.provider).collect();
        assert_eq!(providers, vec![&a, &b, &c]);
    }

    #[test]
    fn test_variance_and_alignment() {
        let reviews = vec![
            review(Provider::Azure, Provider::Google, 6.0),
            review(Provider::Google, Provider::Azure, 10.0),
        ];
        let matrix = RatingMatrix::aggregate(&[Provider::Azure, Provider::Google], reviews);
        assert_eq!(matrix.score_variance, 4.0);
        assert!((matrix.alignment - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_matrix_has_no_chairman() {
        let matrix = RatingMatrix::aggregate(&[Provider::Azure, Provider::Google], Vec::new());
        assert!(matrix.is_empty());
        assert!(matrix.aggregated_scores.is_empty());
        assert_eq!(matrix.highest_rated, None);
        assert_eq!(matrix.alignment, 0.0);
    }

    #[test]
    fn test_select_synthesizer() {
        let enabled = vec![Provider::Azure, Provider::Google];
        let reviews = vec![review(Provider::Azure, Provider::Google, 9.0)];
        let matrix = RatingMatrix::aggregate(&enabled, reviews);

        // configured chairman not enabled: fall back to the highest rated
        assert_eq!(
            select_synthesizer(&enabled, Some(&Provider::Anthropic), &matrix),
            Some(Provider::Google)
        );
        assert_eq!(
            select_synthesizer(&enabled, Some(&Provider::Azure), &matrix),
            Some(Provider::Azure)
        );

        let empty = RatingMatrix::aggregate(&enabled, Vec::new());
        assert_eq!(select_synthesizer(&enabled, None, &empty), Some(Provider::Azure));
        assert_eq!(select_synthesizer(&[], None, &empty), None);
    }
}

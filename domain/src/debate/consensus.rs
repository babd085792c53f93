//! Consensus evaluation over the four executive recommendations
//!
//! Each executive's categorical recommendation is mapped through the
//! [lexicon](super::lexicon) to a score. The spread of those scores (sample
//! standard deviation σ) becomes the agreement level:
//!
//! ```text
//! agreement = clamp(1 - σ / 80, 0, 1)
//! ```
//!
//! Fewer than two recognized scores yields an agreement of 0.

use super::lexicon::recommendation_score;
use super::task::Task;
use crate::executive::Role;
use serde::{Deserialize, Serialize};

/// Divisor normalizing σ into the agreement range
pub const AGREEMENT_SPREAD: f64 = 80.0;
/// Default agreement level above which the team goes straight to synthesis
pub const DEFAULT_SYNTHESIS_THRESHOLD: f64 = 0.6;
/// Distance from the mean beyond which a role counts as an outlier
pub const OUTLIER_DISTANCE: f64 = 30.0;

/// Suggested follow-up after evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Synthesize,
    /// Agreement is low; a refinement round would be warranted
    Refine,
}

/// One executive's contribution to the metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleScore {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Lexicon score; `None` when the term was missing or unrecognized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of [`ConsensusEvaluator::evaluate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusAnalysis {
    /// Agreement level in [0, 1]
    pub agreement_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_deviation: Option<f64>,
    pub next_action: NextAction,
    /// Per-role detail, in the order tasks were given
    pub scores: Vec<RoleScore>,
    /// Roles whose score sits more than 30 points from the mean
    pub outliers: Vec<Role>,
    /// Roles without a usable score
    pub excluded: Vec<Role>,
}

impl ConsensusAnalysis {
    /// Scores that took part in the metric
    pub fn included_scores(&self) -> Vec<f64> {
        self.scores.iter().filter_map(|s| s.score).collect()
    }

    pub fn should_synthesize(&self) -> bool {
        self.next_action == NextAction::Synthesize
    }
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Map a score spread to an agreement level in [0, 1].
pub fn agreement_from_std_dev(std_dev: f64) -> f64 {
    (1.0 - std_dev / AGREEMENT_SPREAD).clamp(0.0, 1.0)
}

/// Computes the agreement metric for the consensus method
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusEvaluator {
    synthesis_threshold: f64,
}

impl Default for ConsensusEvaluator {
    fn default() -> Self {
        Self {
            synthesis_threshold: DEFAULT_SYNTHESIS_THRESHOLD,
        }
    }
}

impl ConsensusEvaluator {
    pub fn new(synthesis_threshold: f64) -> Self {
        Self {
            synthesis_threshold: synthesis_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn synthesis_threshold(&self) -> f64 {
        self.synthesis_threshold
    }

    /// Evaluate terminal role tasks. Non-role, failed and unparsed tasks
    /// contribute no score.
    pub fn evaluate(&self, tasks: &[Task]) -> ConsensusAnalysis {
        let scores: Vec<RoleScore> = tasks
            .iter()
            .filter_map(|task| {
                let role = task.identity.role()?;
                let recommendation = task.recommendation().map(str::to_string);
                let score = recommendation.as_deref().and_then(recommendation_score);
                Some(RoleScore {
                    role,
                    recommendation,
                    score,
                    confidence: task.confidence(),
                })
            })
            .collect();

        let included: Vec<f64> = scores.iter().filter_map(|s| s.score).collect();
        let standard_deviation = sample_std_dev(&included);
        let agreement_level = standard_deviation.map(agreement_from_std_dev).unwrap_or(0.0);
        let mean_score =
            (!included.is_empty()).then(|| included.iter().sum::<f64>() / included.len() as f64);

        let outliers = match (mean_score, standard_deviation) {
            (Some(mean), Some(_)) => scores
                .iter()
                .filter(|s| s.score.is_some_and(|v| (v - mean).abs() > OUTLIER_DISTANCE))
                .map(|s| s.role)
                .collect(),
            _ => Vec::new(),
        };
        let excluded = scores
            .iter()
            .filter(|s| s.score.is_none())
            .map(|s| s.role)
            .collect();

        let next_action = if agreement_level > self.synthesis_threshold {
            NextAction::Synthesize
        } else {
            NextAction::Refine
        };

        ConsensusAnalysis {
            agreement_level,
            mean_score,
            standard_deviation,
            next_action,
            scores,
            outliers,
            excluded,
        }
    }
}

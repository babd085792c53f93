//! Side-by-side comparison of the consensus and council decisions

use super::decision::{FinalDecision, Recommendation};
use serde::{Deserialize, Serialize};

/// Confidence gap (percentage points) reported as a key difference
pub const CONFIDENCE_GAP_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub consensus_recommendation: Recommendation,
    pub council_recommendation: Recommendation,
    pub recommendations_match: bool,
    pub consensus_confidence: f64,
    pub council_confidence: f64,
    pub confidence_difference: f64,
    pub consensus_reasoning: String,
    pub council_reasoning: String,
    pub key_differences: Vec<String>,
    pub combined_insight: String,
}

impl ComparisonResult {
    pub fn compare(consensus: &FinalDecision, council: &FinalDecision) -> Self {
        let consensus_rec = consensus.recommendation;
        let council_rec = council.recommendation;
        let consensus_conf = consensus.confidence_level;
        let council_conf = council.confidence_level;
        let recommendations_match = consensus_rec == council_rec;
        let confidence_difference = (consensus_conf - council_conf).abs();

        let mut key_differences = Vec::new();
        if !recommendations_match {
            key_differences.push(format!(
                "Different recommendations: Consensus={consensus_rec}, Council={council_rec}"
            ));
        }
        if confidence_difference > CONFIDENCE_GAP_THRESHOLD {
            key_differences.push(format!(
                "Significant confidence gap: {confidence_difference:.0}%"
            ));
        }

        let combined_insight = if recommendations_match {
            format!(
                "Both methods agree on {consensus_rec} with average confidence {:.0}%",
                (consensus_conf + council_conf) / 2.0
            )
        } else {
            format!(
                "Methods disagree: Consensus recommends {consensus_rec} ({consensus_conf:.0}%) \
                 while Council recommends {council_rec} ({council_conf:.0}%). \
                 Consider additional analysis."
            )
        };

        Self {
            consensus_recommendation: consensus_rec,
            council_recommendation: council_rec,
            recommendations_match,
            consensus_confidence: consensus_conf,
            council_confidence: council_conf,
            confidence_difference,
            consensus_reasoning: consensus.executive_summary.clone(),
            council_reasoning: council.rationale().to_string(),
            key_differences,
            combined_insight,
        }
    }
}

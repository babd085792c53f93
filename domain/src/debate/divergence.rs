//! Divergence analysis over the council's first round

use super::task::Task;
use crate::core::provider::Provider;
use serde::{Deserialize, Serialize};

/// One provider's headline position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPosition {
    pub provider: Provider,
    /// Upper-cased recommendation; `None` when the answer was unusable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Where the council's first answers agree and where they split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceAnalysis {
    pub positions: Vec<ProviderPosition>,
    /// Every usable recommendation is the same
    pub recommendation_agreement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub majority_recommendation: Option<String>,
    pub agreeing_providers: Vec<Provider>,
    pub divergent_providers: Vec<Provider>,
    /// max - min of the reported confidences (0 with fewer than two)
    pub confidence_spread: f64,
    pub total_providers: usize,
}

impl DivergenceAnalysis {
    pub fn analyze(tasks: &[Task]) -> Self {
        let positions: Vec<ProviderPosition> = tasks
            .iter()
            .filter_map(|task| {
                let provider = task.identity.provider()?.clone();
                let parsed = task.parsed_output();
                Some(ProviderPosition {
                    provider,
                    recommendation: parsed
                        .and_then(|o| o.recommendation())
                        .map(|r| r.trim().to_uppercase())
                        .filter(|r| !r.is_empty()),
                    confidence: parsed.and_then(|o| o.confidence()),
                    summary: parsed.and_then(|o| o.executive_summary()).map(str::to_string),
                })
            })
            .collect();

        // most common recommendation; first seen wins ties
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for rec in positions.iter().filter_map(|p| p.recommendation.as_deref()) {
            match counts.iter_mut().find(|(r, _)| *r == rec) {
                Some((_, n)) => *n += 1,
                None => counts.push((rec, 1)),
            }
        }
        let mut majority: Option<(&str, usize)> = None;
        for &(rec, n) in &counts {
            if majority.is_none_or(|(_, best)| n > best) {
                majority = Some((rec, n));
            }
        }
        let majority_recommendation = majority.map(|(rec, _)| rec.to_string());

        let (agreeing_providers, divergent_providers) = match &majority_recommendation {
            Some(majority) => {
                let usable = positions.iter().filter(|p| p.recommendation.is_some());
                let (agree, diverge): (Vec<_>, Vec<_>) =
                    usable.partition(|p| p.recommendation.as_ref() == Some(majority));
                (
                    agree.into_iter().map(|p| p.provider.clone()).collect(),
                    diverge.into_iter().map(|p| p.provider.clone()).collect(),
                )
            }
            None => (Vec::new(), Vec::new()),
        };

        let confidences: Vec<f64> = positions
            .iter()
            .filter_map(|p| p.confidence)
            .filter(|c| *c > 0.0)
            .collect();
        let confidence_spread = if confidences.len() >= 2 {
            let max = confidences.iter().copied().fold(f64::MIN, f64::max);
            let min = confidences.iter().copied().fold(f64::MAX, f64::min);
            max - min
        } else {
            0.0
        };

        Self {
            recommendation_agreement: counts.len() == 1,
            majority_recommendation,
            agreeing_providers,
            divergent_providers,
            confidence_spread,
            total_providers: positions.len(),
            positions,
        }
    }
}

//! Pre-flight call count and cost estimate for a debate method

use super::session::DebateMethod;
use crate::core::provider::Provider;
use crate::executive::Role;
use serde::{Deserialize, Serialize};

/// Assumed tokens per generation call
pub const AVG_TOKENS_PER_CALL: u32 = 1500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub method: DebateMethod,
    pub total_calls: usize,
    /// USD, rounded to three decimals
    pub estimated_cost: f64,
    pub breakdown: String,
}

fn cost_of(calls: usize, cost_per_1k: f64) -> f64 {
    calls as f64 * cost_per_1k * (AVG_TOKENS_PER_CALL as f64 / 1000.0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl CostEstimate {
    /// Estimate for `method`, with executives on `consensus_provider` and the
    /// council made of `council`.
    pub fn for_method(
        method: DebateMethod,
        consensus_provider: &Provider,
        council: &[Provider],
    ) -> Self {
        match method {
            DebateMethod::Consensus => {
                // one call per executive plus the synthesis
                let total_calls = Role::DISCUSSION_ORDER.len() + 1;
                Self {
                    method,
                    total_calls,
                    estimated_cost: round3(cost_of(
                        total_calls,
                        consensus_provider.cost_per_1k_tokens(),
                    )),
                    breakdown: format!(
                        "{total_calls} calls to {}",
                        consensus_provider.display_name()
                    ),
                }
            }
            DebateMethod::Council => {
                let n = council.len();
                let review_calls = n * n.saturating_sub(1);
                let total_calls = n + review_calls + 1;
                let avg_cost = if n == 0 {
                    0.0
                } else {
                    council.iter().map(Provider::cost_per_1k_tokens).sum::<f64>() / n as f64
                };
                Self {
                    method,
                    total_calls,
                    estimated_cost: round3(cost_of(total_calls, avg_cost)),
                    breakdown: format!(
                        "{n} divergence + {review_calls} peer reviews + 1 synthesis"
                    ),
                }
            }
            DebateMethod::Both => {
                let consensus =
                    Self::for_method(DebateMethod::Consensus, consensus_provider, council);
                let council = Self::for_method(DebateMethod::Council, consensus_provider, council);
                Self {
                    method,
                    total_calls: consensus.total_calls + council.total_calls,
                    estimated_cost: round3(consensus.estimated_cost + council.estimated_cost),
                    breakdown: format!(
                        "Consensus ({} calls) + Council ({} calls)",
                        consensus.total_calls, council.total_calls
                    ),
                }
            }
        }
    }
}

//! Domain layer for debate-console
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Debate methods
//!
//! - **Consensus**: four executives (CFO, CPO, CTO, CRO) answer in parallel;
//!   their categorical recommendations are scored and the spread becomes an
//!   agreement level before a facilitator synthesizes the decision.
//! - **Council**: every enabled provider answers the same question, reviews
//!   the others anonymously, and the highest-rated provider chairs the synthesis.
//! - **Both**: the two methods run concurrently and their decisions are compared.

pub mod core;
pub mod debate;
pub mod executive;
pub mod generation;
pub mod prompt;
pub mod util;

// Re-export commonly used types
pub use core::{error::DomainError, provider::Provider, question::Question};
pub use debate::{
    comparison::ComparisonResult,
    consensus::{ConsensusAnalysis, ConsensusEvaluator, NextAction, RoleScore},
    council::{PeerReview, RatingMatrix, TargetScore, parse_peer_review, select_synthesizer},
    decision::{FinalDecision, Recommendation, parse_final_decision},
    divergence::{DivergenceAnalysis, ProviderPosition},
    estimate::CostEstimate,
    event::{DebateEvent, EventEnvelope, InputSummary},
    lexicon::recommendation_score,
    session::{DebateContext, DebateMethod, DebateSession, DebateSummary, SessionId, SessionStatus},
    task::{Identity, Task, TaskPhase},
};
pub use executive::{Role, StructuredOutput};
pub use generation::StreamEvent;
pub use prompt::{PromptTemplate, anonymous_label};

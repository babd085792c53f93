//! Structured outputs produced by executives and council providers.
//!
//! Every generation result is decoded into one variant of
//! [`StructuredOutput`]. Text that does not decode into the schema expected
//! for its identity becomes [`StructuredOutput::RawFallback`], so graceful
//! degradation is a value rather than a null check.

use super::role::Role;
use crate::util::{extract_json_object, lenient_string, value_as_percent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CFO analysis: financial model, ROI, cost risks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfoAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_model: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_metrics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_required: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_risks: Option<Value>,
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub financial_recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<Value>,
}

/// CPO analysis: demand, roadmap fit, go-to-market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpoAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_demand: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_feedback: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_positioning: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_roadmap_fit: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_to_market_strategy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_experience_impact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_retention_impact: Option<Value>,
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<Value>,
}

/// CTO analysis: feasibility, effort, technical risk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtoAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_feasibility: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_timeline: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engineering_effort: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack_integration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_risks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scalability_assessment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_capacity_impact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_debt_impact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_blockers: Option<Value>,
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub technology_recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<Value>,
}

/// CRO analysis: sales impact, pricing, market timing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CroAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_impact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_positioning_vs_rivals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_opportunity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_customer_segments: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_acceleration_potential: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate_impact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_retention_impact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_enablement_effort: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_timing: Option<Value>,
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub revenue_recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<Value>,
}

/// Council provider analysis: one provider's answer to the whole question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderAnalysis {
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<Value>,
    #[serde(
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub executive_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_risks: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_next_steps: Option<Value>,
}

/// Decoded result of one generation task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StructuredOutput {
    Cfo(CfoAnalysis),
    Cpo(CpoAnalysis),
    Cto(CtoAnalysis),
    Cro(CroAnalysis),
    Provider(ProviderAnalysis),
    /// Text that did not decode into the expected schema
    RawFallback(String),
}

impl StructuredOutput {
    /// Decode an executive's raw text into that role's schema.
    pub fn parse_role(role: Role, raw: &str) -> Self {
        let Some(map) = extract_json_object(raw) else {
            return StructuredOutput::RawFallback(raw.to_string());
        };
        let value = Value::Object(map);
        let parsed = match role {
            Role::Cfo => serde_json::from_value(value).map(StructuredOutput::Cfo),
            Role::Cpo => serde_json::from_value(value).map(StructuredOutput::Cpo),
            Role::Cto => serde_json::from_value(value).map(StructuredOutput::Cto),
            Role::Cro => serde_json::from_value(value).map(StructuredOutput::Cro),
        };
        parsed.unwrap_or_else(|_| StructuredOutput::RawFallback(raw.to_string()))
    }

    /// Decode a council provider's raw text.
    pub fn parse_provider(raw: &str) -> Self {
        extract_json_object(raw)
            .and_then(|map| serde_json::from_value(Value::Object(map)).ok())
            .map(StructuredOutput::Provider)
            .unwrap_or_else(|| StructuredOutput::RawFallback(raw.to_string()))
    }

    pub fn is_raw_fallback(&self) -> bool {
        matches!(self, StructuredOutput::RawFallback(_))
    }

    /// The categorical recommendation term, as written by the model
    pub fn recommendation(&self) -> Option<&str> {
        match self {
            StructuredOutput::Cfo(a) => a.financial_recommendation.as_deref(),
            StructuredOutput::Cpo(a) => a.product_recommendation.as_deref(),
            StructuredOutput::Cto(a) => a.technology_recommendation.as_deref(),
            StructuredOutput::Cro(a) => a.revenue_recommendation.as_deref(),
            StructuredOutput::Provider(a) => a.recommendation.as_deref(),
            StructuredOutput::RawFallback(_) => None,
        }
    }

    /// Self-reported confidence, 0-100
    pub fn confidence(&self) -> Option<f64> {
        let value = match self {
            StructuredOutput::Cfo(a) => a.confidence_level.as_ref(),
            StructuredOutput::Cpo(a) => a.confidence_level.as_ref(),
            StructuredOutput::Cto(a) => a.confidence_level.as_ref(),
            StructuredOutput::Cro(a) => a.confidence_level.as_ref(),
            StructuredOutput::Provider(a) => a.confidence_level.as_ref(),
            StructuredOutput::RawFallback(_) => None,
        }?;
        value_as_percent(value)
    }

    pub fn executive_summary(&self) -> Option<&str> {
        match self {
            StructuredOutput::Provider(a) => a.executive_summary.as_deref(),
            _ => None,
        }
    }

    /// JSON payload for events and prompts; `None` for raw fallbacks
    pub fn to_json(&self) -> Option<Value> {
        let value = match self {
            StructuredOutput::Cfo(a) => serde_json::to_value(a),
            StructuredOutput::Cpo(a) => serde_json::to_value(a),
            StructuredOutput::Cto(a) => serde_json::to_value(a),
            StructuredOutput::Cro(a) => serde_json::to_value(a),
            StructuredOutput::Provider(a) => serde_json::to_value(a),
            StructuredOutput::RawFallback(_) => return None,
        };
        value.ok()
    }

    /// Text handed to downstream prompts: pretty JSON, or the raw text itself
    pub fn prompt_text(&self) -> String {
        match self {
            StructuredOutput::RawFallback(raw) => raw.clone(),
            other => other
                .to_json()
                .and_then(|v| serde_json::to_string_pretty(&v).ok())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cfo_output() {
        let raw = r#"{"financial_recommendation": "proceed_with_caution", "confidence_level": "70%", "cost_risks": ["cloud spend"]}"#;
        let output = StructuredOutput::parse_role(Role::Cfo, raw);
        assert!(!output.is_raw_fallback());
        assert_eq!(output.recommendation(), Some("proceed_with_caution"));
        assert_eq!(output.confidence(), Some(70.0));
    }

    #[test]
    fn test_parse_role_from_fenced_block() {
        let raw = "```json\n{\"technology_recommendation\": \"build\"}\n```";
        let output = StructuredOutput::parse_role(Role::Cto, raw);
        assert_eq!(output.recommendation(), Some("build"));
    }

    #[test]
    fn test_unparseable_output_falls_back_to_raw() {
        let raw = "We should definitely build this, trust me.";
        let output = StructuredOutput::parse_role(Role::Cpo, raw);
        assert_eq!(output, StructuredOutput::RawFallback(raw.to_string()));
        assert_eq!(output.recommendation(), None);
        assert_eq!(output.to_json(), None);
        assert_eq!(output.prompt_text(), raw);
    }

    #[test]
    fn test_non_string_recommendation_is_absent() {
        let raw = r#"{"revenue_recommendation": {"verdict": "accelerates"}}"#;
        let output = StructuredOutput::parse_role(Role::Cro, raw);
        assert!(matches!(output, StructuredOutput::Cro(_)));
        assert_eq!(output.recommendation(), None);
    }

    #[test]
    fn test_parse_provider_output() {
        let raw = r#"{"recommendation": "PIVOT", "confidence_level": 64, "executive_summary": "Narrow the scope."}"#;
        let output = StructuredOutput::parse_provider(raw);
        assert_eq!(output.recommendation(), Some("PIVOT"));
        assert_eq!(output.confidence(), Some(64.0));
        assert_eq!(output.executive_summary(), Some("Narrow the scope."));
    }

    #[test]
    fn test_structured_output_serde_roundtrip() {
        let output = StructuredOutput::parse_role(
            Role::Cfo,
            r#"{"financial_recommendation": "hold", "key_metrics": {"cac": 1200}}"#,
        );
        let json = serde_json::to_string(&output).unwrap();
        let back: StructuredOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(output, back);

        let raw = StructuredOutput::RawFallback("plain".to_string());
        let json = serde_json::to_string(&raw).unwrap();
        assert_eq!(serde_json::from_str::<StructuredOutput>(&json).unwrap(), raw);
    }
}

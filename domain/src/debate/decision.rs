//! Final decision produced by synthesis

use crate::core::error::DomainError;
use crate::util::{extract_json_object, value_as_percent, value_as_string_list};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Categorical outcome of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Go,
    Pivot,
    Hold,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Go => "GO",
            Recommendation::Pivot => "PIVOT",
            Recommendation::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Recommendation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GO" => Ok(Recommendation::Go),
            "PIVOT" => Ok(Recommendation::Pivot),
            "HOLD" => Ok(Recommendation::Hold),
            other => Err(DomainError::MalformedDecision(format!(
                "unknown recommendation '{other}'"
            ))),
        }
    }
}

/// The synthesized answer to a debate question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalDecision {
    pub recommendation: Recommendation,
    /// 0-100
    pub confidence_level: f64,
    pub executive_summary: String,
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consensus_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disagreement_areas: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_insights: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub critical_success_factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl FinalDecision {
    pub fn new(
        recommendation: Recommendation,
        confidence_level: f64,
        executive_summary: impl Into<String>,
    ) -> Self {
        Self {
            recommendation,
            confidence_level: confidence_level.clamp(0.0, 100.0),
            executive_summary: executive_summary.into(),
            next_steps: Vec::new(),
            consensus_points: Vec::new(),
            disagreement_areas: Vec::new(),
            key_insights: Vec::new(),
            risk_factors: Vec::new(),
            critical_success_factors: Vec::new(),
            weighted_reasoning: None,
            reasoning: None,
        }
    }

    /// The best available justification text
    pub fn rationale(&self) -> &str {
        self.weighted_reasoning
            .as_deref()
            .or(self.reasoning.as_deref())
            .unwrap_or(&self.executive_summary)
    }
}

fn malformed(detail: impl Into<String>) -> DomainError {
    DomainError::MalformedDecision(detail.into())
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn list_field(map: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter()
        .find_map(|key| map.get(*key))
        .map(value_as_string_list)
}

/// Parse the synthesizer's text. Any missing required field is an error.
pub fn parse_final_decision(raw: &str) -> Result<FinalDecision, DomainError> {
    let map = extract_json_object(raw).ok_or_else(|| malformed("no JSON object in output"))?;

    let recommendation = map
        .get("recommendation")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing recommendation"))?
        .parse::<Recommendation>()?;
    let confidence_level = map
        .get("confidence_level")
        .and_then(value_as_percent)
        .ok_or_else(|| malformed("missing or invalid confidence_level"))?;
    let executive_summary =
        text_field(&map, "executive_summary").ok_or_else(|| malformed("missing executive_summary"))?;
    let next_steps = list_field(&map, &["next_steps", "recommended_next_steps"])
        .ok_or_else(|| malformed("missing next_steps"))?;

    Ok(FinalDecision {
        recommendation,
        confidence_level,
        executive_summary,
        next_steps,
        consensus_points: list_field(&map, &["consensus_points"]).unwrap_or_default(),
        disagreement_areas: list_field(&map, &["disagreement_areas"]).unwrap_or_default(),
        key_insights: list_field(&map, &["key_insights", "key_insights_from_council"])
            .unwrap_or_default(),
        risk_factors: list_field(&map, &["risk_factors"]).unwrap_or_default(),
        critical_success_factors: list_field(&map, &["critical_success_factors"])
            .unwrap_or_default(),
        weighted_reasoning: text_field(&map, "weighted_reasoning"),
        reasoning: text_field(&map, "reasoning"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_consensus_synthesis() {
        let raw = r#"{
            "recommendation": "pivot",
            "confidence_level": "72%",
            "executive_summary": "Ship a narrower beta first.",
            "consensus_points": ["Demand is real"],
            "disagreement_areas": ["Build vs buy"],
            "recommended_next_steps": [{"step": "Scope beta", "priority": "high"}, "Hire PM"],
            "reasoning": "Financial risk is high."
        }"#;
        let decision = parse_final_decision(raw).unwrap();
        assert_eq!(decision.recommendation, Recommendation::Pivot);
        assert_eq!(decision.confidence_level, 72.0);
        assert_eq!(decision.next_steps, vec!["Scope beta".to_string(), "Hire PM".to_string()]);
        assert_eq!(decision.consensus_points.len(), 1);
        assert_eq!(decision.rationale(), "Financial risk is high.");
    }

    #[test]
    fn test_parse_council_synthesis() {
        let raw = "```json\n{\"recommendation\": \"GO\", \"confidence_level\": 88, \
                   \"executive_summary\": \"Go.\", \"next_steps\": [], \
                   \"weighted_reasoning\": \"Highest rated answer was convincing.\", \
                   \"key_insights_from_council\": [\"Strong pull from enterprise\"]}\n```";
        let decision = parse_final_decision(raw).unwrap();
        assert_eq!(decision.recommendation, Recommendation::Go);
        assert!(decision.next_steps.is_empty());
        assert_eq!(decision.key_insights, vec!["Strong pull from enterprise".to_string()]);
        assert_eq!(decision.rationale(), "Highest rated answer was convincing.");
    }

    #[test]
    fn test_missing_fields_are_fatal() {
        assert!(parse_final_decision("We should go for it").is_err());
        assert!(
            parse_final_decision(r#"{"recommendation": "GO", "confidence_level": 80}"#).is_err()
        );
        assert!(
            parse_final_decision(
                r#"{"recommendation": "MAYBE", "confidence_level": 80,
                    "executive_summary": "x", "next_steps": []}"#
            )
            .is_err()
        );
        assert!(
            parse_final_decision(
                r#"{"recommendation": "HOLD", "confidence_level": "high",
                    "executive_summary": "x", "next_steps": []}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_decision_serde_roundtrip() {
        let mut decision = FinalDecision::new(Recommendation::Hold, 140.0, "Wait a quarter.");
        decision.next_steps.push("Revisit in Q3".to_string());
        assert_eq!(decision.confidence_level, 100.0);

        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["recommendation"], "HOLD");
        let back: FinalDecision = serde_json::from_value(json).unwrap();
        assert_eq!(back, decision);
    }
}

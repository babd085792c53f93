//! Executive roles that take part in the consensus debate

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// One of the four fixed executive seats (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Chief Financial Officer: ROI, profitability, capital efficiency
    Cfo,
    /// Chief Product Officer: customer needs, product-market fit
    Cpo,
    /// Chief Technology Officer: feasibility, engineering effort
    Cto,
    /// Chief Revenue Officer: revenue impact, sales cycles
    Cro,
}

impl Role {
    /// All roles in discussion order (CPO opens, CRO closes)
    pub const DISCUSSION_ORDER: [Role; 4] = [Role::Cpo, Role::Cfo, Role::Cto, Role::Cro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cfo => "cfo",
            Role::Cpo => "cpo",
            Role::Cto => "cto",
            Role::Cro => "cro",
        }
    }

    /// Persona name used in prompts and on the console
    pub fn persona_name(&self) -> &'static str {
        match self {
            Role::Cfo => "Alex Chen",
            Role::Cpo => "Jamie Rodriguez",
            Role::Cto => "Sam Park",
            Role::Cro => "Taylor Morgan",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Role::Cfo => "Chief Financial Officer",
            Role::Cpo => "Chief Product Officer",
            Role::Cto => "Chief Technology Officer",
            Role::Cro => "Chief Revenue Officer",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Role::Cfo => "💰",
            Role::Cpo => "🎯",
            Role::Cto => "⚙️",
            Role::Cro => "📈",
        }
    }

    /// What this executive optimizes for
    pub fn primary_concern(&self) -> &'static str {
        match self {
            Role::Cfo => "ROI, profitability, capital efficiency",
            Role::Cpo => "Customer needs, product-market fit, differentiation",
            Role::Cto => "Technical feasibility, engineering effort, scalability",
            Role::Cro => "Revenue impact, sales cycles, competitive positioning",
        }
    }

    /// Sampling temperature requested for this persona
    pub fn temperature(&self) -> f32 {
        match self {
            Role::Cfo => 0.6,
            Role::Cpo => 0.7,
            Role::Cto => 0.5,
            Role::Cro => 0.7,
        }
    }

    /// JSON field carrying this role's categorical recommendation
    pub fn recommendation_field(&self) -> &'static str {
        match self {
            Role::Cfo => "financial_recommendation",
            Role::Cpo => "product_recommendation",
            Role::Cto => "technology_recommendation",
            Role::Cro => "revenue_recommendation",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cfo" => Ok(Role::Cfo),
            "cpo" => Ok(Role::Cpo),
            "cto" => Ok(Role::Cto),
            "cro" => Ok(Role::Cro),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discussion_order() {
        let order: Vec<&str> = Role::DISCUSSION_ORDER.iter().map(|r| r.as_str()).collect();
        assert_eq!(order, vec!["cpo", "cfo", "cto", "cro"]);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("CTO".parse::<Role>().unwrap(), Role::Cto);
        assert!("coo".parse::<Role>().is_err());
    }

    #[test]
    fn test_recommendation_fields_are_distinct() {
        let mut fields: Vec<&str> = Role::DISCUSSION_ORDER
            .iter()
            .map(|r| r.recommendation_field())
            .collect();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), 4);
    }
}

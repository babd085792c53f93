//! Prompt templates for the consensus and council flows

use crate::core::provider::Provider;
use crate::debate::consensus::ConsensusAnalysis;
use crate::debate::council::RatingMatrix;
use crate::debate::session::DebateContext;
use crate::debate::task::Task;
use crate::executive::Role;
use crate::util::truncate_str;

/// Longest slice of a council answer quoted back to the chairman
const CHAIRMAN_QUOTE_BYTES: usize = 2000;

/// Anonymous label for the council answer at `index` ("llm_1", ...)
pub fn anonymous_label(index: usize) -> String {
    format!("llm_{}", index + 1)
}

fn context_json(context: &DebateContext) -> String {
    serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string())
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    // ==================== Consensus ====================

    /// Persona system prompt for one executive
    pub fn executive_system(role: Role) -> String {
        let (perspective, job, keys) = match role {
            Role::Cfo => (
                "- You care about unit economics, profitability and capital efficiency\n\
                 - You think in cash flow, burn rate and runway\n\
                 - You are skeptical of expensive projects without a clear financial upside",
                "Model the 3-year P&L impact, identify cost drivers and the breakeven point, \
                 and weigh the opportunity cost of the investment.",
                "- financial_model\n- key_metrics (CAC, LTV, payback_period, cash_flow_impact)\n\
                 - budget_required\n- roi_analysis\n- cost_risks\n\
                 - financial_recommendation (proceed / proceed_with_caution / hold / pivot)\n\
                 - confidence_level (0-100)",
            ),
            Role::Cpo => (
                "- You live and breathe customer needs and market demand\n\
                 - You think about competitive positioning and differentiation\n\
                 - You balance feature parity with innovation",
                "Assess customer demand, competitive threat, roadmap fit for the next 18 months \
                 and the go-to-market plan.",
                "- market_demand\n- customer_feedback\n- competitive_positioning\n\
                 - product_roadmap_fit\n- go_to_market_strategy\n- user_experience_impact\n\
                 - customer_retention_impact\n\
                 - product_recommendation (go / go_with_changes / hold / no_go)\n\
                 - confidence_level (0-100)",
            ),
            Role::Cto => (
                "- You own architecture decisions and technical risk\n\
                 - You think about technical debt, scalability and maintainability\n\
                 - You manage engineering capacity and velocity",
                "Assess feasibility, estimate effort in months and headcount, and name the \
                 dependencies and blockers that could derail delivery.",
                "- technical_feasibility\n- implementation_timeline\n- engineering_effort\n\
                 - tech_stack_integration\n- technical_risks\n- scalability_assessment\n\
                 - team_capacity_impact\n- technical_debt_impact\n- implementation_blockers\n\
                 - technology_recommendation (build / build_with_constraints / buy / no_build)\n\
                 - confidence_level (0-100)",
            ),
            Role::Cro => (
                "- You understand what drives deals and what customers buy\n\
                 - You think about sales cycles, pricing power and win rates\n\
                 - You know what the sales team hears in the field",
                "Judge whether this closes deals, what it does to pricing and win rates, which \
                 segments value it most, and how ready the market is.",
                "- sales_impact\n- competitive_positioning_vs_rivals\n- pricing_opportunity\n\
                 - target_customer_segments\n- deal_acceleration_potential\n- win_rate_impact\n\
                 - customer_retention_impact\n- sales_enablement_effort\n- market_timing\n\
                 - revenue_recommendation (accelerates / neutral / decelerates)\n\
                 - confidence_level (0-100)",
            ),
        };

        format!(
            "You are {name}, the {title} of a Series B SaaS company.\n\n\
             Your perspective:\n{perspective}\n\n\
             Your job in this debate: {job}\n\n\
             Be concrete and use numbers where you can.\n\n\
             Respond with a single JSON object with keys:\n{keys}",
            name = role.persona_name(),
            title = role.title(),
        )
    }

    /// User prompt handed to every executive
    pub fn executive_prompt(question: &str, context: &DebateContext) -> String {
        format!(
            "DECISION UNDER REVIEW:\n{question}\n\n\
             COMPANY CONTEXT:\n{}\n\n\
             Provide your analysis in JSON format.",
            context_json(context)
        )
    }

    /// System prompt for the consensus facilitator
    pub fn consensus_synthesis_system() -> &'static str {
        "You are an executive facilitator synthesizing a product decision from the \
         executive team's analyses. Be decisive and answer with a single JSON object."
    }

    /// User prompt for the consensus synthesis
    pub fn consensus_synthesis(
        question: &str,
        context: &DebateContext,
        tasks: &[Task],
        analysis: &ConsensusAnalysis,
    ) -> String {
        let mut prompt = format!(
            "Decision question: {question}\n\nCOMPANY CONTEXT:\n{}\n\nExecutive perspectives:\n",
            context_json(context)
        );

        for task in tasks {
            let Some(role) = task.identity.role() else {
                continue;
            };
            let body = task
                .prompt_text()
                .unwrap_or_else(|| "(no response: this executive's analysis failed)".to_string());
            prompt.push_str(&format!(
                "\n--- {} ({}) ---\n{}\n",
                role.title(),
                role.persona_name(),
                body
            ));
        }

        prompt.push_str(&format!(
            "\nConsensus analysis:\nOverall agreement level: {:.0}%\n",
            analysis.agreement_level * 100.0
        ));
        if !analysis.outliers.is_empty() {
            let outliers: Vec<&str> = analysis.outliers.iter().map(|r| r.title()).collect();
            prompt.push_str(&format!("Outlying positions: {}\n", outliers.join(", ")));
        }

        prompt.push_str(
            r#"
Your job:
1. Synthesize the team's analysis into a clear recommendation
2. Highlight areas of strong consensus
3. Call out critical disagreements that need resolution
4. Make a clear GO / PIVOT / HOLD recommendation
5. Provide next steps

Output JSON with keys:
- recommendation ("GO" | "PIVOT" | "HOLD")
- confidence_level (0-100)
- executive_summary (2-3 sentences for the board)
- consensus_points (list)
- disagreement_areas (list)
- critical_success_factors (list)
- recommended_next_steps (list)
- reasoning (why this recommendation?)"#,
        );

        prompt
    }

    // ==================== Council ====================

    /// System prompt shared by council members
    pub fn council_system() -> &'static str {
        "You are an AI advisor on a council of independent models analyzing a product \
         decision. Give a thorough, well-reasoned analysis as a single JSON object."
    }

    /// First-round prompt sent to every council provider
    pub fn divergence_prompt(question: &str, context: &DebateContext) -> String {
        format!(
            r#"DECISION QUESTION:
{question}

COMPANY CONTEXT:
{}

Analyze this decision from multiple angles:
1. Financial implications (costs, ROI, budget)
2. Product-market fit and customer demand
3. Technical feasibility and implementation effort
4. Revenue potential and competitive positioning
5. Risks and mitigation strategies

Provide your analysis as JSON:
{{
    "recommendation": "GO" | "PIVOT" | "HOLD",
    "confidence_level": <0-100>,
    "executive_summary": "<2-3 sentence summary>",
    "financial_analysis": "<key financial considerations>",
    "product_analysis": "<product-market fit assessment>",
    "technical_analysis": "<feasibility and effort>",
    "revenue_analysis": "<revenue potential>",
    "key_risks": ["<risk 1>", "<risk 2>"],
    "recommended_next_steps": ["<step 1>", "<step 2>"]
}}"#,
            context_json(context)
        )
    }

    /// System prompt for peer reviewers
    pub fn review_system() -> &'static str {
        "You are an expert evaluator reviewing an anonymous AI response to a product \
         decision question. Be objective, fair and rigorous. Do not inflate scores."
    }

    /// Anonymous review of one council answer
    pub fn peer_review_prompt(
        question: &str,
        context: &DebateContext,
        label: &str,
        response: &str,
    ) -> String {
        format!(
            r#"ORIGINAL QUESTION:
{question}

COMPANY CONTEXT:
{}

RESPONSE TO REVIEW (Response {label}):
{response}

Evaluate this response on:
1. Accuracy and correctness of analysis
2. Depth of reasoning and insight
3. Practical actionability of recommendations
4. Consideration of risks and trade-offs
5. Clarity and structure

Provide your evaluation as JSON:
{{
    "score": <1-10, where 10 is excellent>,
    "critique": "<2-3 sentences explaining your score>",
    "strengths": ["<strength 1>", "<strength 2>"],
    "weaknesses": ["<weakness 1>", "<weakness 2>"]
}}"#,
            context_json(context)
        )
    }

    /// System prompt for the chairman
    pub fn chairman_system() -> &'static str {
        "You are the Chairman of an LLM Council, responsible for synthesizing several \
         peer-reviewed AI perspectives into one final product decision."
    }

    /// Chairman synthesis prompt. `responses` are the council tasks in council
    /// order. The highest-rated answer is quoted first as the lead perspective;
    /// with no ratings the first completed answer leads.
    pub fn chairman_prompt(
        question: &str,
        context: &DebateContext,
        responses: &[Task],
        matrix: &RatingMatrix,
    ) -> String {
        let lead = matrix.highest_rated.as_ref().or_else(|| {
            responses
                .iter()
                .find(|t| t.is_complete())
                .and_then(|t| t.identity.provider())
        });
        let is_lead = |provider: &Provider| lead == Some(provider);

        let label_of = |provider: &Provider| {
            responses
                .iter()
                .position(|t| t.identity.provider() == Some(provider))
                .map(anonymous_label)
                .unwrap_or_else(|| provider.to_string())
        };

        let mut ordered: Vec<&Task> = responses
            .iter()
            .filter(|t| t.identity.provider().is_some_and(is_lead))
            .collect();
        ordered.extend(
            responses
                .iter()
                .filter(|t| t.identity.provider().is_some_and(|p| !is_lead(p))),
        );

        let mut summaries = String::new();
        for task in ordered {
            let (Some(provider), Some(text)) = (task.identity.provider(), task.prompt_text())
            else {
                continue;
            };
            let score = matrix.score_for(provider).unwrap_or(0.0);
            let lead = if is_lead(provider) { ", lead perspective" } else { "" };
            summaries.push_str(&format!(
                "\n--- Response {} (Average Score: {score:.1}/10{lead}) ---\n{}\n",
                label_of(provider),
                truncate_str(&text, CHAIRMAN_QUOTE_BYTES)
            ));
        }

        let rated = |p: Option<&Provider>| match p {
            Some(p) => format!("{} ({:.1}/10)", label_of(p), matrix.score_for(p).unwrap_or(0.0)),
            None => "n/a".to_string(),
        };

        format!(
            r#"ORIGINAL DECISION QUESTION:
{question}

COMPANY CONTEXT:
{}

COUNCIL RESPONSES (with peer-review scores):
{summaries}
RATING MATRIX SUMMARY:
Highest rated: {}
Lowest rated: {}
Score variance: {:.2} (lower = more agreement)

As Chairman:
1. Give more weight to higher-rated responses, but consider all perspectives
2. Identify the strongest arguments from each response
3. Resolve conflicts by reasoning through trade-offs
4. Synthesize into a clear, actionable recommendation

Output your synthesis as JSON:
{{
    "recommendation": "GO" | "PIVOT" | "HOLD",
    "confidence_level": <0-100>,
    "executive_summary": "<2-3 sentences for decision makers>",
    "weighted_reasoning": "<how the ratings influenced your synthesis>",
    "key_insights_from_council": ["<insight 1>", "<insight 2>"],
    "consensus_points": ["<point 1>", "<point 2>"],
    "disagreement_areas": ["<area 1>", "<area 2>"],
    "recommended_next_steps": ["<step 1>", "<step 2>"],
    "risk_factors": ["<risk 1>", "<risk 2>"]
}}"#,
            context_json(context),
            rated(matrix.highest_rated.as_ref()),
            rated(matrix.lowest_rated.as_ref()),
            matrix.score_variance,
        )
    }
}

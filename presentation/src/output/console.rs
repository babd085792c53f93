//! Console output formatter for debate sessions

use colored::{ColoredString, Colorize};
use debate_domain::{
    ComparisonResult, ConsensusAnalysis, CostEstimate, DebateSession, DebateSummary,
    FinalDecision, NextAction, Provider, RatingMatrix, Recommendation, SessionStatus, Task,
    TaskPhase,
};

/// Formats debate sessions for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete session: every answer, the metrics and the decisions
    pub fn format(session: &DebateSession) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Executive Debate"));
        output.push('\n');
        output.push_str(&Self::preamble(session));

        let roles: Vec<&Task> = session.role_tasks().collect();
        if !roles.is_empty() {
            output.push_str(&Self::section_header("Executive Analyses"));
            for task in roles {
                output.push_str(&Self::task_block(task));
            }
        }

        if let Some(consensus) = &session.consensus {
            output.push_str(&Self::section_header("Consensus"));
            output.push_str(&Self::consensus_block(consensus));
        }
        if let Some(decision) = &session.consensus_decision {
            output.push_str(&Self::section_header("Consensus Decision"));
            output.push_str(&Self::decision_block(decision));
        }

        let providers: Vec<&Task> = session.provider_tasks().collect();
        if !providers.is_empty() {
            output.push_str(&Self::section_header("Council Responses"));
            for task in providers {
                output.push_str(&Self::task_block(task));
            }
        }

        if let Some(matrix) = &session.rating_matrix {
            output.push_str(&Self::section_header("Peer Review"));
            output.push_str(&Self::matrix_block(
                matrix,
                session.chairman.as_ref(),
                session.synthesizer.as_ref(),
            ));
        }
        if let Some(decision) = &session.council_decision {
            output.push_str(&Self::section_header("Council Decision"));
            output.push_str(&Self::decision_block(decision));
        }

        if let Some(comparison) = &session.comparison {
            output.push_str(&Self::section_header("Consensus vs Council"));
            output.push_str(&Self::comparison_block(comparison));
        }

        output.push_str(&Self::status_line(&session.status));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(session: &DebateSession) -> String {
        serde_json::to_string_pretty(session).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the decision only (concise output)
    pub fn format_decision(session: &DebateSession) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Debate Decision ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), session.query.content()));

        match (&session.consensus_decision, &session.council_decision) {
            (Some(consensus), Some(council)) => {
                output.push_str(&format!("{}\n", "Consensus".yellow().bold()));
                output.push_str(&Self::decision_block(consensus));
                output.push_str(&format!("\n{}\n", "Council".yellow().bold()));
                output.push_str(&Self::decision_block(council));
                if let Some(comparison) = &session.comparison {
                    output.push('\n');
                    output.push_str(&Self::comparison_block(comparison));
                }
            }
            (Some(decision), None) | (None, Some(decision)) => {
                output.push_str(&Self::decision_block(decision));
            }
            (None, None) => {}
        }

        if session.status != SessionStatus::Completed {
            output.push_str(&Self::status_line(&session.status));
        }

        output
    }

    /// Table of saved debates
    pub fn format_history(summaries: &[DebateSummary]) -> String {
        if summaries.is_empty() {
            return format!("{}\n", "No saved debates.".dimmed());
        }

        let mut output = format!(
            "{}\n",
            format!(
                "{:<14} {:<17} {:<10} {:<10} {:<7} {:>5}  {}",
                "ID", "STARTED", "METHOD", "STATUS", "RESULT", "CONF", "QUESTION"
            )
            .bold()
        );
        for summary in summaries {
            let result = summary
                .recommendation
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            let confidence = summary
                .confidence_level
                .map(|c| format!("{c:.0}%"))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<14} {:<17} {:<10} {:<10} {:<7} {:>5}  {}\n",
                summary.id.as_str(),
                summary.started_at.format("%Y-%m-%d %H:%M").to_string(),
                summary.method.as_str(),
                summary.status,
                result,
                confidence,
                summary.question
            ));
        }
        output
    }

    /// Reachable providers and what each method would cost with them
    pub fn format_providers(available: &[Provider], estimates: &[CostEstimate]) -> String {
        let mut output = String::new();

        output.push_str(&Self::section_header("Providers"));
        if available.is_empty() {
            output.push_str(&format!(
                "  {}\n",
                "No provider has credentials configured.".red()
            ));
        }
        for provider in available {
            output.push_str(&format!(
                "  {} {:<12} {:<18} ${:.5} / 1k tokens\n",
                "v".green(),
                provider.as_str(),
                provider.display_name(),
                provider.cost_per_1k_tokens()
            ));
        }

        output.push_str(&Self::section_header("Estimates"));
        for estimate in estimates {
            output.push_str(&format!(
                "  {:<10} {:>3} calls  ${:.3}  ({})\n",
                estimate.method.as_str().bold(),
                estimate.total_calls,
                estimate.estimated_cost,
                estimate.breakdown
            ));
        }

        output
    }

    fn preamble(session: &DebateSession) -> String {
        let mut output = format!(
            "{} {}\n{} {}\n{} {}\n",
            "Question:".cyan().bold(),
            session.query.content(),
            "Method:".cyan().bold(),
            session.method,
            "Session:".cyan().bold(),
            session.id
        );
        if !session.context.is_empty() {
            output.push_str(&format!("{}\n", "Context:".cyan().bold()));
            for (key, value) in &session.context {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                output.push_str(&format!("  {key}: {value}\n"));
            }
        }
        output
    }

    fn task_block(task: &Task) -> String {
        let title = format!("── {} ──", task.identity.display_name());
        match task.phase {
            TaskPhase::Complete => {
                let mut block = format!("\n{}\n", title.yellow().bold());
                match task.parsed_output() {
                    Some(output) => {
                        if let Some(recommendation) = output.recommendation() {
                            block.push_str(&format!(
                                "  {} {}",
                                "Recommendation:".bold(),
                                recommendation.to_uppercase()
                            ));
                            if let Some(confidence) = output.confidence() {
                                block.push_str(&format!(" ({confidence:.0}% confident)"));
                            }
                            block.push('\n');
                        }
                        if let Some(summary) = output.executive_summary() {
                            block.push_str(&Self::indent(summary, "  "));
                            block.push('\n');
                        }
                    }
                    None => {
                        block.push_str(&format!("  {}\n", "(unstructured answer)".dimmed()));
                        if let Some(raw) = &task.raw_output {
                            block.push_str(&Self::indent(raw.trim(), "  "));
                            block.push('\n');
                        }
                    }
                }
                block
            }
            _ => format!(
                "\n{}\n  Error: {}\n",
                title.red().bold(),
                task.error.as_deref().unwrap_or(task.phase.as_str())
            ),
        }
    }

    fn consensus_block(consensus: &ConsensusAnalysis) -> String {
        let mut block = format!(
            "  {} {:.0}%\n",
            "Agreement:".bold(),
            consensus.agreement_level * 100.0
        );
        if let (Some(mean), Some(std_dev)) = (consensus.mean_score, consensus.standard_deviation) {
            block.push_str(&format!("  Mean score {mean:.1}, std dev {std_dev:.1}\n"));
        }
        for score in &consensus.scores {
            let term = score.recommendation.as_deref().unwrap_or("-");
            let value = score
                .score
                .map(|s| format!("{s:.0}"))
                .unwrap_or_else(|| "excluded".to_string());
            block.push_str(&format!(
                "  {:<4} {:<24} {}\n",
                score.role.as_str().to_uppercase(),
                term,
                value
            ));
        }
        if !consensus.outliers.is_empty() {
            let names: Vec<String> = consensus
                .outliers
                .iter()
                .map(|r| r.as_str().to_uppercase())
                .collect();
            block.push_str(&format!("  Outliers: {}\n", names.join(", ")));
        }
        if consensus.next_action == NextAction::Refine {
            block.push_str(&format!(
                "  {}\n",
                "Low agreement: the decision below papers over real disagreement.".yellow()
            ));
        }
        block
    }

    fn matrix_block(
        matrix: &RatingMatrix,
        chairman: Option<&Provider>,
        synthesizer: Option<&Provider>,
    ) -> String {
        let mut block = String::new();
        for target in &matrix.aggregated_scores {
            block.push_str(&format!(
                "  {:<18} {:>4.1} / 10  ({} reviews)\n",
                target.provider.display_name(),
                target.average,
                target.review_count
            ));
        }
        block.push_str(&format!(
            "  {} {:.0}%  (variance {:.2})\n",
            "Alignment:".bold(),
            matrix.alignment * 100.0,
            matrix.score_variance
        ));
        if let Some(chairman) = chairman {
            block.push_str(&format!(
                "  {} {}\n",
                "Chairman:".bold(),
                chairman.display_name()
            ));
        }
        if let Some(synthesizer) = synthesizer.filter(|s| Some(*s) != chairman) {
            block.push_str(&format!(
                "  {} {}\n",
                "Synthesized by:".bold(),
                synthesizer.display_name()
            ));
        }
        block
    }

    fn decision_block(decision: &FinalDecision) -> String {
        let mut block = format!(
            "  {} ({:.0}% confidence)\n\n",
            Self::paint(decision.recommendation),
            decision.confidence_level
        );
        block.push_str(&Self::indent(&decision.executive_summary, "  "));
        block.push('\n');

        let lists = [
            ("Next steps", &decision.next_steps),
            ("Key insights", &decision.key_insights),
            ("Risk factors", &decision.risk_factors),
            ("Critical success factors", &decision.critical_success_factors),
            ("Agreed", &decision.consensus_points),
            ("Disputed", &decision.disagreement_areas),
        ];
        for (title, items) in lists {
            if items.is_empty() {
                continue;
            }
            block.push_str(&format!("\n  {}\n", format!("{title}:").cyan().bold()));
            for item in items {
                block.push_str(&format!("    * {item}\n"));
            }
        }
        if let Some(reasoning) = decision
            .weighted_reasoning
            .as_deref()
            .or(decision.reasoning.as_deref())
        {
            block.push_str(&format!("\n  {}\n", "Reasoning:".cyan().bold()));
            block.push_str(&Self::indent(reasoning, "    "));
            block.push('\n');
        }
        block
    }

    fn comparison_block(comparison: &ComparisonResult) -> String {
        let verdict = if comparison.recommendations_match {
            "Both methods agree".green().bold()
        } else {
            "The methods disagree".yellow().bold()
        };
        let mut block = format!(
            "  {}: consensus {} ({:.0}%), council {} ({:.0}%)\n",
            verdict,
            Self::paint(comparison.consensus_recommendation),
            comparison.consensus_confidence,
            Self::paint(comparison.council_recommendation),
            comparison.council_confidence
        );
        for difference in &comparison.key_differences {
            block.push_str(&format!("    * {difference}\n"));
        }
        block.push_str(&format!("  {}\n", comparison.combined_insight));
        block
    }

    fn status_line(status: &SessionStatus) -> String {
        match status {
            SessionStatus::Completed => String::new(),
            SessionStatus::Running => format!("\n{}\n", "Debate still running.".dimmed()),
            SessionStatus::Cancelled => format!("\n{}\n", "Debate cancelled.".yellow().bold()),
            SessionStatus::Failed(message) => {
                format!("\n{} {}\n", "Debate failed:".red().bold(), message)
            }
        }
    }

    fn paint(recommendation: Recommendation) -> ColoredString {
        let label = recommendation.as_str().bold();
        match recommendation {
            Recommendation::Go => label.green(),
            Recommendation::Pivot => label.yellow(),
            Recommendation::Hold => label.red(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_domain::{
        ConsensusEvaluator, DebateContext, DebateMethod, PeerReview, Question, Role, SessionId,
    };
    use serde_json::json;

    fn session(method: DebateMethod) -> DebateSession {
        colored::control::set_override(false);
        let question = Question::try_new("Should we build an AI copilot for our CRM?").unwrap();
        let mut context = DebateContext::new();
        context.insert("arr".to_string(), json!("$50M"));
        DebateSession::with_id(SessionId::from("abc123"), question, context, method)
    }

    fn completed_consensus() -> DebateSession {
        let mut session = session(DebateMethod::Consensus);
        for (role, term) in [(Role::Cpo, "go"), (Role::Cfo, "proceed_with_caution")] {
            let mut task = Task::pending(role);
            task.start();
            task.complete(
                json!({
                    role.recommendation_field(): term,
                    "confidence_level": 70,
                    "executive_summary": format!("{} view", role.as_str())
                })
                .to_string(),
            );
            session.tasks.push(task);
        }
        let mut failed = Task::pending(Role::Cto);
        failed.start();
        failed.fail("rate limited");
        session.tasks.push(failed);

        session.consensus = Some(ConsensusEvaluator::default().evaluate(&session.tasks));
        let mut decision = FinalDecision::new(Recommendation::Go, 78.0, "Build the copilot.");
        decision.next_steps = vec!["Hire two ML engineers".to_string()];
        session.consensus_decision = Some(decision);
        session.mark_completed();
        session
    }

    #[test]
    fn test_full_output_covers_every_section() {
        let output = ConsoleFormatter::format(&completed_consensus());

        assert!(output.contains("Should we build an AI copilot"));
        assert!(output.contains("arr: $50M"));
        assert!(output.contains("Executive Analyses"));
        assert!(output.contains("PROCEED_WITH_CAUTION"));
        assert!(output.contains("Error: rate limited"));
        assert!(output.contains("Agreement:"));
        assert!(output.contains("Hire two ML engineers"));
        assert!(output.contains("GO"));
        assert!(!output.contains("Council Responses"));
    }

    #[test]
    fn test_decision_output_for_both_includes_comparison() {
        let mut session = session(DebateMethod::Both);
        let consensus = FinalDecision::new(Recommendation::Go, 80.0, "go");
        let council = FinalDecision::new(Recommendation::Hold, 40.0, "wait");
        session.comparison = Some(ComparisonResult::compare(&consensus, &council));
        session.consensus_decision = Some(consensus);
        session.council_decision = Some(council);
        session.mark_completed();

        let output = ConsoleFormatter::format_decision(&session);
        assert!(output.contains("Consensus"));
        assert!(output.contains("Council"));
        assert!(output.contains("The methods disagree"));
        assert!(output.contains("Different recommendations"));
    }

    #[test]
    fn test_peer_review_names_chairman_and_synthesizer() {
        let mut session = session(DebateMethod::Council);
        session.rating_matrix = Some(RatingMatrix::aggregate(
            &[Provider::Azure, Provider::Google],
            vec![
                PeerReview::new(Provider::Azure, Provider::Google, 9.0),
                PeerReview::new(Provider::Google, Provider::Azure, 6.0),
            ],
        ));
        session.chairman = Some(Provider::Google);
        session.synthesizer = Some(Provider::Anthropic);

        let output = ConsoleFormatter::format(&session);
        assert!(output.contains(&format!("Chairman: {}", Provider::Google.display_name())));
        assert!(output.contains(&format!(
            "Synthesized by: {}",
            Provider::Anthropic.display_name()
        )));

        session.synthesizer = Some(Provider::Google);
        assert!(!ConsoleFormatter::format(&session).contains("Synthesized by:"));
    }

    #[test]
    fn test_failed_session_shows_reason() {
        let mut session = session(DebateMethod::Council);
        session.mark_failed("Council needs at least 2 providers, 1 enabled");

        let output = ConsoleFormatter::format_decision(&session);
        assert!(output.contains("Debate failed:"));
        assert!(output.contains("at least 2 providers"));
    }

    #[test]
    fn test_json_output_is_the_snapshot() {
        let session = completed_consensus();
        let json = ConsoleFormatter::format_json(&session);
        let restored: DebateSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, session.id);
        assert_eq!(restored.recommendation(), Some(Recommendation::Go));
    }

    #[test]
    fn test_history_table() {
        colored::control::set_override(false);
        assert!(ConsoleFormatter::format_history(&[]).contains("No saved debates"));

        let summary = completed_consensus().summary();
        let table = ConsoleFormatter::format_history(&[summary]);
        assert!(table.contains("abc123"));
        assert!(table.contains("completed"));
        assert!(table.contains("78%"));
    }

    #[test]
    fn test_providers_listing() {
        colored::control::set_override(false);
        let estimate = CostEstimate::for_method(
            DebateMethod::Consensus,
            &Provider::Azure,
            &[Provider::Azure],
        );
        let output = ConsoleFormatter::format_providers(&[Provider::Anthropic], &[estimate]);
        assert!(output.contains("Anthropic Claude"));
        assert!(output.contains("consensus"));
        assert!(output.contains("5 calls"));

        let output = ConsoleFormatter::format_providers(&[], &[]);
        assert!(output.contains("No provider"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}

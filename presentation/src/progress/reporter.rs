//! Progress reporting for a running debate

use colored::Colorize;
use debate_application::EventEmitter;
use debate_domain::{DebateEvent, SessionId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with one spinner per executive or provider
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self, key: String, prefix: String, message: String) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(Self::spinner_style());
        bar.set_prefix(prefix);
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(key, bar);
        }
    }

    fn with_spinner(&self, key: &str, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock()
            && let Some(bar) = bars.get(key)
        {
            f(bar);
        }
    }

    fn finish_spinner(&self, key: &str, message: String) {
        let bar = self.bars.lock().ok().and_then(|mut bars| bars.remove(key));
        if let Some(bar) = bar {
            bar.finish_with_message(message);
        }
    }

    fn println(&self, line: String) {
        // prints above the bars; fails only when the terminal is gone
        let _ = self.multi.println(line);
    }

    fn finish_all(&self) {
        if let Ok(mut bars) = self.bars.lock() {
            for (_, bar) in bars.drain() {
                bar.abandon();
            }
        }
        if let Some(bar) = self.phase_bar.lock().ok().and_then(|mut b| b.take()) {
            bar.abandon();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter for ProgressReporter {
    fn emit(&self, _session_id: &SessionId, event: DebateEvent) {
        match &event {
            DebateEvent::ExecStarted {
                role, name, title, emoji, ..
            } => self.start_spinner(
                role.as_str().to_string(),
                format!("{emoji} {name} ({title})"),
                "thinking...".to_string(),
            ),
            DebateEvent::CouncilDivergenceStart { provider, name, .. } => self.start_spinner(
                provider.as_str().to_string(),
                name.clone(),
                "answering...".to_string(),
            ),
            DebateEvent::ExecStreaming { role, .. } => {
                self.with_spinner(role.as_str(), |bar| {
                    bar.inc(1);
                    bar.set_message(format!("{} tokens", bar.position()));
                });
            }
            DebateEvent::CouncilResponseStreaming { provider, .. } => {
                self.with_spinner(provider.as_str(), |bar| {
                    bar.inc(1);
                    bar.set_message(format!("{} tokens", bar.position()));
                });
            }
            DebateEvent::ExecComplete { role, parsed_output, .. } => self.finish_spinner(
                role.as_str(),
                completion_message(parsed_output.is_some()),
            ),
            DebateEvent::CouncilResponseComplete {
                provider,
                parsed_output,
                ..
            } => self.finish_spinner(
                provider.as_str(),
                completion_message(parsed_output.is_some()),
            ),
            DebateEvent::ExecError { role, error } => {
                self.finish_spinner(role.as_str(), format!("{} {}", "x".red(), error))
            }
            DebateEvent::CouncilResponseError { provider, error } => {
                self.finish_spinner(provider.as_str(), format!("{} {}", "x".red(), error))
            }
            DebateEvent::CouncilPeerReviewStart { total_reviews } => {
                let bar = self.multi.add(ProgressBar::new(*total_reviews as u64));
                bar.set_style(Self::phase_style());
                bar.set_prefix("Peer review");
                bar.set_message("Starting...");
                if let Ok(mut phase) = self.phase_bar.lock() {
                    *phase = Some(bar);
                }
            }
            DebateEvent::CouncilPeerReview {
                reviewer,
                target,
                score,
            } => {
                if let Ok(phase) = self.phase_bar.lock()
                    && let Some(bar) = phase.as_ref()
                {
                    bar.set_message(format!("{reviewer} -> {target}: {score:.1}"));
                    bar.inc(1);
                }
            }
            DebateEvent::CouncilRatingMatrix { .. } => {
                if let Some(bar) = self.phase_bar.lock().ok().and_then(|mut b| b.take()) {
                    bar.finish_with_message(format!("{}", "complete!".green()));
                }
                if let Some(line) = describe(&event) {
                    self.println(line);
                }
            }
            DebateEvent::CouncilSynthesisStart { synthesizer, .. } => self.start_spinner(
                "chairman".to_string(),
                format!("Chairman {}", synthesizer.display_name()),
                "synthesizing...".to_string(),
            ),
            DebateEvent::CouncilSynthesisStreaming { .. } => {
                self.with_spinner("chairman", |bar| bar.inc(1));
            }
            DebateEvent::CouncilFinalDecision { decision, .. } => self.finish_spinner(
                "chairman",
                format!("{} {}", "v".green(), decision.recommendation),
            ),
            other if other.is_terminal() => {
                self.finish_all();
                if let Some(line) = describe(other) {
                    self.println(line);
                }
            }
            other => {
                if let Some(line) = describe(other) {
                    self.println(line);
                }
            }
        }
    }
}

fn completion_message(structured: bool) -> String {
    if structured {
        format!("{} done", "v".green())
    } else {
        format!("{} done (unstructured)", "v".yellow())
    }
}

/// One console line for an event, or `None` for per-token noise.
pub fn describe(event: &DebateEvent) -> Option<String> {
    let line = match event {
        DebateEvent::DebateStarted { method, .. } => {
            format!("{} {} debate started", "->".cyan(), method.as_str().bold())
        }
        DebateEvent::ExecStarted {
            emoji, name, title, ..
        } => format!("  {emoji} {name} ({title}) is thinking"),
        DebateEvent::CouncilDivergenceStart { name, .. } => format!("  {name} is answering"),
        DebateEvent::ExecComplete { role, .. } => {
            format!("  {} {}", "v".green(), role.as_str().to_uppercase())
        }
        DebateEvent::CouncilResponseComplete { provider, .. } => {
            format!("  {} {}", "v".green(), provider.display_name())
        }
        DebateEvent::ExecError { role, error } => format!(
            "  {} {} (failed: {error})",
            "x".red(),
            role.as_str().to_uppercase()
        ),
        DebateEvent::CouncilResponseError { provider, error } => format!(
            "  {} {} (failed: {error})",
            "x".red(),
            provider.display_name()
        ),
        DebateEvent::ConsensusUpdate {
            agreement_level, ..
        } => format!(
            "{} Agreement level {:.0}%",
            "->".cyan(),
            agreement_level * 100.0
        ),
        DebateEvent::CouncilDivergenceAnalysis { analysis } => format!(
            "{} {} of {} providers agree{}",
            "->".cyan(),
            analysis.agreeing_providers.len(),
            analysis.total_providers,
            analysis
                .majority_recommendation
                .as_deref()
                .map(|r| format!(" on {r}"))
                .unwrap_or_default()
        ),
        DebateEvent::CouncilPeerReviewStart { total_reviews } => {
            format!("{} Peer review ({total_reviews} reviews)", "->".cyan())
        }
        DebateEvent::CouncilPeerReview {
            reviewer,
            target,
            score,
        } => format!("  {reviewer} rated {target}: {score:.1}"),
        DebateEvent::CouncilRatingMatrix { matrix } => format!(
            "{} Peer alignment {:.0}%{}",
            "->".cyan(),
            matrix.alignment * 100.0,
            matrix
                .highest_rated
                .as_ref()
                .map(|p| format!(", highest rated {}", p.display_name()))
                .unwrap_or_default()
        ),
        DebateEvent::CouncilSynthesisStart {
            chairman,
            synthesizer,
        } => format!(
            "{} Chairman {} is synthesizing{}",
            "->".cyan(),
            synthesizer.display_name(),
            chairman
                .as_ref()
                .map(|lead| format!(", led by {}", lead.display_name()))
                .unwrap_or_default()
        ),
        DebateEvent::FinalDecision { decision }
        | DebateEvent::CouncilFinalDecision { decision, .. } => format!(
            "{} Decision: {} ({:.0}%)",
            "->".cyan(),
            decision.recommendation.as_str().bold(),
            decision.confidence_level
        ),
        DebateEvent::ComparisonComplete { comparison } => {
            if comparison.recommendations_match {
                format!("{} Both methods agree", "->".cyan())
            } else {
                format!("{} The methods disagree", "->".yellow())
            }
        }
        DebateEvent::DebateComplete { .. } => format!("{}", "Debate complete.".green()),
        DebateEvent::DebateCancelled => format!("{}", "Debate cancelled.".yellow()),
        DebateEvent::Error { message } => format!("{} {message}", "Error:".red().bold()),
        DebateEvent::ExecStreaming { .. }
        | DebateEvent::CouncilResponseStreaming { .. }
        | DebateEvent::CouncilSynthesisStreaming { .. }
        | DebateEvent::Pong => return None,
    };
    Some(line)
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl EventEmitter for SimpleProgress {
    fn emit(&self, _session_id: &SessionId, event: DebateEvent) {
        if let Some(line) = describe(&event) {
            println!("{line}");
        }
    }
}

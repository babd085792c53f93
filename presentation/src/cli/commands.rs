//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use debate_domain::{DebateContext, DebateMethod};
use serde_json::Value;
use std::path::PathBuf;

/// Output format for a finished debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every executive and provider answer, the metrics and the decision
    Full,
    /// Only the final decision
    Decision,
    /// The session snapshot as JSON
    Json,
}

/// CLI arguments for debate-console
#[derive(Parser, Debug)]
#[command(name = "debate-console")]
#[command(author, version, about = "Executive debate console - LLM executives and councils argue a product question")]
#[command(long_about = r#"
Debate Console puts a product strategy question in front of several LLM personas
and turns their answers into a GO / PIVOT / HOLD recommendation.

Methods:
  consensus  Four executives (CFO, CPO, CTO, CRO) answer on one provider; the
             spread of their recommendations becomes an agreement level
  council    Every configured provider answers, anonymously reviews its peers,
             and the highest-rated provider chairs the synthesis
  both       Runs the two methods concurrently and compares their decisions

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./debate.toml       Project-level config
3. ~/.config/debate-console/config.toml   Global config
Environment variables prefixed DEBATE_ override everything (DEBATE_SERVER__PORT=9000).

Example:
  debate-console ask "Should we build an AI copilot for our CRM?" -c arr='$50M'
  debate-console ask --method both -o decision "Enter the EU market this year?"
  debate-console serve --port 8000
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Append every emitted event as one JSON line to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one debate and print the result
    Ask(AskArgs),

    /// Serve the websocket console
    Serve(ServeArgs),

    /// Inspect saved debates
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// List providers with credentials and their cost estimates
    Providers,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The product question to debate
    pub question: String,

    /// Debate method
    #[arg(short, long, default_value = "consensus")]
    pub method: DebateMethod,

    /// Company context entry (repeatable); values are parsed as JSON when possible
    #[arg(short, long = "context", value_name = "KEY=VALUE", value_parser = parse_context_pair)]
    pub context: Vec<(String, Value)>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

impl AskArgs {
    pub fn debate_context(&self) -> DebateContext {
        self.context.iter().cloned().collect()
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides [server].host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides [server].port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory for daily-rolling log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Summaries of saved debates, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one saved debate
    Show {
        /// Session id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,
    },
}

impl Cli {
    /// Log directory requested by `serve`, if any
    pub fn log_dir(&self) -> Option<&PathBuf> {
        match &self.command {
            Some(Command::Serve(args)) => args.log_dir.as_ref(),
            _ => None,
        }
    }
}

/// Parse `key=value`; the value is JSON when it parses as JSON, a string otherwise.
pub fn parse_context_pair(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = value.trim();
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

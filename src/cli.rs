use crate::constants;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "crucible",
    version,
    about = "Agentic MCP client for AI-assisted materials discovery"
)]
pub struct Cli {
    /// Model endpoint (Ollama-compatible)
    #[arg(long, default_value = constants::DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// Configuration file (defaults to ~/.crucible/config.toml)
    #[arg(long)]
    pub config: Option<String>,
    /// Extra system prompt prepended to the agent instructions
    #[arg(long)]
    pub system: Option<String>,
    /// Model name override
    #[arg(long)]
    pub model: Option<String>,
    /// Session id to resume
    #[arg(long)]
    pub session: Option<String>,
    /// Analysis mode for this run (creative, adaptive, rigorous)
    #[arg(long)]
    pub mode: Option<String>,
    /// Read the prompt from a file instead of arguments
    #[arg(long)]
    pub prompt_file: Option<String>,
    /// Tool-server to inspect (tools run mode)
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long, short, value_enum, default_value_t = RunMode::Analyze)]
    pub run: RunMode,
    /// Prompt text (analyze/stdio) or composition formula (validate)
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RunMode {
    /// Run the discovery agent over a prompt and emit a JSON report
    Analyze,
    /// One-shot composition validity screen
    Validate,
    /// Line-oriented JSON request/response loop
    Stdio,
    /// Spawn a configured tool-server and list its tools
    Tools,
}

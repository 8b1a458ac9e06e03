//! autocommit - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use autocommit::claude::check_claude_installed;
use autocommit::codex::check_codex_installed;
use autocommit::commit::{ConsoleNotifier, run};
use autocommit::config::{Config, ConfigOverrides, GeneratorKind};
use autocommit::generate::{CommandGenerator, LlmGenerator, MessageGenerator};
use autocommit::llm::{Provider, ProviderSelection};
use autocommit::scm::open_repository;

/// Stage changes, commit them with AI-generated messages, and optionally push.
#[derive(Parser, Debug)]
#[command(name = "autocommit")]
#[command(about = "Stage changes, commit them with AI-generated messages, and optionally push")]
#[command(version)]
struct Cli {
    /// Repository path (any directory inside the working tree)
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,

    /// Push after committing
    #[arg(long, overrides_with = "no_push")]
    push: bool,

    /// Do not push, even if configured to
    #[arg(long)]
    no_push: bool,

    /// One commit for all changes
    #[arg(long, overrides_with = "per_file")]
    batch: bool,

    /// One commit per changed file
    #[arg(long)]
    per_file: bool,

    /// Format messages as Conventional Commits
    #[arg(long)]
    conventional: bool,

    /// Type used when a message has no recognised conventional type
    #[arg(long, value_name = "TYPE")]
    default_type: Option<String>,

    /// Message generator to use
    #[arg(long, value_parser = parse_generator)]
    generator: Option<GeneratorKind>,

    /// Shell command for the `command` generator
    #[arg(long, value_name = "CMD")]
    generator_command: Option<String>,

    /// Delay between checks of the generated message
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_ms: Option<u64>,

    /// Number of checks before falling back to a default message
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    poll_attempts: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            auto_push: flag_pair(self.push, self.no_push),
            batch_commit: flag_pair(self.batch, self.per_file),
            conventional_commits: self.conventional.then_some(true),
            default_type: self.default_type.clone(),
            generator: self.generator,
            generator_command: self.generator_command.clone(),
            poll_interval_ms: self.poll_interval_ms,
            poll_attempts: self.poll_attempts,
            remote: None,
        }
    }
}

/// `--x` / `--no-x` pair to an optional override.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn parse_generator(value: &str) -> Result<GeneratorKind, String> {
    value.parse()
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("autocommit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_generator(config: &Config) -> Result<Box<dyn MessageGenerator>> {
    let generator: Box<dyn MessageGenerator> = match config.generator {
        GeneratorKind::Claude => Box::new(LlmGenerator::new(ProviderSelection::from_primary(
            Provider::Claude,
        ))),
        GeneratorKind::Codex => Box::new(LlmGenerator::new(ProviderSelection::from_primary(
            Provider::Codex,
        ))),
        GeneratorKind::Command => {
            let command = config.generator_command.clone().unwrap_or_default();
            Box::new(CommandGenerator::new(command).context("Invalid generator command")?)
        }
    };
    Ok(generator)
}

/// Warn up front when no LLM CLI can run, since every message will fall back.
async fn warn_if_no_provider(config: &Config) {
    if config.generator == GeneratorKind::Command {
        return;
    }
    let claude = check_claude_installed().await;
    let codex = check_codex_installed().await;
    if let (Err(claude), Err(codex)) = (claude, codex) {
        debug!("claude: {}; codex: {}", claude, codex);
        eprintln!("  [WARN] Neither claude nor codex CLI found; default commit messages will be used");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Open git repository
    let repo = open_repository(&cli.repo).with_context(|| {
        format!(
            "Not a git repository: {}. Run autocommit from within a git repository.",
            cli.repo.display()
        )
    })?;

    // Step 2: Resolve configuration
    let mut config = Config::load(repo.workdir()).context("Failed to load configuration")?;
    config
        .apply_overrides(cli.overrides())
        .context("Invalid command-line option")?;
    config.validate().context("Invalid configuration")?;
    debug!("Effective config: {:?}", config);

    let repo = repo.with_remote(config.remote.clone());
    let generator = build_generator(&config)?;
    warn_if_no_provider(&config).await;

    // Step 3: Stage, generate, commit and push
    let report = run(&repo, generator.as_ref(), &ConsoleNotifier, &config).await;
    debug!(
        "Run finished: {} committed, {} failed, pushed={}",
        report.committed.len(),
        report.failed.len(),
        report.pushed
    );

    Ok(())
}

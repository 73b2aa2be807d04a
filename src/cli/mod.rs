//! Command-line interface for cleantitle.
//!
//! Provides commands for running the backfill, inspecting its durable state
//! and printing the resolved configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapters::{AnthropicModel, YouTubeCatalog, YouTubeTranscripts};
use crate::config::{self, Credentials, ResolvedConfig};
use crate::core::{BackfillOrchestrator, CheckpointStore, TitleGenerator, TitleStore};
use crate::domain::{Checkpoint, RunOutcome};

/// cleantitle - Resumable title enrichment for a video catalog
#[derive(Parser, Debug)]
#[command(name = "cleantitle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .cleantitle/config.yaml in this or a parent directory)
    #[arg(long, global = true, env = "CLEANTITLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk the catalog and generate clean titles, resuming from the checkpoint
    Backfill(BackfillArgs),

    /// Show checkpoint and title store summary
    Status {
        /// Number of tags to list
        #[arg(short, long, default_value = "10")]
        tags: usize,
    },

    /// Show resolved configuration
    Config,
}

/// Overrides applied on top of the resolved configuration
#[derive(Args, Debug, Default)]
pub struct BackfillArgs {
    /// Channel whose uploads are traversed
    #[arg(long)]
    pub channel_id: Option<String>,

    /// Successful items between checkpoints
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Pause after each item, in milliseconds
    #[arg(long)]
    pub item_delay_ms: Option<u64>,

    /// Pause after each checkpoint, in milliseconds
    #[arg(long)]
    pub batch_delay_ms: Option<u64>,
}

impl BackfillArgs {
    /// Apply flag overrides to a resolved config
    pub fn apply(&self, cfg: &mut ResolvedConfig) {
        if let Some(channel_id) = &self.channel_id {
            cfg.catalog.channel_id = channel_id.clone();
        }
        if let Some(batch_size) = self.batch_size {
            cfg.pipeline.batch_size = batch_size;
        }
        if let Some(ms) = self.item_delay_ms {
            cfg.pipeline.item_delay_ms = ms;
        }
        if let Some(ms) = self.batch_delay_ms {
            cfg.pipeline.batch_delay_ms = ms;
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load_config(self.config.as_deref())?;

        match self.command {
            Commands::Backfill(args) => run_backfill(cfg, &args).await,
            Commands::Status { tags } => show_status(&cfg, tags).await,
            Commands::Config => show_config(&cfg),
        }
    }
}

/// Build the adapters from config and credentials, then run the backfill
async fn run_backfill(mut cfg: ResolvedConfig, args: &BackfillArgs) -> Result<()> {
    args.apply(&mut cfg);
    let creds = Credentials::from_env()?;

    let catalog = YouTubeCatalog::new(
        &creds.youtube_api_key,
        &cfg.catalog.channel_id,
        cfg.catalog.page_size,
    )
    .context("Failed to create catalog client")?;

    let transcripts = match &creds.proxy {
        Some(proxy) => {
            info!(proxy = %cfg.transcript.proxy_url, "Routing transcript requests through proxy");
            YouTubeTranscripts::with_proxy(
                &cfg.transcript.language,
                cfg.transcript.word_limit,
                &cfg.transcript.proxy_url,
                proxy,
            )?
        }
        None => {
            warn!("No proxy credentials; fetching transcripts directly");
            YouTubeTranscripts::new(&cfg.transcript.language, cfg.transcript.word_limit)?
        }
    };

    let model = AnthropicModel::new(
        &creds.anthropic_api_key,
        &cfg.generation.model,
        cfg.generation.max_tokens,
    )
    .context("Failed to create model client")?;
    let generator = TitleGenerator::new(Box::new(model), cfg.generator_settings()?);

    let orchestrator = BackfillOrchestrator::new(
        Box::new(catalog),
        Box::new(transcripts),
        generator,
        TitleStore::new(&cfg.titles_path),
        CheckpointStore::new(&cfg.checkpoint_path),
        cfg.pipeline.to_pipeline_settings(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current step");
            let _ = shutdown_tx.send(true);
        }
    });

    eprintln!("Backfilling channel {}", cfg.catalog.channel_id);
    eprintln!("  Titles:     {}", cfg.titles_path.display());
    eprintln!("  Checkpoint: {}", cfg.checkpoint_path.display());

    let report = orchestrator.run(shutdown_rx).await?;

    eprintln!();
    match &report.outcome {
        RunOutcome::Completed => {
            eprintln!("[Run {} completed]", report.run_id);
        }
        RunOutcome::Interrupted => {
            eprintln!("[Run {} interrupted; run again to resume]", report.run_id);
        }
        RunOutcome::Failed { error } => {
            eprintln!("[Run {} failed: {}]", report.run_id, error);
        }
    }
    eprintln!("  Pages fetched:    {}", report.stats.pages);
    eprintln!("  Enriched:         {}", report.stats.enriched);
    eprintln!("  Already stored:   {}", report.stats.already_stored);
    eprintln!("  Filtered:         {}", report.stats.filtered);
    eprintln!("  Failed:           {}", report.stats.failed);
    eprintln!("  Processed total:  {}", report.processed_total);
    eprintln!("  Titles in store:  {}", report.store_size);

    let code = report.outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

/// Show checkpoint position and store contents
async fn show_status(cfg: &ResolvedConfig, tag_limit: usize) -> Result<()> {
    let checkpoints = CheckpointStore::new(&cfg.checkpoint_path);
    let store = TitleStore::new(&cfg.titles_path);
    let checkpoint = checkpoints.load().await?;
    let titles = store.load().await?;

    println!("Checkpoint: {}", checkpoints.path().display());
    println!("  Position:        {}", describe_position(&checkpoint));
    println!("  Processed total: {}", checkpoint.processed_count);
    if let Some(updated) = checkpoint.updated_at {
        println!("  Updated:         {}", updated);
    }

    println!("\nTitles: {}", store.path().display());
    println!("  Entries: {}", titles.len());

    if titles.is_empty() || tag_limit == 0 {
        return Ok(());
    }

    let counts = tag_counts(titles.values().map(|r| r.tag.as_str()));
    println!("\n{:<30} {:>8}", "TAG", "COUNT");
    println!("{}", "-".repeat(39));
    for (tag, count) in counts.iter().take(tag_limit) {
        println!("{:<30} {:>8}", tag, count);
    }
    if counts.len() > tag_limit {
        println!("... and {} more", counts.len() - tag_limit);
    }

    Ok(())
}

/// Human-readable resume position of a checkpoint
fn describe_position(checkpoint: &Checkpoint) -> String {
    if checkpoint.is_fresh() {
        "not started".to_string()
    } else if checkpoint.complete {
        "complete (next run starts a new pass)".to_string()
    } else {
        match &checkpoint.cursor {
            Some(cursor) => format!("resume at page {}", cursor),
            None => "resume at first page".to_string(),
        }
    }
}

/// Count tags, most frequent first (ties alphabetical)
fn tag_counts<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in tags {
        *counts.entry(tag).or_default() += 1;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    sorted
}

/// Print the resolved configuration
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("cleantitle configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:       {}", cfg.home.display());
    println!("  Titles:     {}", cfg.titles_path.display());
    println!("  Checkpoint: {}", cfg.checkpoint_path.display());
    println!();
    println!("Catalog:");
    println!("  Channel:   {}", cfg.catalog.channel_id);
    println!("  Page size: {}", cfg.catalog.page_size);
    println!();
    println!("Generation:");
    println!("  Model:             {}", cfg.generation.model);
    println!("  Max tokens:        {}", cfg.generation.max_tokens);
    println!("  Description chars: {}", cfg.generation.description_char_limit);
    println!(
        "  Prompt:            {}",
        cfg.generation
            .prompt_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string())
    );
    println!("  Max attempts:      {}", cfg.generation.retry.max_attempts);
    println!("  Retry delay:       {}ms", cfg.generation.retry.delay_ms);
    println!();
    println!("Transcripts:");
    println!("  Language:   {}", cfg.transcript.language);
    println!("  Word limit: {}", cfg.transcript.word_limit);
    println!("  Proxy:      {}", cfg.transcript.proxy_url);
    println!();
    println!("Pacing:");
    println!("  Batch size:  {}", cfg.pipeline.batch_size);
    println!("  Item delay:  {}ms", cfg.pipeline.item_delay_ms);
    println!("  Batch delay: {}ms", cfg.pipeline.batch_delay_ms);
    println!();
    println!("Credentials:");
    for name in [
        config::ENV_ANTHROPIC_KEY,
        config::ENV_YOUTUBE_KEY,
        config::ENV_PROXY_USERNAME,
        config::ENV_PROXY_PASSWORD,
    ] {
        let set = std::env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false);
        println!("  {:<26} {}", name, if set { "set" } else { "not set" });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backfill_overrides() {
        let cli = Cli::try_parse_from([
            "cleantitle",
            "backfill",
            "--batch-size",
            "10",
            "--item-delay-ms",
            "0",
        ])
        .unwrap();

        match cli.command {
            Commands::Backfill(args) => {
                assert_eq!(args.batch_size, Some(10));
                assert_eq!(args.item_delay_ms, Some(0));
                assert_eq!(args.batch_delay_ms, None);
                assert_eq!(args.channel_id, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["cleantitle", "status", "--config", "/tmp/c.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert!(matches!(cli.command, Commands::Status { tags: 10 }));
    }

    #[test]
    fn test_describe_position() {
        use crate::domain::Cursor;

        assert_eq!(describe_position(&Checkpoint::fresh()), "not started");
        assert_eq!(
            describe_position(&Checkpoint::finished(12)),
            "complete (next run starts a new pass)"
        );
        assert_eq!(
            describe_position(&Checkpoint::at(Some(Cursor::new("CDIQAA")), 12)),
            "resume at page CDIQAA"
        );
        assert_eq!(
            describe_position(&Checkpoint::at(None, 12)),
            "resume at first page"
        );
    }

    #[test]
    fn test_tag_counts_sorted() {
        let counts = tag_counts(["Puzzle", "Opening", "Puzzle", "Endgame", "Opening", "Puzzle"].into_iter());
        assert_eq!(
            counts,
            vec![("Puzzle", 3), ("Opening", 2), ("Endgame", 1)]
        );
    }
}

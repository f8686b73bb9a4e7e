//! arXiv digest CLI - fetch, summarize and email recent papers on a daily schedule.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;

use arxiv_digest::arxiv::ArxivClient;
use arxiv_digest::config::DigestConfig;
use arxiv_digest::delivery::{Delivery, EmailDelivery, LogDelivery};
use arxiv_digest::fetcher::Fetcher;
use arxiv_digest::logging;
use arxiv_digest::runner::DigestRunner;
use arxiv_digest::scheduler::{Scheduler, DEFAULT_POLL_INTERVAL};
use arxiv_digest::summary::OpenAiSummarizer;

/// arXiv digest - daily email of new papers in your areas of interest.
#[derive(Parser)]
#[command(name = "arxiv-digest")]
#[command(about = "Daily arXiv paper digest by email")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to `schedule`, or a single run when TEST_MODE is on.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one digest now and exit
    Run {
        /// Days to look back (0 = today only); defaults per TEST_MODE
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Log the digest instead of emailing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the daily schedule until interrupted
    Schedule {
        /// Log digests instead of emailing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and print effective settings
    CheckConfig,

    /// Send a test email to the configured recipients
    SendTestEmail,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DigestConfig::from_env();
    let log_dir = config
        .as_ref()
        .ok()
        .map(|c| (c.log_dir.as_path(), c.log_retention_days));
    let _guard = logging::init(cli.verbose, log_dir)?;

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error");
            eprintln!("{} {e}", "Configuration error:".red().bold());
            eprintln!("  {}", e.remediation());
            std::process::exit(2);
        }
    };

    match cli.command {
        Some(Commands::Run {
            lookback_days,
            dry_run,
        }) => {
            let lookback = lookback_days.unwrap_or_else(|| config.default_lookback_days());
            run_once(&config, lookback, dry_run).await
        }
        Some(Commands::Schedule { dry_run }) => run_schedule(&config, dry_run).await,
        Some(Commands::CheckConfig) => {
            check_config(&config);
            Ok(())
        }
        Some(Commands::SendTestEmail) => send_test_email(&config).await,
        None if config.test_mode => run_once(&config, 0, false).await,
        None => run_schedule(&config, false).await,
    }
}

fn build_runner(config: &DigestConfig, dry_run: bool) -> Result<DigestRunner> {
    let source = ArxivClient::new(config.arxiv_api_url.clone())
        .context("Failed to create arXiv client")?;

    let mut fetcher = Fetcher::new(Arc::new(source), config.interest.clone())
        .with_summary_max_chars(config.summary_max_chars);
    if let Some(openai) = &config.openai {
        let summarizer = OpenAiSummarizer::new(openai.clone())
            .context("Failed to create OpenAI summarizer")?;
        tracing::info!(model = %openai.model, "Using OpenAI summaries");
        fetcher = fetcher.with_summarizer(Arc::new(summarizer));
    } else {
        tracing::info!("OPENAI_API_KEY not set, using abstract excerpts");
    }

    let delivery: Arc<dyn Delivery> = if dry_run {
        Arc::new(LogDelivery)
    } else {
        Arc::new(EmailDelivery::new(config.smtp.clone()))
    };

    Ok(DigestRunner::new(fetcher, delivery))
}

async fn run_once(config: &DigestConfig, lookback_days: u32, dry_run: bool) -> Result<()> {
    let runner = build_runner(config, dry_run)?;
    let outcome = runner.run(lookback_days).await;

    if let Some(err) = outcome.error {
        anyhow::bail!("digest run {} failed: {err}", outcome.run_id);
    }

    println!(
        "{} {} paper(s), {} abbreviated summary(ies)",
        "Digest delivered:".green().bold(),
        outcome.papers_found,
        outcome.degraded_summaries
    );
    Ok(())
}

async fn run_schedule(config: &DigestConfig, dry_run: bool) -> Result<()> {
    let runner = Arc::new(build_runner(config, dry_run)?);
    let mut scheduler = Scheduler::new(DEFAULT_POLL_INTERVAL);

    if config.test_mode {
        tracing::info!(
            interval_secs = config.test_interval.as_secs(),
            "Test mode: running today's papers now, then on a short interval"
        );
        runner.run(0).await;
    }

    let test_interval = config.test_mode.then_some(config.test_interval);
    scheduler.add_digest_jobs(&runner, config.schedule_time, test_interval, Local::now());

    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

fn check_config(config: &DigestConfig) {
    println!("{}", "arXiv digest configuration".bold());
    for (key, value) in config.describe() {
        println!("  {:<20} {}", key.cyan(), value);
    }
    println!("{}", "Configuration is valid.".green());
}

async fn send_test_email(config: &DigestConfig) -> Result<()> {
    println!("Sending test email to {}...", config.smtp.recipients.join(", "));
    EmailDelivery::new(config.smtp.clone())
        .send_test()
        .await
        .context("Failed to send test email")?;
    println!("{}", "Test email sent.".green());
    Ok(())
}

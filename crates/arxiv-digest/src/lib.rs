//! Daily arXiv digest service.
//!
//! This crate provides:
//! - An arXiv Atom API client and feed parser
//! - Interest filtering over a lookback window, with dedup and ordering
//! - Per-paper summaries (OpenAI chat completions with an extractive fallback)
//! - HTML and plain-text digest rendering with SMTP delivery
//! - A run orchestrator and a polling daily scheduler

pub mod arxiv;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod runner;
pub mod scheduler;
pub mod summary;

// Re-export main types
pub use arxiv::{ArxivClient, Paper, PaperSource};
pub use config::DigestConfig;
pub use delivery::{Delivery, DigestRenderer, EmailDelivery, LogDelivery, SmtpSettings};
pub use error::{ConfigError, DeliveryError, FetchError, RunError, SummaryError};
pub use fetcher::{Fetcher, InterestFilter, Window};
pub use runner::{DigestRunner, RunOutcome, RunPhase};
pub use scheduler::{DigestJob, Job, Scheduler, Trigger};
pub use summary::{OpenAiSummarizer, Summarizer, Summary};

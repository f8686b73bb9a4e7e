//! Configuration for the digest service.
//!
//! Loaded from environment variables (optionally via a `.env` file) and
//! validated before any run starts.

use chrono::NaiveTime;
use lettre::message::Mailbox;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::arxiv::DEFAULT_API_URL;
use crate::delivery::SmtpSettings;
use crate::error::ConfigError;
use crate::fetcher::InterestFilter;
use crate::summary::{OpenAiConfig, DEFAULT_MAX_CHARS};

/// Default SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default daily send time.
pub const DEFAULT_SCHEDULE_TIME: &str = "09:00";

/// Default categories when none are configured.
pub const DEFAULT_CATEGORIES: &str = "cs.AI,cs.LG,cs.CL";

/// Default cap on papers per digest.
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Default fast-interval period in test mode.
pub const DEFAULT_TEST_INTERVAL_SECS: u64 = 60;

/// Default number of daily log files kept.
pub const DEFAULT_LOG_RETENTION_DAYS: usize = 30;

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// SMTP settings and recipients.
    pub smtp: SmtpSettings,
    /// Papers of interest.
    pub interest: InterestFilter,
    /// arXiv API endpoint.
    pub arxiv_api_url: String,
    /// Local time of the daily run.
    pub schedule_time: NaiveTime,
    /// Diagnostic fast-interval mode.
    pub test_mode: bool,
    /// Period of fast-interval runs.
    pub test_interval: Duration,
    /// Bound on extractive summaries.
    pub summary_max_chars: usize,
    /// Generative summaries, if an API key is configured.
    pub openai: Option<OpenAiConfig>,
    /// Directory for daily log files.
    pub log_dir: PathBuf,
    /// Daily log files kept.
    pub log_retention_days: usize,
}

impl DigestConfig {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// # Required Environment Variables
    /// - `SMTP_USERNAME`: SMTP login
    /// - `SMTP_PASSWORD`: SMTP password (Gmail: app password)
    /// - `EMAIL_TO`: comma-separated recipients
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let username = required("SMTP_USERNAME")?;
        let password = required("SMTP_PASSWORD")?;
        let recipients = split_list(&required("EMAIL_TO")?);
        if recipients.is_empty() {
            return Err(ConfigError::Missing("EMAIL_TO"));
        }
        for recipient in &recipients {
            check_mailbox("EMAIL_TO", recipient)?;
        }
        let from = get("EMAIL_FROM").unwrap_or_else(|| username.clone());
        check_mailbox("EMAIL_FROM", &from)?;

        let port = match get("SMTP_PORT") {
            Some(raw) => parse_positive::<u16>("SMTP_PORT", &raw)?,
            None => DEFAULT_SMTP_PORT,
        };

        let categories = split_list(&get("ARXIV_CATEGORIES").unwrap_or_else(|| DEFAULT_CATEGORIES.to_string()));
        if categories.is_empty() {
            return Err(ConfigError::Invalid {
                var: "ARXIV_CATEGORIES",
                value: String::new(),
                reason: "at least one category is required".to_string(),
            });
        }
        let keywords = get("ARXIV_KEYWORDS").map(|v| split_list(&v)).unwrap_or_default();
        let max_results = match get("ARXIV_MAX_RESULTS") {
            Some(raw) => parse_positive::<usize>("ARXIV_MAX_RESULTS", &raw)?,
            None => DEFAULT_MAX_RESULTS,
        };

        let schedule_raw = get("SCHEDULE_TIME").unwrap_or_else(|| DEFAULT_SCHEDULE_TIME.to_string());
        let schedule_time = parse_schedule_time(&schedule_raw)?;

        let test_mode = match get("TEST_MODE") {
            Some(raw) => parse_bool("TEST_MODE", &raw)?,
            None => false,
        };
        let test_interval = match get("TEST_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_positive::<u64>("TEST_INTERVAL_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_TEST_INTERVAL_SECS),
        };

        let summary_max_chars = match get("SUMMARY_MAX_CHARS") {
            Some(raw) => parse_positive::<usize>("SUMMARY_MAX_CHARS", &raw)?,
            None => DEFAULT_MAX_CHARS,
        };

        let openai = get("OPENAI_API_KEY").map(|key| {
            let mut cfg = OpenAiConfig::new(key);
            if let Some(model) = get("OPENAI_MODEL") {
                cfg = cfg.with_model(model);
            }
            if let Some(url) = get("OPENAI_BASE_URL") {
                cfg = cfg.with_base_url(url);
            }
            cfg
        });

        let log_retention_days = match get("LOG_RETENTION_DAYS") {
            Some(raw) => parse_positive::<usize>("LOG_RETENTION_DAYS", &raw)?,
            None => DEFAULT_LOG_RETENTION_DAYS,
        };

        Ok(Self {
            smtp: SmtpSettings {
                host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port,
                username,
                password,
                from,
                recipients,
            },
            interest: InterestFilter {
                categories,
                keywords,
                max_results,
            },
            arxiv_api_url: get("ARXIV_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            schedule_time,
            test_mode,
            test_interval,
            summary_max_chars,
            openai,
            log_dir: PathBuf::from(get("LOG_DIR").unwrap_or_else(|| "logs".to_string())),
            log_retention_days,
        })
    }

    /// Lookback for manual runs: today only in test mode, else one day.
    #[must_use]
    pub fn default_lookback_days(&self) -> u32 {
        if self.test_mode {
            0
        } else {
            1
        }
    }

    /// Effective settings for display, secrets masked.
    #[must_use]
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SMTP_HOST", format!("{}:{}", self.smtp.host, self.smtp.port)),
            ("SMTP_USERNAME", self.smtp.username.clone()),
            ("SMTP_PASSWORD", mask(&self.smtp.password)),
            ("EMAIL_FROM", self.smtp.from.clone()),
            ("EMAIL_TO", self.smtp.recipients.join(", ")),
            ("ARXIV_CATEGORIES", self.interest.categories.join(", ")),
            (
                "ARXIV_KEYWORDS",
                if self.interest.keywords.is_empty() {
                    "<any>".to_string()
                } else {
                    self.interest.keywords.join(", ")
                },
            ),
            ("ARXIV_MAX_RESULTS", self.interest.max_results.to_string()),
            ("SCHEDULE_TIME", self.schedule_time.format("%H:%M").to_string()),
            ("TEST_MODE", self.test_mode.to_string()),
            (
                "OPENAI_API_KEY",
                self.openai
                    .as_ref()
                    .map_or_else(|| "<not set>".to_string(), |o| mask(&o.api_key)),
            ),
            ("LOG_DIR", self.log_dir.display().to_string()),
        ]
    }

    /// Environment-derived map for tests and tooling.
    #[must_use]
    pub fn lookup_from_map(map: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
        move |key: &str| map.get(key).cloned()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn check_mailbox(var: &'static str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value: T = raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Parse `HH:MM` (24h).
pub fn parse_schedule_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    let invalid = || ConfigError::Invalid {
        var: "SCHEDULE_TIME",
        value: raw.to_string(),
        reason: "expected HH:MM in 24-hour time".to_string(),
    };
    let (h, m) = raw.split_once(':').ok_or_else(invalid)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

fn mask(secret: &str) -> String {
    let shown: String = secret.chars().take(3).collect();
    format!("{shown}...({} chars)", secret.chars().count())
}

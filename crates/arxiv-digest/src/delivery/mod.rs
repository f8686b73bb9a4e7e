//! Digest delivery.
//!
//! - [`Delivery`] is the seam the runner hands each finished batch to
//! - [`EmailDelivery`] renders and sends the digest over SMTP
//! - [`LogDelivery`] renders the plain-text digest into the log (dry runs)

mod email;
mod render;

pub use email::{EmailDelivery, SmtpSettings};
pub use render::{DigestRenderer, RenderedDigest};

use async_trait::async_trait;
use chrono::Utc;

use crate::arxiv::Paper;
use crate::error::DeliveryError;
use crate::summary::Summary;

/// Sends one digest per run.
///
/// Implementations must render a coherent message for empty input.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver `papers` with their summaries (same length, same order).
    async fn send(&self, papers: &[Paper], summaries: &[Summary]) -> Result<(), DeliveryError>;
}

/// Writes the rendered digest to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, papers: &[Paper], summaries: &[Summary]) -> Result<(), DeliveryError> {
        let digest = DigestRenderer::render(papers, summaries, Utc::now())?;
        tracing::info!(subject = %digest.subject, "Dry run, digest not sent");
        for line in digest.text.lines() {
            tracing::info!("{line}");
        }
        Ok(())
    }
}

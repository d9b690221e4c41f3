pub mod job;
pub mod renderer;
pub mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{RankedEntry, ReportOutcome};

pub use job::DailyReportJob;
pub use renderer::TextTableRenderer;
pub use telegram::{NullReportSender, TelegramConfig, TelegramSender};

/// Turns a ranked list into a document. Pure; no I/O.
pub trait ReportRenderer: Send + Sync {
    fn render(&self, entries: &[RankedEntry], as_of: DateTime<Utc>) -> Vec<u8>;
}

/// Delivery channel for a rendered report document.
#[async_trait]
pub trait ReportSender: Send + Sync {
    async fn send_document(&self, document: Vec<u8>, filename: &str, caption: &str) -> Result<()>;
}

/// One report execution, invocable by the scheduler or on demand.
///
/// Calling it twice produces two deliveries; it re-reads current state each
/// time and is never an error to repeat.
#[async_trait]
pub trait ReportRunner: Send + Sync {
    async fn run_once(&self) -> Result<ReportOutcome>;
}

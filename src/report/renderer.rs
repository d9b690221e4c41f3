use chrono::{DateTime, Utc};

use crate::domain::RankedEntry;
use crate::report::ReportRenderer;

/// Renders the ranking as a plain-text table: rank, title, author, score,
/// comments, with a dated header and a generated-at footer.
#[derive(Debug, Default)]
pub struct TextTableRenderer;

impl TextTableRenderer {
    pub fn new() -> Self {
        Self
    }
}

const TITLE_WIDTH: usize = 48;
const AUTHOR_WIDTH: usize = 20;

fn truncate_pad(s: &str, width: usize) -> String {
    let truncated: String = s.chars().take(width).collect();
    format!("{truncated:<width$}")
}

impl ReportRenderer for TextTableRenderer {
    fn render(&self, entries: &[RankedEntry], as_of: DateTime<Utc>) -> Vec<u8> {
        let mut out = String::new();

        out.push_str(&format!(
            "Daily Meme Report - {}\n\n",
            as_of.format("%Y-%m-%d")
        ));
        out.push_str(&format!(
            "{:>4}  {}  {}  {:>8}  {:>8}\n",
            "#",
            truncate_pad("Title", TITLE_WIDTH),
            truncate_pad("Author", AUTHOR_WIDTH),
            "Score",
            "Comments"
        ));
        out.push_str(&format!(
            "{}\n",
            "-".repeat(4 + 2 + TITLE_WIDTH + 2 + AUTHOR_WIDTH + 2 + 8 + 2 + 8)
        ));

        for (rank, entry) in entries.iter().enumerate() {
            out.push_str(&format!(
                "{:>4}  {}  {}  {:>8}  {:>8}\n",
                rank + 1,
                truncate_pad(&entry.title, TITLE_WIDTH),
                truncate_pad(&entry.author, AUTHOR_WIDTH),
                entry.score,
                entry.comment_count
            ));
        }

        if entries.is_empty() {
            out.push_str("(no items observed in the last 24 hours)\n");
        }

        out.push_str(&format!(
            "\nGenerated at {} UTC\n",
            as_of.format("%Y-%m-%d %H:%M")
        ));

        out.into_bytes()
    }
}

//! Structured reporting for index builds.

use serde::{Deserialize, Serialize};

use crate::crawl::DiscoverySource;

/// Summary of one [`build_index`](crate::builder::build_index) call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub tool: String,
    /// `None` when the cached index was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DiscoverySource>,
    pub cache_used: bool,
    /// Paths returned by discovery.
    pub discovered: usize,
    /// Entries with parsed help.
    pub indexed: usize,
    /// Entries kept for on-demand parsing.
    pub pending: usize,
    /// Paths whose help turned out to be a group listing.
    pub skipped_groups: usize,
    /// Paths kept without help because every track failed.
    pub minimal: usize,
    pub warnings: Vec<String>,
}

impl BuildReport {
    /// One-line human summary.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdgen_discovery::report::BuildReport;
    ///
    /// let report = BuildReport {
    ///     tool: "gcloud".to_string(),
    ///     cache_used: true,
    ///     indexed: 12,
    ///     pending: 3,
    ///     ..BuildReport::default()
    /// };
    /// assert_eq!(report.summary_line(), "gcloud: 12 indexed, 3 pending (cached)");
    /// ```
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{}: {} indexed, {} pending",
            self.tool, self.indexed, self.pending
        );
        match self.source {
            Some(source) => {
                line.push_str(&format!(" ({} paths via {source}", self.discovered));
                if self.skipped_groups > 0 {
                    line.push_str(&format!(", {} groups skipped", self.skipped_groups));
                }
                if self.minimal > 0 {
                    line.push_str(&format!(", {} without help", self.minimal));
                }
                line.push(')');
            }
            None if self.cache_used => line.push_str(" (cached)"),
            None => {}
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_for_fresh_build() {
        let report = BuildReport {
            tool: "gcloud".to_string(),
            source: Some(DiscoverySource::HelpCrawl),
            discovered: 10,
            indexed: 7,
            pending: 1,
            skipped_groups: 2,
            minimal: 1,
            ..BuildReport::default()
        };
        assert_eq!(
            report.summary_line(),
            "gcloud: 7 indexed, 1 pending (10 paths via help-crawl, 2 groups skipped, 1 without help)"
        );
    }

    #[test]
    fn test_report_serializes_source_snake_case() {
        let report = BuildReport {
            source: Some(DiscoverySource::ListCommands),
            ..BuildReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "list_commands");
    }
}

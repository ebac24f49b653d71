//! Plain-text report of per-package diffs

use std::collections::BTreeMap;

use crate::orchestrator::parallel::PackageDiff;

/// Width of the separator lines around each package title
pub const REPORT_WIDTH: usize = 80;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Renders one section per package in name order. Empty input gives an empty report.
    pub fn generate(&self, results: &BTreeMap<String, PackageDiff>) -> String {
        let sections: Vec<String> = results
            .iter()
            .map(|(name, result)| {
                let body = match result {
                    PackageDiff::Diff(diff) => diff.trim_end_matches('\n').to_string(),
                    PackageDiff::Error(message) => format!("Error: {message}"),
                };
                format!("{}\n{}", header(name), body)
            })
            .collect();

        sections.join("\n\n")
    }
}

fn header(package_name: &str) -> String {
    let separator = "=".repeat(REPORT_WIDTH);
    let title = format!(" DIFF FOR PACKAGE: {} ", package_name.to_uppercase());
    let title_len = title.chars().count();
    let left = REPORT_WIDTH.saturating_sub(title_len) / 2;
    let right = REPORT_WIDTH.saturating_sub(left + title_len);

    format!(
        "{separator}\n{}{title}{}\n{separator}",
        "=".repeat(left),
        "=".repeat(right)
    )
}

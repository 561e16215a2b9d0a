use anyhow::{Context, Result};
use regex::Regex;

/// Assert that a string contains another string
pub fn assert_contains(haystack: &str, needle: &str, message: &str) -> Result<()> {
    if !haystack.contains(needle) {
        anyhow::bail!(
            "{}\nExpected to contain: '{}'\nActual: '{}'",
            message,
            needle,
            haystack
        );
    }
    Ok(())
}

/// Assert that a string does not contain another string
pub fn assert_not_contains(haystack: &str, needle: &str, message: &str) -> Result<()> {
    if haystack.contains(needle) {
        anyhow::bail!(
            "{}\nExpected NOT to contain: '{}'\nActual: '{}'",
            message,
            needle,
            haystack
        );
    }
    Ok(())
}

/// Assert that a string matches a regex pattern
pub fn assert_matches(text: &str, pattern: &str, message: &str) -> Result<()> {
    let re = Regex::new(pattern).context("Invalid regex pattern")?;
    if !re.is_match(text) {
        anyhow::bail!(
            "{}\nExpected to match pattern: '{}'\nActual: '{}'",
            message,
            pattern,
            text
        );
    }
    Ok(())
}

/// Assert that a file exists
pub fn assert_file_exists(path: &std::path::Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Assert that a file contains text
pub fn assert_file_contains(path: &std::path::Path, text: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    if !content.contains(text) {
        anyhow::bail!(
            "File {} does not contain expected text: '{}'",
            path.display(),
            text
        );
    }

    Ok(())
}

/// Assert the relay tally of a publish report
pub fn assert_report(
    report: &crate::helpers::ReportOutput,
    succeeded: usize,
    total: usize,
) -> Result<()> {
    if report.succeeded != succeeded || report.total != total {
        anyhow::bail!(
            "Report mismatch. Expected: {}/{}, Got: {}/{} ({:?})",
            succeeded,
            total,
            report.succeeded,
            report.total,
            report.relays
        );
    }
    if report.relays.len() != total {
        anyhow::bail!(
            "Expected one result per relay ({}), got {}",
            total,
            report.relays.len()
        );
    }
    Ok(())
}

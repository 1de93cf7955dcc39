//! Report assembly and persisted outputs.
//!
//! A report is one text document plus a `found` flag. Locations with
//! qualifying days come first, newest latest-day first; locations without
//! any follow in input order, then the booking footer.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::CheckError;
use crate::slots::LocationSummary;

pub const SUMMARY_FILE: &str = "summary.txt";
pub const FOUND_FILE: &str = "found";

/// Rendered text for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationBlock {
    pub text: String,
    /// Most recent qualifying date; `None` for label-only blocks.
    pub latest: Option<NaiveDateTime>,
}

impl LocationBlock {
    pub fn from_summary(label: &str, summary: &LocationSummary) -> Self {
        if summary.is_empty() {
            return Self::label_only(label);
        }
        let mut text = format!("**{}**\n", label);
        text.push_str(&summary.lines().join("\n"));
        text.push('\n');
        Self {
            text,
            latest: summary.latest(),
        }
    }

    /// Header without lines, used when a location has nothing to show.
    pub fn label_only(label: &str) -> Self {
        Self {
            text: format!("**{}**\n", label),
            latest: None,
        }
    }
}

/// Final document and flag for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub summary: String,
    pub found: bool,
}

impl Report {
    /// Combine per-location blocks, given in input order.
    pub fn assemble(blocks: Vec<LocationBlock>, footer: &str) -> Self {
        let (mut dated, undated): (Vec<LocationBlock>, Vec<LocationBlock>) =
            blocks.into_iter().partition(|b| b.latest.is_some());
        let found = !dated.is_empty();

        // Stable, so equal dates keep input order.
        dated.sort_by(|a, b| b.latest.cmp(&a.latest));

        let join = |blocks: &[LocationBlock]| {
            blocks
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
                .trim_end()
                .to_string()
        };

        let mut parts: Vec<String> = Vec::new();
        if !dated.is_empty() {
            parts.push(join(&dated));
        }
        if !undated.is_empty() {
            parts.push(join(&undated));
        }
        parts.push(footer.to_string());

        let mut summary = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim_end()
            .to_string();
        summary.push('\n');

        Report { summary, found }
    }

    /// Short-circuit report for a run that could not start.
    pub fn configuration_error(err: &CheckError) -> Self {
        Report {
            summary: format!("{}\n", err),
            found: false,
        }
    }

    pub fn persist(&self, sink: &mut dyn ReportSink) -> Result<(), CheckError> {
        sink.write_found(self.found)?;
        sink.write_summary(&self.summary)?;
        Ok(())
    }
}

/// Footer line pointing at the booking site.
pub fn footer(origin: &str) -> String {
    format!("Book an appointment: {}/", origin.trim_end_matches('/'))
}

/// Where the summary and flag go.
pub trait ReportSink {
    fn write_summary(&mut self, summary: &str) -> Result<(), CheckError>;
    fn write_found(&mut self, found: bool) -> Result<(), CheckError>;
}

/// Writes `summary.txt` and `found` under a directory, overwriting both.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, file: &str, contents: &str) -> Result<(), CheckError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        fs::write(&path, contents)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl ReportSink for DirectorySink {
    fn write_summary(&mut self, summary: &str) -> Result<(), CheckError> {
        self.write(SUMMARY_FILE, summary)
    }

    fn write_found(&mut self, found: bool) -> Result<(), CheckError> {
        self.write(FOUND_FILE, if found { "true" } else { "false" })
    }
}

/// Keeps outputs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub summary: Option<String>,
    pub found: Option<bool>,
}

impl ReportSink for MemorySink {
    fn write_summary(&mut self, summary: &str) -> Result<(), CheckError> {
        self.summary = Some(summary.to_string());
        Ok(())
    }

    fn write_found(&mut self, found: bool) -> Result<(), CheckError> {
        self.found = Some(found);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::{DaySummary, MergedRange};

    fn summary_on(dates: &[&str]) -> LocationSummary {
        LocationSummary {
            days: dates
                .iter()
                .map(|d| DaySummary {
                    date: NaiveDateTime::parse_from_str(
                        &format!("{}T00:00:00", d),
                        "%Y-%m-%dT%H:%M:%S",
                    )
                    .unwrap(),
                    ranges: vec![MergedRange::new(600, 630)],
                })
                .collect(),
        }
    }

    const FOOTER: &str = "Book an appointment: https://book.example.com/";

    #[test]
    fn test_block_rendering() {
        let block = LocationBlock::from_summary("Bethpage (22)", &summary_on(&["2025-09-18"]));
        assert_eq!(
            block.text,
            "**Bethpage (22)**\n- 2025-09-18 (Thursday): 10:00-10:30\n"
        );
        assert!(block.latest.is_some());
    }

    #[test]
    fn test_empty_summary_is_label_only() {
        let block = LocationBlock::from_summary("29", &LocationSummary::default());
        assert_eq!(block, LocationBlock::label_only("29"));
        assert_eq!(block.text, "**29**\n");
    }

    #[test]
    fn test_assemble_orders_by_latest_then_undated() {
        let blocks = vec![
            LocationBlock::label_only("Bethpage (22)"),
            LocationBlock::from_summary("29", &summary_on(&["2025-09-18"])),
            LocationBlock::from_summary("33", &summary_on(&["2025-09-20", "2025-09-19"])),
            LocationBlock::label_only("19"),
        ];
        let report = Report::assemble(blocks, FOOTER);

        assert!(report.found);
        assert_eq!(
            report.summary,
            "**33**\n\
             - 2025-09-20 (Saturday): 10:00-10:30\n\
             - 2025-09-19 (Friday): 10:00-10:30\n\
             \n\
             **29**\n\
             - 2025-09-18 (Thursday): 10:00-10:30\n\
             \n\
             **Bethpage (22)**\n\
             \n\
             **19**\n\
             \n\
             Book an appointment: https://book.example.com/\n"
        );
    }

    #[test]
    fn test_assemble_nothing_found() {
        let report = Report::assemble(vec![LocationBlock::label_only("22")], FOOTER);
        assert!(!report.found);
        assert_eq!(
            report.summary,
            "**22**\n\nBook an appointment: https://book.example.com/\n"
        );
    }

    #[test]
    fn test_assemble_ties_keep_input_order() {
        let blocks = vec![
            LocationBlock::from_summary("A", &summary_on(&["2025-09-18"])),
            LocationBlock::from_summary("B", &summary_on(&["2025-09-18"])),
        ];
        let report = Report::assemble(blocks, FOOTER);
        let a = report.summary.find("**A**").unwrap();
        let b = report.summary.find("**B**").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_assemble_with_no_blocks_is_footer_only() {
        let report = Report::assemble(Vec::new(), FOOTER);
        assert_eq!(report.summary, format!("{}\n", FOOTER));
        assert!(!report.found);
    }

    #[test]
    fn test_footer_normalizes_trailing_slash() {
        assert_eq!(footer("https://x.example/"), "Book an appointment: https://x.example/");
        assert_eq!(footer("https://x.example"), "Book an appointment: https://x.example/");
    }

    #[test]
    fn test_configuration_error_report() {
        let report = Report::configuration_error(&CheckError::MissingConfiguration);
        assert_eq!(report.summary, "Missing BEARER_TOKEN or LOCATION_IDS\n");
        assert!(!report.found);
    }

    #[test]
    fn test_directory_sink_overwrites_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("nested").join(".availability");
        let mut sink = DirectorySink::new(&out);

        let first = Report {
            summary: "first, longer summary\n".to_string(),
            found: true,
        };
        first.persist(&mut sink).expect("persist");
        let second = Report {
            summary: "second\n".to_string(),
            found: false,
        };
        second.persist(&mut sink).expect("persist");

        assert_eq!(fs::read_to_string(out.join(SUMMARY_FILE)).unwrap(), "second\n");
        assert_eq!(fs::read_to_string(out.join(FOUND_FILE)).unwrap(), "false");
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::default();
        Report {
            summary: "x\n".to_string(),
            found: true,
        }
        .persist(&mut sink)
        .unwrap();
        assert_eq!(sink.summary.as_deref(), Some("x\n"));
        assert_eq!(sink.found, Some(true));
    }
}

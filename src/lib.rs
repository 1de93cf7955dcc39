//! Appointment availability checker.
//!
//! One run: fetch each configured location in order, filter and merge its
//! open slots, assemble a single summary, persist it with a `found` flag,
//! and optionally post it to a webhook. Every per-location and notification
//! failure degrades to fewer results; only output writes can fail a run.

pub mod availability;
pub mod config;
pub mod error;
pub mod notification;
pub mod parse;
pub mod report;
pub mod slots;

use availability::AvailabilitySource;
use config::Settings;
use error::CheckError;
use notification::Notifier;
use report::{LocationBlock, Report, ReportSink};

/// Run one availability check end to end.
///
/// Locations are fetched sequentially in input order. The notifier is only
/// called when something was found, and its errors are logged and dropped.
pub async fn check_availability(
    settings: &Settings,
    source: &dyn AvailabilitySource,
    sink: &mut dyn ReportSink,
    notifier: Option<&dyn Notifier>,
) -> Result<Report, CheckError> {
    let mut blocks = Vec::with_capacity(settings.location_ids.len());

    for location_id in &settings.location_ids {
        let label = settings.location_label(location_id);
        let block = match source.fetch(location_id).await {
            Ok(response) => {
                let summary = slots::summarize(&response, &settings.filters, settings.now);
                log::info!(
                    "Location {}: {} qualifying day(s)",
                    location_id,
                    summary.days.len()
                );
                LocationBlock::from_summary(&label, &summary)
            }
            Err(e) => {
                log::warn!(
                    "Location {}: no data ({}). {}",
                    location_id,
                    e,
                    e.recovery_suggestion()
                );
                LocationBlock::label_only(&label)
            }
        };
        blocks.push(block);
    }

    let report = Report::assemble(blocks, &report::footer(&settings.api.origin));
    report.persist(sink)?;
    log::info!("Availability found: {}", report.found);

    if report.found {
        if let Some(notifier) = notifier {
            match notifier.notify(&report.summary).await {
                Ok(()) => log::info!("Webhook notification sent"),
                Err(e) => log::warn!("Webhook notification failed: {}", e),
            }
        }
    }

    Ok(report)
}

/// Persist the short-circuit report for settings that could not be loaded.
pub fn report_configuration_error(
    err: &CheckError,
    sink: &mut dyn ReportSink,
) -> Result<Report, CheckError> {
    log::warn!("{} {}", err, err.recovery_suggestion());
    let report = Report::configuration_error(err);
    report.persist(sink)?;
    Ok(report)
}

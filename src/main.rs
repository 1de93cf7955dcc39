//! slotwatch: one-shot appointment availability check.
//!
//! Reads settings from the environment (and a `.env` file when present),
//! writes `summary.txt` and `found` to the output directory, and echoes the
//! summary on stdout. Meant to be run on a schedule by cron or CI.

use std::io::Write;

use slotwatch_lib::availability::client::AvailabilityClient;
use slotwatch_lib::config::{self, Settings};
use slotwatch_lib::notification::{Notifier, WebhookNotifier};
use slotwatch_lib::report::DirectorySink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Process environment wins over .env values.
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut sink = DirectorySink::new(config::output_dir(&config::env_var));

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) if e.is_configuration() => {
            let report = slotwatch_lib::report_configuration_error(&e, &mut sink)?;
            print_summary(&report.summary)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    log::info!(
        "Checking {} location(s), writing to {}",
        settings.location_ids.len(),
        sink.dir().display()
    );

    let source = match AvailabilityClient::new(settings.api.clone()) {
        Ok(client) => client,
        Err(e) if e.is_configuration() => {
            let report = slotwatch_lib::report_configuration_error(&e, &mut sink)?;
            print_summary(&report.summary)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let notifier = match settings.webhook.clone().map(WebhookNotifier::new).transpose() {
        Ok(notifier) => notifier,
        Err(e) => {
            log::warn!("Webhook disabled: {}", e);
            None
        }
    };

    let report = slotwatch_lib::check_availability(
        &settings,
        &source,
        &mut sink,
        notifier.as_ref().map(|n| n as &dyn Notifier),
    )
    .await?;

    print_summary(&report.summary)?;
    Ok(())
}

fn print_summary(summary: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(summary.as_bytes())?;
    stdout.flush()
}

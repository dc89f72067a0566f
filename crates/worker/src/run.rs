use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use trends_core::config::Settings;
use trends_core::delivery::Mailer;
use trends_core::domain::period::Period;
use trends_core::fetch::http::HttpTrendsSource;
use trends_core::fetch::{collect_bundle, load_bundle_file};
use trends_core::report::{self, ReportOptions};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub period: Period,
    pub send_email: bool,
    pub include_charts: bool,
    /// Offline input; skips the trends provider entirely.
    pub bundle_path: Option<PathBuf>,
}

/// One report cycle: fetch, assemble, and optionally email.
///
/// Delivery problems are logged but never fail a run whose report was written.
pub async fn generate_and_send_report(
    settings: &Settings,
    opts: &RunOptions,
) -> anyhow::Result<PathBuf> {
    tracing::info!(report_type = %opts.period, "generating report");
    let now = Local::now();

    let bundle = match &opts.bundle_path {
        Some(path) => load_bundle_file(path)?,
        None => {
            let source = HttpTrendsSource::from_settings(settings)?;
            collect_bundle(&source, &settings.regions, &settings.keywords, now.date_naive())
                .await
                .context("no trends data could be retrieved")?
        }
    };

    let report_options = ReportOptions {
        output_dir: settings.output_dir.clone(),
        include_charts: settings.include_charts && opts.include_charts,
    };
    let generated_at = now.naive_local();
    let path = tokio::task::spawn_blocking(move || {
        report::assemble(&bundle, &report_options, generated_at)
    })
    .await
    .context("report assembly task panicked")??;

    if opts.send_email {
        deliver(settings, &path, opts.period).await;
    } else {
        tracing::info!("email delivery disabled for this run");
    }

    tracing::info!(report_type = %opts.period, path = %path.display(), "report generated");
    Ok(path)
}

async fn deliver(settings: &Settings, path: &std::path::Path, period: Period) {
    let mailer = match Mailer::from_settings(settings) {
        Ok(Some(mailer)) => mailer,
        Ok(None) => {
            tracing::info!("email delivery skipped: EMAIL_SENDER, EMAIL_PASSWORD and EMAIL_RECIPIENT are required");
            return;
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "email configuration invalid; report not sent");
            return;
        }
    };

    if let Err(err) = mailer.send_report(path, period).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "report email failed");
    }
}

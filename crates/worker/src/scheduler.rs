use crate::run::{self, RunOptions};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use trends_core::config::Settings;
use trends_core::domain::period::Period;
use trends_core::schedule::Schedule;

const TICK: Duration = Duration::from_secs(60);

/// Runs until Ctrl-C. Each due report is generated on its own task; runs share no state.
pub async fn run_scheduler(settings: Settings, base: RunOptions) -> anyhow::Result<()> {
    let schedule = Schedule::from_settings(&settings);
    let settings = Arc::new(settings);

    let mut prev = Local::now().naive_local();
    for period in Period::ALL {
        if let Some(next) = schedule.next_run(period, prev) {
            tracing::info!(report_type = %period, next_run = %next, "report scheduled");
        }
    }
    tracing::info!("scheduler started; press Ctrl+C to exit");

    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Local::now().naive_local();
                for period in schedule.due_reports(prev, now) {
                    spawn_report(
                        Arc::clone(&settings),
                        RunOptions { period, ..base.clone() },
                    );
                }
                prev = now;
            }
            _ = shutdown_signal() => {
                tracing::info!("scheduler stopped");
                return Ok(());
            }
        }
    }
}

fn spawn_report(settings: Arc<Settings>, opts: RunOptions) {
    tokio::spawn(async move {
        match run::generate_and_send_report(&settings, &opts).await {
            Ok(path) => {
                tracing::info!(report_type = %opts.period, path = %path.display(), "scheduled report finished");
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(report_type = %opts.period, error = %format!("{err:#}"), "scheduled report failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

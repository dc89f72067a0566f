use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trends_core::config::Settings;
use trends_core::domain::period::Period;

mod run;
mod scheduler;

#[derive(Debug, Parser)]
#[command(name = "trends_worker", about = "Search trends spreadsheet reports")]
struct Args {
    /// Report type to generate: daily, weekly or monthly.
    #[arg(long, default_value = "daily")]
    report_type: Period,

    /// Write the report but do not email it.
    #[arg(long)]
    no_email: bool,

    /// Keep running and generate reports on the configured schedule.
    #[arg(long, conflicts_with = "bundle")]
    schedule: bool,

    /// Build the report from a bundle JSON file instead of querying the trends provider.
    #[arg(long)]
    bundle: Option<PathBuf>,

    #[arg(long)]
    no_charts: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --help must not depend on the environment.
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let opts = run::RunOptions {
        period: args.report_type,
        send_email: !args.no_email,
        include_charts: !args.no_charts,
        bundle_path: args.bundle,
    };

    if args.schedule {
        return scheduler::run_scheduler(settings, opts).await;
    }

    match run::generate_and_send_report(&settings, &opts).await {
        Ok(path) => {
            tracing::info!(report_type = %opts.period, path = %path.display(), "report run succeeded");
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(report_type = %opts.period, error = %format!("{err:#}"), "report run failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

use tokio::time::MissedTickBehavior;
use tracing::info;

use tickerwatch_core::{CycleOutcome, RefreshInterval, WatchDashboard};

use crate::cli::{Cli, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Refresh loop. The first cycle runs immediately; Ctrl-C stops the loop and
/// abandons a cycle that is still in flight.
pub async fn run(cli: &Cli, args: &WatchArgs, dashboard: &WatchDashboard) -> Result<(), CliError> {
    let refresh = RefreshInterval::from_secs(args.refresh_secs)?;
    let mut ticker = tokio::time::interval(refresh.as_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        tickers = %args.tickers,
        refresh_secs = refresh.as_secs(),
        "watching"
    );

    loop {
        let outcome = tokio::select! {
            outcome = async {
                ticker.tick().await;
                dashboard.refresh(&args.tickers).await
            } => outcome,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(());
            }
        };

        match outcome {
            CycleOutcome::Completed(snapshot) => {
                output::print_snapshot(&snapshot, cli.format, cli.pretty)?;
            }
            CycleOutcome::Superseded { cycle } => {
                info!(cycle, "skipping output of superseded cycle");
            }
        }

        if args.once {
            return Ok(());
        }
    }
}

mod detail;
mod watch;

use std::sync::Arc;
use std::time::Duration;

use tickerwatch_core::{
    DashboardConfig, HistoryWindow, ReqwestHttpClient, SeriesSelector, WatchDashboard,
    YahooProvider,
};

use crate::cli::{Cli, Command, SeriesArg, WatchArgs};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Watch(args) => {
            let dashboard = build_dashboard(cli, watch_config(cli, args)?)?;
            watch::run(cli, args, &dashboard).await
        }
        Command::Detail(args) => {
            let dashboard = build_dashboard(cli, base_config(cli))?;
            detail::run(cli, args, &dashboard).await
        }
    }
}

fn base_config(cli: &Cli) -> DashboardConfig {
    DashboardConfig {
        cache_ttl: Duration::from_secs(cli.cache_ttl_secs),
        fetch_timeout: Duration::from_millis(cli.timeout_ms),
        concurrency: cli.concurrency,
        ..DashboardConfig::default()
    }
}

fn watch_config(cli: &Cli, args: &WatchArgs) -> Result<DashboardConfig, CliError> {
    Ok(DashboardConfig {
        show_chart: !args.no_chart,
        history_window: HistoryWindow::minutes(args.history_minutes)?,
        series: match args.series {
            SeriesArg::Close => SeriesSelector::Close,
            SeriesArg::CloseOpen => SeriesSelector::CloseAndOpen,
        },
        ..base_config(cli)
    })
}

fn build_dashboard(cli: &Cli, config: DashboardConfig) -> Result<WatchDashboard, CliError> {
    let provider = YahooProvider::new(Arc::new(ReqwestHttpClient::default()))
        .with_timeout_ms(cli.timeout_ms);
    Ok(WatchDashboard::new(Arc::new(provider), config)?)
}

use tickerwatch_core::{HistoryWindow, TickerSymbol, WatchDashboard};

use crate::cli::{Cli, DetailArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(cli: &Cli, args: &DetailArgs, dashboard: &WatchDashboard) -> Result<(), CliError> {
    let symbol = TickerSymbol::parse(&args.ticker)?;
    let window = HistoryWindow::days(args.days)?;

    let detail = dashboard.detail(&symbol, window).await;
    output::print_detail(&detail, cli.format, cli.pretty)
}

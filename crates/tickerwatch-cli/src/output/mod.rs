//! Snapshot rendering for the terminal.
//!
//! Absent values print as `N/A`, never as zero or blank.

use std::io::{self, Write};

use serde::Serialize;
use tickerwatch_core::metrics::{format_count, format_percent, format_price};
use tickerwatch_core::{
    ChartData, TickerChart, TickerDetail, WatchRow, WatchSnapshot, NOT_AVAILABLE,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn print_snapshot(
    snapshot: &WatchSnapshot,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, snapshot, pretty)?,
        OutputFormat::Table => write_snapshot_table(&mut out, snapshot)?,
    }
    out.flush()?;
    Ok(())
}

pub fn print_detail(
    detail: &TickerDetail,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, detail, pretty)?,
        OutputFormat::Table => write_detail_table(&mut out, detail)?,
    }
    out.flush()?;
    Ok(())
}

fn write_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_snapshot_table<W: Write>(out: &mut W, snapshot: &WatchSnapshot) -> io::Result<()> {
    writeln!(
        out,
        "cycle {} at {} ({} ms)",
        snapshot.cycle, snapshot.generated_at, snapshot.latency_ms
    )?;

    match &snapshot.table.top_mover {
        Some(row) => writeln!(
            out,
            "top mover: {} {} (prev close {}, {})",
            row.ticker,
            format_price(row.quote.last_price),
            format_price(row.quote.previous_close),
            format_percent(row.pct_change)
        )?,
        None => writeln!(out, "top mover: {NOT_AVAILABLE}")?,
    }

    writeln!(
        out,
        "{:<12} {:>12} {:>12} {:>10}",
        "TICKER", "LAST", "CHANGE", "CHANGE%"
    )?;
    for row in &snapshot.table.rows {
        write_row(out, row)?;
    }

    for chart in &snapshot.charts {
        write_chart(out, chart)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, row: &WatchRow) -> io::Result<()> {
    writeln!(
        out,
        "{:<12} {:>12} {:>12} {:>10}",
        row.ticker.as_str(),
        format_price(row.quote.last_price),
        format_price(row.change),
        format_percent(row.pct_change)
    )
}

fn write_chart<W: Write>(out: &mut W, chart: &TickerChart) -> io::Result<()> {
    match &chart.data {
        ChartData::NoData => writeln!(out, "{} [{}]: no data", chart.ticker, chart.window),
        ChartData::Series(series) => {
            for line in series {
                let values = line.points.iter().map(|point| point.value);
                let low = values.clone().fold(f64::INFINITY, f64::min);
                let high = values.fold(f64::NEG_INFINITY, f64::max);
                let last = line.points.last().map(|point| point.value);
                writeln!(
                    out,
                    "{} [{}] {}: {} points, low {}, high {}, last {}",
                    chart.ticker,
                    chart.window,
                    line.kind.as_str(),
                    line.points.len(),
                    format_price(Some(low)),
                    format_price(Some(high)),
                    format_price(last)
                )?;
            }
            Ok(())
        }
    }
}

fn write_detail_table<W: Write>(out: &mut W, detail: &TickerDetail) -> io::Result<()> {
    let row = &detail.row;
    let quote = &row.quote;
    if detail.available {
        writeln!(out, "{}", row.ticker)?;
    } else {
        writeln!(out, "{}: data unavailable", row.ticker)?;
    }
    writeln!(out, "  last        {}", format_price(quote.last_price))?;
    writeln!(out, "  change      {}", format_price(row.change))?;
    writeln!(out, "  change %    {}", format_percent(row.pct_change))?;
    writeln!(out, "  open        {}", format_price(quote.open))?;
    writeln!(out, "  prev close  {}", format_price(quote.previous_close))?;
    writeln!(out, "  day high    {}", format_price(quote.day_high))?;
    writeln!(out, "  day low     {}", format_price(quote.day_low))?;
    writeln!(out, "  volume      {}", format_count(quote.volume))?;
    writeln!(out, "  market cap  {}", format_price(quote.market_cap))?;
    write_chart(out, &detail.chart)
}

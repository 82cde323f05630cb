use std::path::PathBuf;

use chrono::NaiveDate;
use colored::Colorize;
use rust_decimal::Decimal;
use tracing::info;

use treasury_core::config::{ConfigManager, EngineConfig};
use treasury_core::core::services::{
    ClosingDelta, ProjectionService, ServiceError, SimulationService,
};
use treasury_core::core::{Clock, Phase, Projection, ProjectionWarning, SystemClock};
use treasury_core::currency::{format_amount, CurrencyCode};
use treasury_core::domain::period::Granularity;
use treasury_core::errors::EngineError;
use treasury_core::init;
use treasury_core::ledger::periods::local_today;
use treasury_core::utils::build_info;

const USAGE: &str = "usage: treasury_cli <snapshot.json> [--config <path>] [--today YYYY-MM-DD] \
[--granularity <day|week|fortnight|month|quarter|semester|year>] [--horizon <n>] [--offset <n>] \
[--scenario] [--json]";

#[derive(Debug, Default)]
struct Args {
    snapshot: Option<PathBuf>,
    config: Option<PathBuf>,
    today: Option<NaiveDate>,
    granularity: Option<Granularity>,
    horizon: Option<i32>,
    offset: Option<i32>,
    scenario: bool,
    json: bool,
    version: bool,
}

fn main() {
    init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!("{}", build_info::current().summary());
        return Ok(());
    }
    let snapshot_path = args
        .snapshot
        .clone()
        .ok_or_else(|| EngineError::InvalidInput(USAGE.to_string()))?;

    let config = load_config(args.config.as_ref())?;
    // `--today` is a local calendar day; only the system clock needs localizing.
    let today = match args.today {
        Some(date) => date,
        None => local_today(SystemClock.now(), config.timezone()),
    };
    let periods = ProjectionService::periods_for_day(
        today,
        args.granularity.unwrap_or(config.granularity),
        args.horizon.unwrap_or(config.horizon_length),
        args.offset.unwrap_or(config.period_offset),
        config.locale,
    );

    let snapshot = ProjectionService::load_snapshot(&snapshot_path)
        .map_err(|ServiceError::Engine(err)| err)?;
    let report = snapshot.forecast_items();
    info!(
        items = report.items.len(),
        rejected = report.rejected.len(),
        periods = periods.len(),
        %today,
        "projecting snapshot"
    );

    let options = config.projection_options();
    let request = snapshot.request(&report.items, &periods, today);
    let base = ProjectionService::project(&request, &options);

    let scenario = match (&snapshot.scenario, args.scenario) {
        (Some(scenario), true) => Some((
            scenario,
            ProjectionService::project_scenario(&request, &scenario.deltas, &options),
        )),
        (None, true) => {
            return Err(EngineError::InvalidInput(
                "snapshot carries no scenario".to_string(),
            ))
        }
        _ => None,
    };

    if args.json {
        let payload = serde_json::json!({
            "today": today,
            "base": base,
            "scenario": scenario.as_ref().map(|(_, projection)| projection),
            "comparison": scenario
                .as_ref()
                .map(|(_, projection)| ProjectionService::compare(&base, projection)),
            "rejected": report
                .rejected
                .iter()
                .map(|rejected| rejected.error.to_string())
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Cash position as of {} ({})", today, options.base_currency).bold()
    );
    print_projection(&base, &options.base_currency);
    print_warnings(&base.warnings);

    if let Some((scenario, projection)) = &scenario {
        println!();
        for line in SimulationService::describe(&report.items, scenario) {
            println!("{line}");
        }
        print_projection(projection, &options.base_currency);
        print_warnings(&projection.warnings);
        println!();
        print_comparison(
            &ProjectionService::compare(&base, projection),
            &options.base_currency,
        );
    }

    for rejected in &report.rejected {
        let id = rejected.id.as_deref().unwrap_or("-");
        println!(
            "{} record #{} ({}): {}",
            "skipped".yellow(),
            rejected.index,
            id,
            rejected.error
        );
    }
    Ok(())
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, EngineError> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--version" | "-V" => args.version = true,
            "--scenario" => args.scenario = true,
            "--json" => args.json = true,
            "--config" => args.config = Some(PathBuf::from(value_for(&arg, raw.next())?)),
            "--today" => {
                let value = value_for(&arg, raw.next())?;
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                    EngineError::InvalidInput(format!("invalid date for --today: {value}"))
                })?;
                args.today = Some(date);
            }
            "--granularity" => {
                let value = value_for(&arg, raw.next())?;
                args.granularity = Some(parse_granularity(&value)?);
            }
            "--horizon" => args.horizon = Some(parse_int(&arg, raw.next())?),
            "--offset" => args.offset = Some(parse_int(&arg, raw.next())?),
            flag if flag.starts_with("--") => {
                return Err(EngineError::InvalidInput(format!(
                    "unknown option `{flag}`\n{USAGE}"
                )))
            }
            _ if args.snapshot.is_none() => args.snapshot = Some(PathBuf::from(&arg)),
            _ => {
                return Err(EngineError::InvalidInput(format!(
                    "unexpected argument `{arg}`\n{USAGE}"
                )))
            }
        }
    }
    Ok(args)
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, EngineError> {
    value.ok_or_else(|| EngineError::InvalidInput(format!("{flag} expects a value")))
}

fn parse_int(flag: &str, value: Option<String>) -> Result<i32, EngineError> {
    let value = value_for(flag, value)?;
    value
        .parse()
        .map_err(|_| EngineError::InvalidInput(format!("{flag} expects an integer, got `{value}`")))
}

fn parse_granularity(raw: &str) -> Result<Granularity, EngineError> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .map_err(|_| EngineError::InvalidInput(format!("unknown granularity `{raw}`")))
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, EngineError> {
    match path {
        Some(path) => ConfigManager::at_path(path).load(),
        None => ConfigManager::new()?.load(),
    }
}

fn print_projection(projection: &Projection, currency: &CurrencyCode) {
    let header = ["Period", "Phase", "Opening", "Inflow", "Outflow", "Closing"].map(String::from);
    let rows: Vec<[String; 6]> = projection
        .positions
        .iter()
        .map(|position| {
            [
                position.period.label.clone(),
                match position.phase {
                    Phase::Realized => "realized".to_string(),
                    Phase::Forecast => "forecast".to_string(),
                },
                format_amount(position.opening, currency),
                format_amount(position.inflow, currency),
                format_amount(position.outflow, currency),
                format_amount(position.closing, currency),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|cell| cell.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    println!("{}", render_row(&header, &widths).bold());
    for (row, position) in rows.iter().zip(&projection.positions) {
        let line = render_row(row, &widths);
        let line = if position.closing < Decimal::ZERO {
            line.red()
        } else if position.phase == Phase::Realized {
            line.dimmed()
        } else {
            line.normal()
        };
        println!("{line}");
    }
}

fn render_row(cells: &[String; 6], widths: &[usize; 6]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (cell, &width))| {
            if index < 2 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_warnings(warnings: &[ProjectionWarning]) {
    for warning in warnings {
        match warning {
            ProjectionWarning::RateUnavailable { currency, item_id } => println!(
                "{} no rate for {} (source {}); amounts kept unconverted",
                "warning:".yellow(),
                currency,
                item_id
            ),
        }
    }
}

fn print_comparison(deltas: &[ClosingDelta], currency: &CurrencyCode) {
    println!("{}", "Scenario vs base".bold());
    for delta in deltas {
        let change = format_amount(delta.delta, currency);
        let change = if delta.delta < Decimal::ZERO {
            change.red()
        } else if delta.delta > Decimal::ZERO {
            change.green()
        } else {
            change.normal()
        };
        println!(
            "{:<12} {:>14} -> {:>14}  ({})",
            delta.label,
            format_amount(delta.base, currency),
            format_amount(delta.scenario, currency),
            change
        );
    }
}

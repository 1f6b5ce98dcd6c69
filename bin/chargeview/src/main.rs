//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Command line front end for chart series, calendars and summaries."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chargeview_common::{init_tracing, AppConfig};
use chargeview_core::{
    build_grid, parse_day, CalendarRange, Dashboard, FormValues, SimulationGenerator, TimeScale,
};
use chargeview_sim::{load_samples, ChargingSimulator, RecordedDataset};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

const CONFIG_CANDIDATES: [&str; 2] = ["chargeview.toml", "configs/chargeview.toml"];

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Charging-point metrics at day, month or year scale",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to chargeview.toml or configs/chargeview.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file path. Use '-' for stdout.
    #[arg(long, global = true, default_value = "-")]
    output: PathBuf,

    /// Explicit output format when extension is ambiguous
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Random seed for the simulator
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of charging points
    #[arg(long, global = true)]
    points: Option<u32>,

    /// Arrival probability multiplier
    #[arg(long, global = true)]
    multiplier: Option<f64>,

    /// Charging power per point in kW
    #[arg(long = "power-kw", global = true)]
    power_kw: Option<f64>,

    /// Replay a recorded dataset (JSON) instead of simulating
    #[arg(long, global = true, value_name = "FILE")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Chart series for a time scale
    Series {
        #[arg(long, default_value_t = TimeScale::Day)]
        scale: TimeScale,
    },
    /// Calendar heatmap of daily activity
    Calendar {
        /// Scale of the simulation feeding the calendar
        #[arg(long, default_value_t = TimeScale::Year)]
        scale: TimeScale,
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        /// Activity samples (CSV or JSON) used instead of a generated dataset
        #[arg(long, value_name = "FILE")]
        samples: Option<PathBuf>,
    },
    /// Summary figures of a generated dataset
    Summary {
        #[arg(long, default_value_t = TimeScale::Day)]
        scale: TimeScale,
    },
    /// Full generated dataset as JSON
    Export {
        #[arg(long, default_value_t = TimeScale::Day)]
        scale: TimeScale,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing("chargeview", &config.logging)?;
    run(&cli, &config)
}

fn parse_date(input: &str) -> std::result::Result<NaiveDate, String> {
    parse_day(input).map_err(|err| err.to_string())
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::from_path(path);
    }
    Ok(AppConfig::load_optional(&CONFIG_CANDIDATES)?
        .map(|loaded| loaded.config)
        .unwrap_or_default())
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    let format = determine_format(&cli.output, cli.format);
    match &cli.command {
        Commands::Series { scale } => {
            let mut dashboard = build_dashboard(cli, config)?;
            let series = dashboard.set_time_scale(*scale)?.series;
            info!(%scale, points = series.len(), "chart series ready");
            write_rows(&cli.output, format, &series)?;
        }
        Commands::Calendar {
            scale,
            start,
            end,
            samples,
        } => {
            let range = CalendarRange::new(
                start.unwrap_or(config.calendar.start),
                end.unwrap_or(config.calendar.end),
            )?;
            let grid = match samples {
                Some(path) => build_grid(range.start, range.end, &load_samples(path)?)?,
                None => {
                    let mut dashboard = build_dashboard(cli, config)?;
                    dashboard.set_calendar_range(range);
                    dashboard.set_time_scale(*scale)?;
                    dashboard.calendar()?
                }
            };
            info!(cells = grid.len(), "calendar ready");
            match format {
                OutputFormat::Json => write_json(&cli.output, &grid)?,
                OutputFormat::Csv => write_rows(&cli.output, format, &grid.cells)?,
            }
        }
        Commands::Summary { scale } => {
            let mut dashboard = build_dashboard(cli, config)?;
            dashboard.set_time_scale(*scale)?;
            let summary = dashboard
                .summary()
                .context("no dataset available after regeneration")?;
            write_rows(&cli.output, format, &[summary])?;
        }
        Commands::Export { scale } => {
            if matches!(format, OutputFormat::Csv) {
                bail!("datasets can only be exported as JSON");
            }
            let mut dashboard = build_dashboard(cli, config)?;
            let selection = dashboard.set_time_scale(*scale)?;
            write_json(&cli.output, selection.dataset)?;
        }
    }
    Ok(())
}

fn form_values(cli: &Cli, config: &AppConfig) -> FormValues {
    FormValues {
        point_count: cli.points.unwrap_or(config.simulation.point_count),
        arrival_multiplier: cli.multiplier.unwrap_or(config.simulation.arrival_multiplier),
        charging_power_kw: cli.power_kw.unwrap_or(config.simulation.charging_power_kw),
    }
}

fn build_generator(cli: &Cli, config: &AppConfig) -> Result<Box<dyn SimulationGenerator>> {
    let recorded = cli
        .dataset
        .as_ref()
        .or(config.simulation.recorded_dataset.as_ref());
    if let Some(path) = recorded {
        let replay = RecordedDataset::from_path(path)
            .with_context(|| format!("unable to load recorded dataset {}", path.display()))?;
        info!(
            source = %replay.source().display(),
            events = replay.dataset().total_events,
            "replaying recorded dataset"
        );
        return Ok(Box::new(replay));
    }
    let seed = cli.seed.unwrap_or(config.simulation.random_seed);
    let simulator = ChargingSimulator::new(seed).with_start_date(config.simulation.start_date);
    info!(
        seed = simulator.seed(),
        start = %simulator.start_date(),
        "simulating charging activity"
    );
    Ok(Box::new(simulator))
}

fn build_dashboard(cli: &Cli, config: &AppConfig) -> Result<Dashboard<Box<dyn SimulationGenerator>>> {
    let range = CalendarRange::new(config.calendar.start, config.calendar.end)?;
    Ok(Dashboard::new(
        build_generator(cli, config)?,
        form_values(cli, config),
        range,
    ))
}

fn determine_format(path: &Path, override_format: Option<OutputFormat>) -> OutputFormat {
    if let Some(format) = override_format {
        return format;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => OutputFormat::Csv,
        _ => OutputFormat::Json,
    }
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    Ok(Box::new(file))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = open_output(path)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, format: OutputFormat, rows: &[T]) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(path, rows),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(open_output(path)?);
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

// Fuel Emissions Explorer - Main executable
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::info;

use fuel_emissions_explorer::{
    data::{write_csv, CsvSource, DataSource, FuelTable},
    processing::{DataProcessor, LimitProcessor},
    utils::{init_logging, Config},
    views::{
        dashboard_view, format_number, raw_data_view, DashboardQuery, FilterOptions,
        JsonChartRenderer, RawDataQuery,
    },
};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = cli().get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => Config::from_file(path).with_context(|| format!("loading config {}", path))?,
        None => Config::default(),
    };
    if let Some(level) = matches.value_of("log-level") {
        config.logging.level = level.to_string();
    }

    if let Err(err) = init_logging(config.log_level_filter()) {
        eprintln!("Error initializing logger: {}", err);
    }

    match matches.subcommand() {
        Some(("options", sub)) => run_options(&config, sub),
        Some(("raw", sub)) => run_raw(&config, sub),
        Some(("dashboard", sub)) => run_dashboard(&config, sub),
        _ => bail!("no subcommand given, use --help for usage"),
    }
}

fn cli() -> Command<'static> {
    let input = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .help("CSV file with the vehicle records")
        .takes_value(true)
        .required(true);
    let make = Arg::new("make")
        .long("make")
        .value_name("MAKE")
        .help("Keep only this make (repeatable)")
        .takes_value(true)
        .multiple_occurrences(true);
    let class = Arg::new("class")
        .long("class")
        .value_name("CLASS")
        .help("Keep only this vehicle class (repeatable)")
        .takes_value(true)
        .multiple_occurrences(true);
    let fuel = Arg::new("fuel")
        .long("fuel")
        .value_name("FUEL")
        .help("Keep only this fuel type (repeatable)")
        .takes_value(true)
        .multiple_occurrences(true);

    Command::new("fuel-explorer")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gabriel Demetrios Lafis")
        .about("Explore vehicle fuel-consumption and CO2-emission records")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file (.json, .yaml)")
                .takes_value(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Overrides the configured log level")
                .takes_value(true),
        )
        .subcommand(
            Command::new("options")
                .about("Print the available filter choices as JSON")
                .arg(input.clone()),
        )
        .subcommand(
            Command::new("raw")
                .about("Filter raw rows, print a preview and optionally save a CSV download")
                .arg(input.clone())
                .arg(make.clone())
                .arg(class.clone())
                .arg(fuel.clone())
                .arg(
                    Arg::new("columns")
                        .long("columns")
                        .value_name("COL,COL,...")
                        .help("Columns to keep, in order")
                        .takes_value(true)
                        .use_value_delimiter(true),
                )
                .arg(
                    Arg::new("engine-size")
                        .long("engine-size")
                        .value_name("MIN:MAX")
                        .help("Inclusive engine size range in litres")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("co2")
                        .long("co2")
                        .value_name("MIN:MAX")
                        .help("Inclusive CO2 emissions range in g/km")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("output-dir")
                        .short('o')
                        .long("output-dir")
                        .value_name("DIR")
                        .help("Save the filtered CSV into this directory")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("file-name")
                        .long("file-name")
                        .value_name("NAME")
                        .help("Download file name")
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Print dashboard metrics and chart figures")
                .arg(input)
                .arg(make)
                .arg(class)
                .arg(fuel)
                .arg(
                    Arg::new("bins")
                        .long("bins")
                        .value_name("N")
                        .help("Histogram bin count")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("charts")
                        .long("charts")
                        .value_name("FILE")
                        .help("Write chart figures as JSON to this file instead of stdout")
                        .takes_value(true),
                ),
        )
}

fn load_input(config: &Config, matches: &ArgMatches) -> Result<FuelTable> {
    let path = matches
        .value_of("input")
        .ok_or_else(|| anyhow!("--input is required"))?;
    let bytes = fs::read(path).with_context(|| format!("reading {}", path))?;

    let table = CsvSource::from_bytes(path, bytes)
        .with_delimiter(config.delimiter_byte())
        .read()
        .with_context(|| format!("parsing {}", path))?;
    let fuel = FuelTable::new(table).with_context(|| format!("validating {}", path))?;

    info!("Loaded {} rows from {}", fuel.len(), path);
    Ok(fuel)
}

fn values(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .values_of(name)
        .map(|vals| vals.map(String::from).collect())
        .unwrap_or_default()
}

fn parse_range(matches: &ArgMatches, name: &str) -> Result<Option<(f64, f64)>> {
    let Some(text) = matches.value_of(name) else {
        return Ok(None);
    };

    let (lower, upper) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("--{} expects MIN:MAX, got '{}'", name, text))?;
    let lower = lower.trim().parse().with_context(|| format!("--{} lower bound", name))?;
    let upper = upper.trim().parse().with_context(|| format!("--{} upper bound", name))?;
    Ok(Some((lower, upper)))
}

fn run_options(config: &Config, matches: &ArgMatches) -> Result<()> {
    let fuel = load_input(config, matches)?;
    let options = FilterOptions::from_table(&fuel)?;
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

fn run_raw(config: &Config, matches: &ArgMatches) -> Result<()> {
    let fuel = load_input(config, matches)?;

    let query = RawDataQuery {
        columns: matches
            .values_of("columns")
            .map(|vals| vals.map(String::from).collect()),
        makes: values(matches, "make"),
        vehicle_classes: values(matches, "class"),
        fuel_types: values(matches, "fuel"),
        engine_size: parse_range(matches, "engine-size")?,
        co2_emissions: parse_range(matches, "co2")?,
    };

    let result = raw_data_view(&fuel, &query)?;
    let preview = LimitProcessor::new(config.dashboard.preview_rows).process(&result.table)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_csv(&mut out, &preview, config.delimiter_byte())?;
    writeln!(out, "{}", result.summary())?;
    for (column, mean) in &result.means {
        writeln!(out, "Mean {}: {}", column, format_number(*mean, ""))?;
    }

    if let Some(dir) = matches.value_of("output-dir") {
        let file_name = matches
            .value_of("file-name")
            .unwrap_or(&config.download.file_name);
        let download = result.download(file_name)?;
        download.save_to(Path::new(dir))?;
        writeln!(out, "Saved {} ({})", download.file_name, download.mime)?;
    }

    Ok(())
}

fn run_dashboard(config: &Config, matches: &ArgMatches) -> Result<()> {
    let fuel = load_input(config, matches)?;

    let bins = match matches.value_of("bins") {
        Some(text) => text.parse().with_context(|| format!("--bins '{}'", text))?,
        None => config.dashboard.histogram_bins,
    };
    let query = DashboardQuery {
        makes: values(matches, "make"),
        fuel_types: values(matches, "fuel"),
        vehicle_classes: values(matches, "class"),
    };

    let view = dashboard_view(&fuel, &query, bins)?;
    for (label, value) in view.metrics.formatted() {
        println!("{}: {}", label, value);
    }

    let figures = view.render(&JsonChartRenderer)?;
    let json = serde_json::to_string_pretty(&figures)?;
    match matches.value_of("charts") {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path))?;
            info!("Wrote {} charts to {}", figures.len(), path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

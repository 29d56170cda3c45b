#![forbid(unsafe_code)]

mod config;
mod constants;
mod error;
mod event_handler;
mod manager;
mod monitors;
mod placement;
mod resolution;
mod types;
mod x11_utils;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::{JsonFileStore, MemoryStore, PreferenceStore, RolePreference};
use constants::{logging, messages};
use error::ConfigError;
use manager::ConfigurationManager;
use monitors::{FileMonitorEnumerator, MonitorEnumerator};
use placement::{Placement, ShowMode};
use types::{MonitorDescriptor, Role};
use x11_utils::X11Display;

/// Assigns the main and canvas windows to monitors
#[derive(Debug, Parser)]
#[command(name = "display-roles", version, about)]
struct Cli {
    /// Read the monitor topology from a JSON file instead of the X server
    #[arg(long, global = true, value_name = "FILE")]
    topology: Option<PathBuf>,

    /// Preference file (defaults to the per-user data directory)
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve both roles, save corrected preferences and print placements (default)
    Resolve {
        /// Resolve against a copy of the stored preferences without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// List the attached monitors
    Monitors,
    /// Print the stored preferences
    Show,
    /// Edit the stored preference of one role
    Set(SetArgs),
    /// Resolve, then report monitor changes until interrupted
    Watch,
}

#[derive(Debug, Args)]
struct SetArgs {
    role: Role,

    #[arg(long, value_name = "BOOL")]
    show_on_primary: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    maximized: Option<bool>,

    /// Borderless fullscreen (canvas only)
    #[arg(long, value_name = "BOOL")]
    fullscreen: Option<bool>,

    /// Pin the role to a monitor device name
    #[arg(long, value_name = "NAME", conflicts_with = "clear_monitor")]
    monitor: Option<String>,

    /// Remove the monitor pin
    #[arg(long)]
    clear_monitor: bool,
}

fn init_logging() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var(logging::LEVEL_ENV)
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

fn open_store(cli: &Cli) -> JsonFileStore {
    match &cli.store {
        Some(path) => JsonFileStore::at(path),
        None => JsonFileStore::open_default(),
    }
}

fn open_enumerator(cli: &Cli) -> Result<Box<dyn MonitorEnumerator>, ConfigError> {
    match &cli.topology {
        Some(path) => Ok(Box::new(FileMonitorEnumerator::new(path))),
        None => X11Display::connect()
            .map(|display| Box::new(display) as Box<dyn MonitorEnumerator>)
            .map_err(|e| ConfigError::EnumerationFailure(format!("{e:#}"))),
    }
}

fn describe_placement(placement: &Placement) -> String {
    let mode = match placement.mode {
        ShowMode::Normal => "normal",
        ShowMode::Maximized => "maximized",
        ShowMode::Fullscreen => "fullscreen",
    };
    match placement.rect {
        Some(rect) => format!("{mode} at {rect}"),
        None => format!("{mode} at system default position"),
    }
}

fn describe_monitor(monitor: &MonitorDescriptor) -> String {
    let primary = if monitor.is_primary { ", primary" } else { "" };
    format!("{} ({}{primary})", monitor.device_name, monitor.bounds)
}

fn print_resolution(manager: &ConfigurationManager, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&manager.summary())?);
        return Ok(());
    }

    println!(
        "main   -> {}: {}",
        describe_monitor(manager.main_monitor()),
        describe_placement(&manager.compute_main_window_placement())
    );
    println!(
        "canvas -> {}: {}",
        describe_monitor(manager.canvas_monitor()),
        describe_placement(&manager.compute_canvas_window_placement())
    );
    let saved = manager
        .corrections()
        .iter()
        .filter(|correction| correction.touches_preferences())
        .count();
    if saved > 0 {
        println!("{saved} preference correction(s) saved");
    }
    Ok(())
}

fn describe_preference(preference: &RolePreference) -> String {
    let pin = if preference.has_pin() {
        preference.monitor_name.as_str()
    } else {
        "-"
    };
    format!(
        "show_on_primary={} maximized={} fullscreen={} monitor={pin}",
        preference.show_on_primary, preference.show_maximized, preference.show_fullscreen
    )
}

fn run_resolve(cli: &Cli, dry_run: bool) -> Result<()> {
    let enumerator = open_enumerator(cli)?;
    let mut store = open_store(cli);

    if !dry_run {
        let manager = ConfigurationManager::initialize(enumerator.as_ref(), &mut store)?;
        return print_resolution(&manager, cli.json);
    }

    // Same read path as a real run, writes stay in memory
    let mut scratch = MemoryStore::new();
    for role in Role::ALL {
        match store.get(role.key()) {
            Ok(Some(preference)) => scratch = scratch.with_record(role.key(), preference),
            Ok(None) => {}
            Err(e) => warn!(role = %role, error = %e, "Failed to read preference, using defaults"),
        }
    }

    let manager = ConfigurationManager::initialize(enumerator.as_ref(), &mut scratch)?;
    print_resolution(&manager, cli.json)?;
    if !cli.json {
        println!("dry run: {} record(s) not saved", scratch.writes());
        for role in Role::ALL {
            println!("  {role:<6} {}", describe_preference(manager.preferences().get(role)));
        }
    }
    Ok(())
}

fn run_monitors(cli: &Cli) -> Result<()> {
    let monitors = open_enumerator(cli)?.enumerate()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&monitors)?);
        return Ok(());
    }

    if monitors.is_empty() {
        println!("no monitors reported");
    }
    for monitor in &monitors {
        println!("{} work={}", describe_monitor(monitor), monitor.work);
    }
    Ok(())
}

fn run_show(cli: &Cli) -> Result<()> {
    let store = open_store(cli);
    let mut stored = BTreeMap::new();
    for role in Role::ALL {
        stored.insert(role.key(), store.get(role.key())?);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    println!("{}", store.path().display());
    for role in Role::ALL {
        match stored.get(role.key()).and_then(Option::as_ref) {
            Some(preference) => println!("{role:<6} {}", describe_preference(preference)),
            None => println!(
                "{role:<6} {} (default, not stored)",
                describe_preference(&RolePreference::default_for(role))
            ),
        }
    }
    Ok(())
}

fn run_set(cli: &Cli, args: &SetArgs) -> Result<()> {
    let mut store = open_store(cli);
    let mut preference = match store.get(args.role.key()) {
        Ok(Some(preference)) => preference,
        Ok(None) => RolePreference::default_for(args.role),
        Err(e) => {
            warn!(role = %args.role, error = %e, "Failed to read preference, starting from defaults");
            RolePreference::default_for(args.role)
        }
    };

    if let Some(value) = args.show_on_primary {
        preference.show_on_primary = value;
    }
    if let Some(value) = args.maximized {
        preference.show_maximized = value;
    }
    if let Some(value) = args.fullscreen {
        if args.role == Role::Main {
            warn!("fullscreen only affects the canvas window");
        }
        preference.show_fullscreen = value;
    }
    if let Some(name) = &args.monitor {
        preference.monitor_name = name.clone();
    } else if args.clear_monitor {
        preference.monitor_name.clear();
    }

    store.put(args.role.key(), &preference)?;
    info!(role = %args.role, "Updated preference; takes effect on next resolve");
    println!("{:<6} {}", args.role, describe_preference(&preference));
    Ok(())
}

fn run_watch(cli: &Cli) -> Result<()> {
    if cli.topology.is_some() {
        anyhow::bail!("watch needs a live X display; drop --topology");
    }

    let display = X11Display::connect()
        .map_err(|e| ConfigError::EnumerationFailure(format!("{e:#}")))?;
    let mut store = open_store(cli);
    let manager = ConfigurationManager::initialize(&display, &mut store)?;
    print_resolution(&manager, cli.json)?;

    display.watch_topology_changes(|notice| {
        warn!(?notice, "Monitor topology changed");
        println!("{}", messages::TOPOLOGY_CHANGED);
    })
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => run_resolve(cli, false),
        Some(Command::Resolve { dry_run }) => run_resolve(cli, *dry_run),
        Some(Command::Monitors) => run_monitors(cli),
        Some(Command::Show) => run_show(cli),
        Some(Command::Set(args)) => run_set(cli, args),
        Some(Command::Watch) => run_watch(cli),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "display-roles failed");
            // Initialization failures get the same heading the user saw before
            if e.downcast_ref::<ConfigError>().is_some() {
                eprintln!("{}: {e:#}", messages::INIT_FAILURE_TITLE);
            } else {
                eprintln!("display-roles: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

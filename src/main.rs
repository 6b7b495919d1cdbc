//! Charging scheduler entry point: CLI wiring and config-driven solving.

use std::io;
use std::path::Path;
use std::process;

use tracing::info;

use gridcharge::config::ScenarioConfig;
use gridcharge::fleet::Fleet;
use gridcharge::grid::{Grid, Topology};
use gridcharge::io::export::{export_policy_csv, export_value_csv};
use gridcharge::mdp::solver::Scheduler;
use gridcharge::report::print_solution_report;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    grid_override: Option<String>,
    horizon_override: Option<usize>,
    policy_out: Option<String>,
    value_out: Option<String>,
}

fn print_help() {
    eprintln!("gridcharge — grid-aware EV fleet charging scheduler");
    eprintln!();
    eprintln!("Usage: gridcharge [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>     Load scenario from TOML config file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline, congested)");
    eprintln!("  --grid <path>         Override the topology file path");
    eprintln!("  --horizon <steps>     Override the solve horizon");
    eprintln!("  --policy-out <path>   Export per-timestep policies to CSV");
    eprintln!("  --value-out <path>    Export the expected-value vector to CSV");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        grid_override: None,
        horizon_override: None,
        policy_out: None,
        value_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--grid" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --grid requires a path argument");
                    process::exit(1);
                }
                cli.grid_override = Some(args[i].clone());
            }
            "--horizon" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --horizon requires a step-count argument");
                    process::exit(1);
                }
                if let Ok(h) = args[i].parse::<usize>() {
                    cli.horizon_override = Some(h);
                } else {
                    eprintln!(
                        "error: --horizon value \"{}\" is not a valid step count",
                        args[i]
                    );
                    process::exit(1);
                }
            }
            "--policy-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --policy-out requires a path argument");
                    process::exit(1);
                }
                cli.policy_out = Some(args[i].clone());
            }
            "--value-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --value-out requires a path argument");
                    process::exit(1);
                }
                cli.value_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    info!("gridcharge v{}", env!("CARGO_PKG_VERSION"));

    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply overrides
    if let Some(ref path) = cli.grid_override {
        scenario.grid.topology = path.clone();
    }
    if let Some(horizon) = cli.horizon_override {
        scenario.solver.horizon = horizon;
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Build the network model
    let topology = match Topology::from_file(Path::new(&scenario.grid.topology)) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let grid = match Grid::from_topology(&topology) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Build the fleet against the loaded network
    let fleet = match Fleet::new(scenario.vehicles(), grid.n_nodes()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let reward = scenario.reward_model();

    // Solve
    let scheduler = Scheduler::new(&grid, &fleet, &reward, scenario.solver.horizon);
    let solution = scheduler.solve();

    // Print the report
    print_solution_report(&solution, &fleet, &reward);

    // Export CSV if requested
    if let Some(ref path) = cli.policy_out {
        if let Err(e) = export_policy_csv(&solution, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Policy written to {path}");
    }
    if let Some(ref path) = cli.value_out {
        if let Err(e) = export_value_csv(&solution, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Values written to {path}");
    }
}

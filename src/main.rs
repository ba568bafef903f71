//! grid-sim entry point: CLI wiring and config-driven simulation construction.

use std::path::Path;
use std::process;

use grid_sim::config::ScenarioConfig;
use grid_sim::io::export::export_csv;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    ticks_override: Option<usize>,
    telemetry_out: Option<String>,
    summary: bool,
    verbose: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("grid-sim: city power-grid dispatch simulator");
    eprintln!();
    eprintln!("Usage: grid-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override jitter seed");
    eprintln!("  --ticks <n>              Override number of ticks to run");
    eprintln!("  --telemetry-out <path>   Export snapshots to CSV");
    eprintln!("  --summary                Print the JSON grid summary after the run");
    eprintln!("  --verbose                Log per-tick dispatch details");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Launch the live terminal UI");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

/// Returns the value following flag `name`, exiting if it is missing.
fn flag_value<'a>(args: &'a [String], i: &mut usize, name: &str, what: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(v) => v,
        None => {
            eprintln!("error: {name} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(value: &str, name: &str, what: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("error: {name} value \"{value}\" is not a valid {what}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        ticks_override: None,
        telemetry_out: None,
        summary: false,
        verbose: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(flag_value(&args, &mut i, "--scenario", "path").to_string());
            }
            "--preset" => {
                cli.preset = Some(flag_value(&args, &mut i, "--preset", "name").to_string());
            }
            "--seed" => {
                let v = flag_value(&args, &mut i, "--seed", "u64");
                cli.seed_override = Some(parse_or_exit(v, "--seed", "u64"));
            }
            "--ticks" => {
                let v = flag_value(&args, &mut i, "--ticks", "count");
                cli.ticks_override = Some(parse_or_exit(v, "--ticks", "count"));
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(flag_value(&args, &mut i, "--telemetry-out", "path").to_string());
            }
            "--summary" => cli.summary = true,
            "--verbose" | "-v" => cli.verbose = true,
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                let v = flag_value(&args, &mut i, "--port", "u16");
                cli.port = parse_or_exit(v, "--port", "u16");
            }
            #[cfg(feature = "tui")]
            "--tui" => cli.tui = true,
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
    let cli = parse_args();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // --scenario takes priority, then --preset, then baseline default
    let (name, mut scenario) = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => (path.clone(), cfg),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => (name.clone(), cfg),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ("baseline".to_string(), ScenarioConfig::baseline())
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(ticks) = cli.ticks_override {
        scenario.simulation.ticks = ticks;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    #[cfg(feature = "tui")]
    if cli.tui {
        if let Err(e) = grid_sim::tui::run(&name, scenario) {
            eprintln!("error: TUI crashed: {e}");
            process::exit(1);
        }
        return;
    }

    let mut sim = match scenario.build() {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    tracing::info!(scenario = %name, ticks = scenario.simulation.ticks, "running");

    println!("{}", sim.latest());
    for _ in 0..scenario.simulation.ticks {
        println!("{}", sim.tick());
    }

    println!("\n{}", sim.report());

    if cli.summary {
        match sim.summary().to_json() {
            Ok(json) => println!("\n{json}"),
            Err(e) => {
                eprintln!("error: failed to encode summary: {e}");
                process::exit(1);
            }
        }
    }

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(sim.history().iter(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(grid_sim::api::AppState::capture(&sim));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(grid_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}

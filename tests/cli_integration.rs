use std::fs;
use std::process::{Command, Output};

#[derive(Debug)]
struct Report {
    min_stability: f64,
    deficit_ticks: u64,
    offline_nodes: u64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_outcomes() {
    let baseline = run_and_parse_report("scenarios/baseline.toml");
    let dc_boom = run_and_parse_report("scenarios/datacenter_boom.toml");
    let outage = run_and_parse_report("scenarios/plant_outage.toml");

    assert_eq!(baseline.offline_nodes, 0, "baseline: {baseline:?}");
    assert_eq!(baseline.deficit_ticks, 0, "baseline: {baseline:?}");
    assert!((baseline.min_stability - 100.0).abs() < 1e-9, "baseline: {baseline:?}");

    assert_eq!(dc_boom.offline_nodes, 4, "datacenter_boom: {dc_boom:?}");
    assert!(dc_boom.min_stability < baseline.min_stability);

    assert!(outage.deficit_ticks > 0, "plant_outage: {outage:?}");
    assert!(outage.offline_nodes >= 1, "plant_outage: {outage:?}");
    assert!(outage.min_stability < 100.0);
}

#[test]
fn presets_run_via_cli() {
    for preset in ["baseline", "heatwave", "datacenter_boom", "evening_peak"] {
        let output = grid_sim(&["--preset", preset, "--ticks", "8"]);
        assert!(
            output.status.success(),
            "preset {preset} failed: stderr={}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
        assert!(stdout.contains("--- Grid Report (9 ticks) ---"), "{stdout}");
    }
}

#[test]
fn telemetry_and_summary_are_written() {
    let dir = std::env::temp_dir().join(format!("grid-sim-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let csv_path = dir.join("telemetry.csv");

    let output = grid_sim(&[
        "--preset",
        "heatwave",
        "--ticks",
        "10",
        "--summary",
        "--telemetry-out",
        csv_path.to_str().expect("utf-8 path"),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let csv = fs::read_to_string(&csv_path).expect("telemetry file");
    let mut lines = csv.lines();
    assert!(lines.next().is_some_and(|h| h.starts_with("tick,hour,total_demand_mw")));
    assert_eq!(lines.count(), 11);

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    let json_start = stdout.rfind("\n{").expect("summary JSON on stdout");
    let summary: serde_json::Value =
        serde_json::from_str(stdout[json_start..].trim()).expect("summary should be JSON");
    let active = summary["active_scenarios"].as_array().expect("scenario list");
    assert_eq!(active.len(), 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_scenario_file_is_rejected() {
    let path = std::env::temp_dir().join(format!("grid-sim-bad-{}.toml", std::process::id()));
    fs::write(&path, "[simulation]\nticks = 0\n\n[filters]\nwx_temp = 500.0\n").expect("write");

    let output = grid_sim(&["--scenario", path.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.ticks"), "{stderr}");
    assert!(stderr.contains("filters.wx_temp"), "{stderr}");

    let _ = fs::remove_file(&path);
}

fn grid_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grid-sim"))
        .args(args)
        .output()
        .expect("grid-sim process should run")
}

fn run_and_parse_report(path: &str) -> Report {
    let output = grid_sim(&["--scenario", path]);
    assert!(
        output.status.success(),
        "scenario run failed for {path}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Report {
        min_stability: field(&stdout, "Minimum stability:"),
        deficit_ticks: field(&stdout, "Deficit ticks:"),
        offline_nodes: field(&stdout, "Offline nodes:"),
    }
}

fn field<T: std::str::FromStr>(stdout: &str, label: &str) -> T {
    let line = stdout
        .lines()
        .find(|l| l.starts_with(label))
        .unwrap_or_else(|| panic!("missing \"{label}\" in report:\n{stdout}"));
    let value = line[label.len()..].trim().trim_end_matches('%');
    value
        .parse()
        .unwrap_or_else(|_| panic!("cannot parse \"{value}\" for \"{label}\""))
}

use std::process::{Command, Output};

fn run_simulation(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_intersection_sim"))
        .args(args)
        .env("RUST_LOG", "warn,intersection_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Parse the number following `label` in the log output
fn logged_count(stderr: &str, label: &str) -> u64 {
    stderr
        .lines()
        .find_map(|line| line.split(label).nth(1))
        .and_then(|rest| rest.trim().parse().ok())
        .unwrap_or_else(|| panic!("Missing '{}' statistic. stderr: {}", label, stderr))
}

/// Test that the simulation runs headless without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_simulation(&["--ticks", "600", "--seed", "7", "--report-every", "0"]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that simulation statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_simulation(&[
        "--ticks",
        "1200",
        "--seed",
        "11",
        "--spawn-chance",
        "0.1",
        "--report-every",
        "0",
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for label in [
        "Spawn requests rejected:",
        "Vehicles exited:",
        "Active vehicles:",
        "Turns completed:",
        "Forced phase switches:",
        "Throughput:",
    ] {
        assert!(stderr.contains(label), "Missing '{}' statistic", label);
    }

    assert_eq!(logged_count(&stderr, "Ticks simulated:"), 1200);
    assert!(logged_count(&stderr, "Total vehicles spawned:") > 0);
    assert!(logged_count(&stderr, "Phase switches:") > 0);
}

/// Test that periodic summaries and the map are printed
#[test]
fn test_periodic_summary_and_map() {
    let output = run_simulation(&[
        "--ticks",
        "600",
        "--seed",
        "3",
        "--report-every",
        "300",
        "--map",
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("=== Intersection Summary ===").count(), 2);
    assert!(stdout.contains("=== Intersection Map ==="));
    assert!(stdout.contains("--- Lanes ---"));
}

/// Test that invalid settings are rejected before the run starts
#[test]
fn test_invalid_arguments_rejected() {
    let output = run_simulation(&["--ticks", "10", "--spawn-chance", "1.5"]);
    assert!(!output.status.success());

    let output = run_simulation(&["--ticks", "10", "--base-duration", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid simulation configuration"));
}

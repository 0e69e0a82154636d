use std::process::Command;

fn run_sim(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_boarding_sim"))
        .args(args)
        .env("RUST_LOG", "warn,boarding_sim=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that a batch runs to completion and logs its statistics
#[test]
fn test_batch_run_logs_statistics() {
    let output = run_sim(&["--runs", "5", "--rows", "10", "--seed", "3"]);

    assert!(
        output.status.success(),
        "Batch run failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("BATCH COMPLETE"),
        "Batch did not complete properly. stderr: {}",
        stderr
    );
    for statistic in ["Mean:", "Median:", "Std dev:", "Min:", "Q1:", "Q3:", "Max:"] {
        assert!(stderr.contains(statistic), "Missing '{}' statistic", statistic);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Boarding time distribution"),
        "Missing histogram. stdout: {}",
        stdout
    );
}

/// Test that dual-door runs work from the command line
#[test]
fn test_dual_door_batch_runs() {
    let output = run_sim(&[
        "--runs",
        "3",
        "--rows",
        "12",
        "--doors",
        "2",
        "--policy",
        "back-to-front-groups",
        "--seed",
        "5",
    ]);

    assert!(
        output.status.success(),
        "Dual-door run failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("BATCH COMPLETE"));
    assert!(stderr.contains("Runs: 3 (0 stalled)"), "stderr: {}", stderr);
}

/// Test that the default full-size cabin finishes every run with shuffling on
#[test]
fn test_default_cabin_batch_has_no_stalls() {
    for doors in ["1", "2"] {
        let output = run_sim(&["--runs", "5", "--doors", doors, "--seed", "1"]);
        assert!(
            output.status.success(),
            "Batch with {} door(s) failed. stderr: {}",
            doors,
            String::from_utf8_lossy(&output.stderr)
        );
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Runs: 5 (0 stalled)"), "stderr: {}", stderr);
        assert!(!stderr.contains("did not finish"), "stderr: {}", stderr);
    }
}

/// Test that watch mode draws the cabin and finishes
#[test]
fn test_watch_mode_draws_cabin() {
    let output = run_sim(&[
        "--watch", "--rows", "3", "--delay-ms", "0", "--bags", "1", "--seed", "2",
    ]);

    assert!(
        output.status.success(),
        "Watch run failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Legend:"));
    assert!(stdout.contains("=== Boarding Simulation Summary ==="));
}

/// Test that the policy list names every policy
#[test]
fn test_list_policies() {
    let output = run_sim(&["--list-policies"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.contains("steffen-perfect"));
}

/// Test that bad arguments are rejected
#[test]
fn test_invalid_arguments_fail() {
    assert!(!run_sim(&["--policy", "sideways"]).status.success());
    assert!(!run_sim(&["--doors", "3"]).status.success());
    assert!(!run_sim(&["--load-factor", "1.5", "--runs", "1"]).status.success());
}

//! Basic CLI smoke tests.

use std::process::Command;

fn run_cli(args: &[&str]) -> (String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tempora"))
        .args(args)
        .output()
        .expect("failed to run tempora");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn help_lists_subcommands() {
    let (stdout, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for cmd in ["player", "catalog", "sequence", "stats", "config"] {
        assert!(stdout.contains(cmd), "missing subcommand {cmd}");
    }
}

#[test]
fn player_help_lists_actions() {
    let (stdout, code) = run_cli(&["player", "--help"]);
    assert_eq!(code, 0);
    for action in ["select", "toggle", "stop", "status", "length"] {
        assert!(stdout.contains(action), "missing action {action}");
    }
}

#[test]
fn version_prints() {
    let (stdout, code) = run_cli(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("tempora"));
}

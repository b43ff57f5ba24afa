//! CLI acceptance tests for the geotrace binary
//!
//! Each test runs the built binary inside an isolated XDG environment so
//! no real user state is touched.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }
}

fn run_geotrace(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("geotrace"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute geotrace: {e}"))
}

#[test]
fn test_status_reports_unconfigured_collector() {
    let env = CliTestEnv::new();
    let output = run_geotrace(&env, &["status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("not ready"));
    assert!(stdout.contains("collector_url"));
}

#[test]
fn test_status_ready_with_configured_collector() {
    let env = CliTestEnv::new();

    let config_dir = env.xdg_config.join("geotrace");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[reporter]\ncollector_url = \"https://collector.example.com/locations\"\n",
    )
    .unwrap();

    let output = run_geotrace(&env, &["status"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ready to report"));
    assert!(stdout.contains("https://collector.example.com/locations"));
}

#[test]
fn test_identity_is_stable_across_invocations() {
    let env = CliTestEnv::new();

    let first = run_geotrace(&env, &["identity"]);
    let second = run_geotrace(&env, &["identity"]);

    assert!(first.status.success());
    assert!(second.status.success());

    let first_id = String::from_utf8_lossy(&first.stdout).trim().to_string();
    let second_id = String::from_utf8_lossy(&second.stdout).trim().to_string();

    assert!(!first_id.is_empty());
    assert_eq!(first_id, second_id);

    // The identity store landed in the XDG data directory
    assert!(env.xdg_data.join("geotrace/identity.db").exists());
}

#[test]
fn test_identities_differ_between_installations() {
    let env_a = CliTestEnv::new();
    let env_b = CliTestEnv::new();

    let id_a = run_geotrace(&env_a, &["identity"]);
    let id_b = run_geotrace(&env_b, &["identity"]);

    assert_ne!(
        String::from_utf8_lossy(&id_a.stdout),
        String::from_utf8_lossy(&id_b.stdout)
    );
}

#[test]
fn test_run_rejects_missing_collector_url() {
    let env = CliTestEnv::new();
    let output = run_geotrace(&env, &["run"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("collector_url"));
}

#[test]
fn test_run_rejects_missing_replay_file() {
    let env = CliTestEnv::new();

    let config_dir = env.xdg_config.join("geotrace");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[reporter]\ncollector_url = \"http://127.0.0.1:9/ingest\"\n",
    )
    .unwrap();

    let output = run_geotrace(&env, &["run", "--replay", "/nonexistent/route.jsonl"]);

    assert!(!output.status.success());
}

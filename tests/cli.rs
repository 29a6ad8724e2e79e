//! End-to-end tests of the `swx` binary against the fake API.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::FakeSwapi;

fn swx_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_swx"))
}

fn setup_test_env(fake: &FakeSwapi) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[api]
base_url = "{}"
timeout_secs = 5

[filters]
max_concurrent_resolutions = 4

[session]
store_path = "{}/data/session.json"
refresh_interval_secs = 300

[server]
bind = "127.0.0.1:0"
"#,
        fake.base_url,
        root.display()
    );

    let config_path = config_dir.join("swx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_swx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = swx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run swx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn login(config_path: &Path) {
    let (stdout, stderr, success) = run_swx(config_path, &["login", "luke", "secret"]);
    assert!(success, "login failed: stdout={}, stderr={}", stdout, stderr);
}

#[test]
fn test_commands_require_login() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);

    let (_, stderr, success) = run_swx(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("Not logged in"), "stderr={}", stderr);
}

#[test]
fn test_login_rejects_empty_password() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);

    let (_, stderr, success) = run_swx(&config_path, &["login", "luke", ""]);
    assert!(!success);
    assert!(stderr.contains("Invalid credentials"), "stderr={}", stderr);
}

#[test]
fn test_login_whoami_logout() {
    let fake = FakeSwapi::start();
    let (tmp, config_path) = setup_test_env(&fake);

    let (stdout, _, success) = run_swx(&config_path, &["login", "luke", "secret"]);
    assert!(success);
    assert!(stdout.contains("Logged in as luke"));

    let stored = fs::read_to_string(tmp.path().join("data/session.json")).unwrap();
    assert!(stored.contains("swapi_token"));

    let (stdout, _, success) = run_swx(&config_path, &["whoami"]);
    assert!(success);
    assert!(stdout.contains("username: luke"));

    let (stdout, _, success) = run_swx(&config_path, &["logout"]);
    assert!(success);
    assert!(stdout.contains("Logged out."));

    let (_, _, success) = run_swx(&config_path, &["whoami"]);
    assert!(!success);
}

#[test]
fn test_list_pages() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);
    login(&config_path);

    let (stdout, stderr, success) = run_swx(&config_path, &["list"]);
    assert!(success, "list failed: stderr={}", stderr);
    assert!(stdout.contains("Luke Skywalker"));
    assert!(stdout.contains("Page 1 of 3"));

    let (stdout, _, success) = run_swx(&config_path, &["list", "--page", "3"]);
    assert!(success);
    assert!(stdout.contains("Trooper 23"));
    assert!(!stdout.contains("Luke Skywalker"));
    assert!(stdout.contains("Page 3 of 3"));
}

#[test]
fn test_list_search_and_filter() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);
    login(&config_path);

    let (stdout, _, success) = run_swx(&config_path, &["list", "--search", "sky"]);
    assert!(success);
    assert!(stdout.contains("Luke Skywalker"));
    assert!(stdout.contains("1 result(s)"));
    assert!(!stdout.contains("Page "));

    let planet = fake.planet_url(2);
    let (stdout, _, success) = run_swx(&config_path, &["list", "--homeworld", &planet]);
    assert!(success);
    assert!(stdout.contains("Leia Organa"));
    assert!(!stdout.contains("Luke Skywalker"));
    // Alderaan: characters 2, 5, 8, 11, 14, 17, 20, 23
    assert!(stdout.contains("8 result(s)"));

    let (stdout, _, success) = run_swx(&config_path, &["list", "--search", "nobody"]);
    assert!(success);
    assert!(stdout.contains("No characters found."));
}

#[test]
fn test_list_json_view() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);
    login(&config_path);

    let (stdout, _, success) = run_swx(&config_path, &["list", "--page", "2", "--json"]);
    assert!(success);
    let view: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(view["pagination"]["current_page"], 2);
    assert_eq!(view["characters"].as_array().unwrap().len(), 10);
    assert_eq!(view["filters_loading"], false);
}

#[test]
fn test_list_error_suggests_retry() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);
    login(&config_path);

    fake.set_failing(true);
    let (_, stderr, success) = run_swx(&config_path, &["list", "--page", "2"]);
    assert!(!success);
    assert!(stderr.contains("500"), "stderr={}", stderr);
    assert!(stderr.contains("Retry with: swx list --page 2"));
}

#[test]
fn test_filters_command() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);
    login(&config_path);

    let (stdout, stderr, success) = run_swx(&config_path, &["filters"]);
    assert!(success, "filters failed: stderr={}", stderr);
    assert!(stdout.contains("Homeworlds (3)"));
    assert!(stdout.contains("Species (1)"));
    assert!(stdout.contains("Films (2)"));
    let alderaan = stdout.find("Alderaan").unwrap();
    let tatooine = stdout.find("Tatooine").unwrap();
    assert!(alderaan < tatooine);
}

#[test]
fn test_show_command() {
    let fake = FakeSwapi::start();
    let (_tmp, config_path) = setup_test_env(&fake);
    login(&config_path);

    let url = fake.person_url(1);
    let (stdout, stderr, success) = run_swx(&config_path, &["show", &url]);
    assert!(success, "show failed: stderr={}", stderr);
    assert!(stdout.contains("Luke Skywalker"));
    assert!(stdout.contains("172 cm"));
    assert!(stdout.contains("Tatooine"));
    assert!(stdout.contains("200,000"));
}

#[test]
fn test_invalid_config_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("swx.toml");
    fs::write(&config_path, "[api]\nbase_url = \"ftp://nowhere\"\n").unwrap();

    let (_, stderr, success) = run_swx(&config_path, &["whoami"]);
    assert!(!success);
    assert!(stderr.contains("base_url"), "stderr={}", stderr);
}

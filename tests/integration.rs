use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn dps_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dps"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let packs_dir = root.join("packs");
    fs::create_dir_all(&packs_dir).unwrap();
    fs::write(
        packs_dir.join("products.json"),
        r#"[
  {"@id": "1", "@type": "Product", "name": "describo", "description": "an awesome tool!"},
  {"@id": "2", "@type": "Product", "name": "crate-o", "description": "an RO-Crate editor"},
  {"@id": "3", "@type": "Organization", "name": "Language Data Commons"}
]"#,
    )
    .unwrap();
    fs::write(
        packs_dir.join("mine.json"),
        r#"[
  {"@id": "_:b1", "@type": "Person", "name": "anonymous"},
  {"@id": "me", "@type": "Person", "name": "Me", "email": "me@example.org"}
]"#,
    )
    .unwrap();
    fs::write(
        packs_dir.join("bad.json"),
        r#"[{"@id": "x", "@type": "Person"}]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/dps.sqlite"

[ingest]
chunk_size = 2

[query]
default_limit = 10
"#,
        root.display()
    );

    let config_path = config_dir.join("dps.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn pack(config_path: &Path, name: &str) -> String {
    let root = config_path.parent().unwrap().parent().unwrap();
    root.join("packs").join(name).display().to_string()
}

fn run_dps(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dps_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dps binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_dps(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/dps.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_dps(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_dps(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_load_file() {
    let (_tmp, config_path) = setup_test_env();
    let products = pack(&config_path, "products.json");

    let (stdout, stderr, success) = run_dps(&config_path, &["load", "--file", &products]);
    assert!(success, "load failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("entries: 3"));
    assert!(stdout.contains("chunks: 2"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_reload_replaces_entries() {
    let (_tmp, config_path) = setup_test_env();
    let products = pack(&config_path, "products.json");

    run_dps(&config_path, &["load", "--file", &products]);
    let (stdout, _, success) = run_dps(&config_path, &["load", "--file", &products]);
    assert!(success);
    assert!(stdout.contains("replaced: 3"), "got: {}", stdout);

    let (stdout, _, _) = run_dps(&config_path, &["stats"]);
    assert!(stdout.contains("Entries:     3"), "got: {}", stdout);
    assert!(stdout.contains("Sources:     1"), "got: {}", stdout);
}

#[test]
fn test_load_missing_file_without_url_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_dps(&config_path, &["load", "--file", "/nonexistent/pack.json"]);
    assert!(!success);
    assert!(stderr.contains("pack.json"), "got: {}", stderr);
}

#[test]
fn test_query_substring() {
    let (_tmp, config_path) = setup_test_env();
    let products = pack(&config_path, "products.json");
    run_dps(&config_path, &["load", "--file", &products]);

    let (stdout, _, success) = run_dps(&config_path, &["query", "--type", "Product", "--name", "esc"]);
    assert!(success, "query failed");
    assert!(stdout.contains("describo [Product] 1"), "got: {}", stdout);
    assert!(!stdout.contains("crate-o"));

    let (stdout, _, _) = run_dps(
        &config_path,
        &[
            "query", "--type", "Product", "--mode", "and", "--name", "cows", "--description",
            "awesome",
        ],
    );
    assert!(stdout.contains("No results."), "got: {}", stdout);
}

#[test]
fn test_query_json_output() {
    let (_tmp, config_path) = setup_test_env();
    let products = pack(&config_path, "products.json");
    run_dps(&config_path, &["load", "--file", &products]);

    let (stdout, _, success) = run_dps(&config_path, &["query", "--type", "Product", "--json"]);
    assert!(success);
    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["crate-o", "describo"]);
    assert_eq!(results[0]["@type"], "Product");
}

#[test]
fn test_get_and_types() {
    let (_tmp, config_path) = setup_test_env();
    let products = pack(&config_path, "products.json");
    run_dps(&config_path, &["load", "--file", &products]);

    let (stdout, _, success) = run_dps(&config_path, &["get", "1"]);
    assert!(success);
    let data: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(data["description"], "an awesome tool!");

    let (_, _, success) = run_dps(&config_path, &["get", "404"]);
    assert!(!success, "get of a missing entry should fail");

    let (stdout, _, _) = run_dps(&config_path, &["types"]);
    let types: Vec<&str> = stdout.lines().collect();
    assert_eq!(types, vec!["Organization", "Product"]);
}

#[test]
fn test_put_list_and_cleanup() {
    let (_tmp, config_path) = setup_test_env();
    let mine = pack(&config_path, "mine.json");

    let (stdout, stderr, success) = run_dps(&config_path, &["put", &mine]);
    assert!(success, "put failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("created: 2"));

    let (stdout, _, _) = run_dps(&config_path, &["list-local", "--type", "Person"]);
    let page: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(page["total"], 2);

    let (stdout, _, success) = run_dps(&config_path, &["cleanup"]);
    assert!(success);
    assert!(stdout.contains("entries removed: 1"), "got: {}", stdout);

    let (stdout, _, _) = run_dps(&config_path, &["list-local"]);
    let page: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["email"], "me@example.org");
}

#[test]
fn test_put_invalid_pack_fails() {
    let (_tmp, config_path) = setup_test_env();
    let bad = pack(&config_path, "bad.json");

    let (_, stderr, success) = run_dps(&config_path, &["put", &bad]);
    assert!(!success);
    assert!(
        stderr.contains("Each entry in the data must have a name property"),
        "got: {}",
        stderr
    );

    let (stdout, _, _) = run_dps(&config_path, &["stats"]);
    assert!(stdout.contains("Entries:     0"), "got: {}", stdout);
}

#[test]
fn test_remove_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    let mine = pack(&config_path, "mine.json");
    run_dps(&config_path, &["put", &mine]);

    let (stdout, _, success) = run_dps(&config_path, &["remove", "me"]);
    assert!(success);
    assert!(stdout.contains("removed: 1"));

    let (stdout, _, success) = run_dps(&config_path, &["remove", "me"]);
    assert!(success, "removing a missing entry must not fail");
    assert!(stdout.contains("removed: 0"));
}

#[test]
fn test_sources_and_unload() {
    let (_tmp, config_path) = setup_test_env();
    let products = pack(&config_path, "products.json");
    run_dps(&config_path, &["load", "--file", &products]);

    let (stdout, _, success) = run_dps(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("products.json"), "got: {}", stdout);

    let (stdout, _, success) = run_dps(&config_path, &["unload", "--file", &products]);
    assert!(success);
    assert!(stdout.contains("entries removed: 3"), "got: {}", stdout);

    let (stdout, _, _) = run_dps(&config_path, &["sources"]);
    assert!(stdout.contains("No sources loaded."));
}

#[test]
fn test_export_round_trip() {
    let (tmp, config_path) = setup_test_env();
    let mine = pack(&config_path, "mine.json");
    run_dps(&config_path, &["put", &mine]);

    let output = tmp.path().join("export.json");
    let (_, stderr, success) = run_dps(
        &config_path,
        &["export", "--output", output.to_str().unwrap()],
    );
    assert!(success, "export failed: {}", stderr);

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let ids: Vec<&str> = exported
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["@id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["me", "_:b1"]);
}

#[test]
fn test_db_flag_overrides_config() {
    let (tmp, config_path) = setup_test_env();
    let other = tmp.path().join("other.sqlite");

    let (_, _, success) = run_dps(&config_path, &["--db", other.to_str().unwrap(), "init"]);
    assert!(success);
    assert!(other.exists());
    assert!(!tmp.path().join("data/dps.sqlite").exists());
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn petql_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("petql"));
    cmd.env_remove("PETQL_CONFIG").env_remove("RUST_LOG");
    cmd
}

// =============================================================================
// Basic CLI
// =============================================================================

#[test]
fn test_help() {
    petql_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("GraphQL"));
}

#[test]
fn test_version() {
    petql_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("petql"));
}

#[test]
fn test_schema_prints_sdl() {
    petql_cmd()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("type Pet {"))
        .stdout(predicate::str::contains("addUser(name: String!): User"));
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    let content = fs::read_to_string(temp_dir.path().join(".petql.yml")).unwrap();
    assert!(content.contains("port: 3000"));
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success();

    petql_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// =============================================================================
// Query / Mutate
// =============================================================================

#[test]
fn test_query_sample_data() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .args(["query", "{ pet(id: 7) { name species user { name } } }"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Juliette\""))
        .stdout(predicate::str::contains("\"Ben\""));
}

#[test]
fn test_query_with_variables_and_operation() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .args([
            "query",
            "query A { pets { id } } query B($id: Int) { user(id: $id) { name } }",
            "--operation",
            "B",
            "--variables",
            r#"{"id": 2}"#,
        ])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Lydia\""));
}

#[test]
fn test_query_invalid_variables_json() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .args(["query", "{ users { id } }", "--variables", "{not json"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Variables must be a JSON object"));
}

#[test]
fn test_mutate_wraps_body() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .args(["mutate", "addUser(name: \"Zoe\") { id name }"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": 4"))
        .stdout(predicate::str::contains("\"Zoe\""));
}

#[test]
fn test_mutate_missing_argument_reports_field_error() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .args(["mutate", "addUser { id }"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("is required, but it was not provided"))
        .stdout(predicate::str::contains("\"addUser\": null"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_empty_seed_from_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".petql.yml"), "data:\n  seed: empty\n").unwrap();

    petql_cmd()
        .args(["query", "{ users { id } }"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"users\": []"));
}

#[test]
fn test_seed_file_via_config_flag() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("seed.json"),
        r#"{"users": [{"id": 1, "name": "Ada"}], "pets": [{"id": 1, "species": "owl", "userId": 1}]}"#,
    )
    .unwrap();
    let config_path = temp_dir.path().join("custom.yml");
    fs::write(&config_path, "data:\n  seed_file: seed.json\n").unwrap();

    petql_cmd()
        .arg("--config")
        .arg(&config_path)
        .args(["query", "{ pets { species user { name } } }"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"owl\""))
        .stdout(predicate::str::contains("\"Ada\""));
}

#[test]
fn test_missing_config_flag_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    petql_cmd()
        .arg("--config")
        .arg(temp_dir.path().join("nope.yml"))
        .args(["query", "{ users { id } }"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load petql configuration"));
}

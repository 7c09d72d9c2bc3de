use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pqrs_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pqrs");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("historico_pqrs.csv"),
        "\u{feff}Número de Radicado;Nombre;Fecha de Radicación;Descripción;Clasificación;Estado;Dependencia;Barrio\n\
         2024-00451;Ana María Gómez;15/01/2024;Reparación de la vía principal;Queja;Resuelta;Secretaría de Infraestructura;El Centro\n\
         2024-00452;Carlos Pérez;03/02/2024;Solicitud de poda de árboles;Petición;Pendiente;Secretaría de Ambiente;La Floresta\n\
         2024-00453;Ana Lucía Torres;20/02/2024;Queja por ruido nocturno en la vía;Queja;En trámite;Secretaría de Gobierno;El Centro\n\
         2023-00990;Pedro Gómez;28/12/2023;Reclamo por cobro de alumbrado;Reclamo;Resuelta;Infraestructura;\n\
         2024-00460;;;Sugerencia para mejorar la señalización;Sugerencia;Pendiente;;San José\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[source]
dir = '{}'

[retrieval]
default_limit = 10
max_limit = 50
"#,
        data_dir.display()
    );

    let config_path = config_dir.join("pqrs.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pqrs(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pqrs_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pqrs binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn run_json(config_path: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let (stdout, stderr, success) = run_pqrs(config_path, &full);
    assert!(success, "{:?} failed: stdout={}, stderr={}", args, stdout, stderr);
    serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("invalid JSON from {:?}: {}\n{}", args, e, stdout))
}

#[test]
fn test_sources_lists_selected_file() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_pqrs(&config_path, &["sources"]);
    assert!(success, "sources failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("delimited"));
    assert!(stdout.contains("SELECTED"));
    assert!(stdout.contains("historico_pqrs.csv"));
}

#[test]
fn test_load_reports_records() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_pqrs(&config_path, &["load"]);
    assert!(success, "load failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("source kind: delimited"));
    assert!(stdout.contains("records: 5"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_load_json() {
    let (_tmp, config_path) = setup_test_env();
    let report = run_json(&config_path, &["load"]);
    assert_eq!(report["record_count"], 5);
    assert_eq!(report["source_kind"], "delimited");
    assert_eq!(report["generation_id"], 1);
}

#[test]
fn test_query_routes_identifier() {
    let (_tmp, config_path) = setup_test_env();
    let response = run_json(&config_path, &["query", "2024-00452"]);
    assert_eq!(response["strategy"], "exact_lookup");
    assert_eq!(response["records"][0]["case_id"], "2024-00452");
    assert_eq!(response["records"][0]["filed_date"], "2024-02-03");
}

#[test]
fn test_query_aggregate_prints_statistics() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_pqrs(&config_path, &["query", "¿Cuántas PQRS hay?"]);
    assert!(success);
    assert!(stdout.contains("strategy: aggregate"));
    assert!(stdout.contains("Records:     5"));
}

#[test]
fn test_query_hint_overrides_classifier() {
    let (_tmp, config_path) = setup_test_env();
    let response = run_json(&config_path, &["query", "gomez", "--hint", "name"]);
    assert_eq!(response["strategy"], "name_match");
    assert_eq!(response["matched_count"], 2);
}

#[test]
fn test_get_prints_record() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_pqrs(&config_path, &["get", "2024-00453"]);
    assert!(success, "get failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Ana Lucía Torres"));
    assert!(stdout.contains("ruido nocturno"));
}

#[test]
fn test_get_unknown_id_exits_nonzero() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pqrs(&config_path, &["get", "2099-00001"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_text_search_reports_truncation() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_pqrs(&config_path, &["text", "vía", "--limit", "1"]);
    assert!(success);
    assert!(stdout.contains("showing 1 of 2 matches"));
}

#[test]
fn test_range_rejects_inverted_dates() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pqrs(&config_path, &["range", "31/12/2024", "01/01/2024"]);
    assert!(!success);
    assert!(stderr.contains("invalid request"));
}

#[test]
fn test_range_is_inclusive() {
    let (_tmp, config_path) = setup_test_env();
    let page = run_json(&config_path, &["range", "2024-01-15", "2024-02-03"]);
    assert_eq!(page["matched_count"], 2);
}

#[test]
fn test_filter_with_sort_and_summary() {
    let (_tmp, config_path) = setup_test_env();
    let page = run_json(
        &config_path,
        &["filter", "--status", "pendiente", "--sort-by", "case_id", "--order", "asc"],
    );
    assert_eq!(page["matched_count"], 2);
    assert_eq!(page["records"][0]["case_id"], "2024-00452");
    assert_eq!(page["records"][1]["case_id"], "2024-00460");
    assert_eq!(page["summary"]["total_matched"], 2);
    assert_eq!(page["summary"]["earliest_filed"], "2024-02-03");
    assert_eq!(page["summary"]["latest_filed"], "2024-02-03");
    assert_eq!(page["summary"]["top_neighborhoods"][0]["key"], "La Floresta");
}

#[test]
fn test_help_queries_needs_no_config() {
    let tmp = TempDir::new().unwrap();
    let (stdout, stderr, success) = run_pqrs(&tmp.path().join("absent.toml"), &["help-queries"]);
    assert!(success, "help-queries failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("exact_lookup"));
    assert!(stdout.contains("Sort fields: case_id"));
    assert!(stdout.contains("neighborhood"));
}

#[test]
fn test_query_ayuda_routes_to_help() {
    let (_tmp, config_path) = setup_test_env();
    let response = run_json(&config_path, &["query", "ayuda"]);
    assert_eq!(response["strategy"], "help");
    assert_eq!(response["matched_count"], 0);
    assert_eq!(response["help"]["strategies"][0]["strategy"], "exact_lookup");

    let (stdout, _, success) = run_pqrs(&config_path, &["query", "instrucciones"]);
    assert!(success);
    assert!(stdout.contains("strategy: help"));
    assert!(stdout.contains("Filter criteria"));
}

#[test]
fn test_limit_above_maximum_is_clamped() {
    let (_tmp, config_path) = setup_test_env();
    let page = run_json(&config_path, &["filter", "--limit", "500"]);
    assert_eq!(page["matched_count"], 5);
}

#[test]
fn test_stats_subset() {
    let (_tmp, config_path) = setup_test_env();
    let stats = run_json(&config_path, &["stats", "--neighborhood", "el centro"]);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["by_classification"][0]["key"], "Queja");
}

#[test]
fn test_suggest() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_pqrs(&config_path, &["suggest", "pe"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["Pendiente", "Petición"]);

    let (stdout, _, success) = run_pqrs(&config_path, &["suggest", "p"]);
    assert!(success);
    assert!(stdout.contains("No suggestions."));
}

#[test]
fn test_export_csv() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("out").join("quejas.csv");
    let (stdout, stderr, success) = run_pqrs(
        &config_path,
        &[
            "export",
            "--classification",
            "queja",
            "--format",
            "csv",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(success, "export failed: stdout={}, stderr={}", stdout, stderr);

    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("case_id,requester_name,filed_date"));
    assert!(lines[1].starts_with("2024-00451,"));
}

#[test]
fn test_export_json_to_stdout() {
    let (_tmp, config_path) = setup_test_env();
    let data = run_json(&config_path, &["export"]);
    assert_eq!(data["count"], 5);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_pqrs(&tmp.path().join("nope.toml"), &["load"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_missing_source_dir_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("pqrs.toml");
    fs::write(&config_path, "[source]\ndir = 'does-not-exist'\n").unwrap();
    let (_, stderr, success) = run_pqrs(&config_path, &["load"]);
    assert!(!success);
    assert!(stderr.contains("no usable source"));
}

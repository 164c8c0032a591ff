mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Reply, TestServer, local_client, write_catalog, write_pattern_table};
use gibs_layer_validator_lib::application::coordinator::{ProbeCoordinator, ProbeSettings};
use gibs_layer_validator_lib::commands::run_validate;
use gibs_layer_validator_lib::domain::layer::Body;
use gibs_layer_validator_lib::domain::pattern::PatternTable;
use gibs_layer_validator_lib::domain::probe_result::ProbeStatus;
use gibs_layer_validator_lib::domain::value_objects::{Credential, LayerName};
use gibs_layer_validator_lib::infrastructure::catalog::load_pattern_table;
use gibs_layer_validator_lib::infrastructure::config::AppConfig;
use gibs_layer_validator_lib::infrastructure::prober::HttpProber;
use serde_json::Value;
use tempfile::TempDir;

fn config_for(dir: &TempDir, server: &TestServer, layers: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.layers_file = write_catalog(dir.path(), layers);
    config.paths.patterns_file = write_pattern_table(dir.path(), &server.base_url());
    config.paths.output_file = dir.path().join("validated.json");
    config.probe.concurrency_limit = 2;
    config.probe.timeout_seconds = 5;
    config.probe.use_system_proxy = false;
    config
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn catalog_is_split_into_valid_and_invalid() {
    let server = TestServer::start(|target| {
        if target.starts_with("/BlueMarble_ShadedRelief/") {
            Reply::Status(200)
        } else {
            Reply::Status(404)
        }
    })
    .await;
    let dir = TempDir::new().unwrap();
    let config = config_for(
        &dir,
        &server,
        &["BlueMarble_ShadedRelief", "MODIS_Terra_CorrectedReflectance_TrueColor"],
    );

    let (outcome, written) = run_validate(&config, None).await.unwrap();

    assert_eq!(outcome.valid_layers, vec![LayerName::from("BlueMarble_ShadedRelief")]);
    assert_eq!(outcome.report.invalid_details.len(), 1);
    assert_eq!(outcome.report.invalid_details[0].status_code, ProbeStatus::Http(404));

    assert_eq!(read_json(&written.valid_layers), serde_json::json!(["BlueMarble_ShadedRelief"]));
    assert_eq!(written.report, dir.path().join("validated_report.json"));

    let report = read_json(&written.report);
    assert_eq!(report["total_layers"], 2);
    assert_eq!(report["valid_layers"], 1);
    assert_eq!(report["invalid_layers"], 1);
    assert_eq!(report["invalid_details"][0]["layer"], "MODIS_Terra_CorrectedReflectance_TrueColor");
    assert_eq!(report["invalid_details"][0]["status_code"], 404);

    // Static layers are probed with the "default" time
    assert!(
        server
            .requests()
            .iter()
            .any(|r| r.starts_with("/BlueMarble_ShadedRelief/default/default/"))
    );
}

#[tokio::test]
async fn credential_never_reaches_the_outputs() {
    let server = TestServer::start(|_| Reply::Status(404)).await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &server, &["Coastlines_15m", "VIIRS_SNPP_DayNightBand"]);

    let (outcome, written) = run_validate(&config, Credential::new("SECRET123")).await.unwrap();

    assert_eq!(outcome.report.invalid_layers, 2);
    for detail in &outcome.report.invalid_details {
        assert!(!detail.detail.contains("SECRET123"));
        assert!(detail.detail.contains("token=[TOKEN]"));
    }
    let report_text = std::fs::read_to_string(&written.report).unwrap();
    assert!(!report_text.contains("SECRET123"));

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.ends_with("?token=SECRET123")));
}

#[tokio::test]
async fn hanging_layer_times_out_without_stalling_the_batch() {
    let server = TestServer::start(|target| {
        if target.contains("Stuck_Layer") {
            Reply::Hang
        } else {
            Reply::Status(200)
        }
    })
    .await;
    let dir = TempDir::new().unwrap();
    let table = load_pattern_table(&write_pattern_table(dir.path(), &server.base_url()))
        .await
        .unwrap();

    let timeout = Duration::from_millis(300);
    let prober = Arc::new(HttpProber::new(local_client(timeout), None));
    let coordinator = ProbeCoordinator::new(
        Arc::new(table),
        Body::Earth,
        prober,
        ProbeSettings::new(3, timeout),
    );

    let layers: Vec<LayerName> = ["Fast_A", "Stuck_Layer", "Fast_B", "Fast_C"]
        .into_iter()
        .map(LayerName::from)
        .collect();
    let outcome = coordinator.run_all(&layers).await;

    assert_eq!(outcome.report.total_layers, 4);
    assert_eq!(outcome.valid_layers.len(), 3);
    assert_eq!(outcome.report.invalid_details[0].layer.as_str(), "Stuck_Layer");
    assert_eq!(outcome.report.invalid_details[0].status_code, ProbeStatus::Timeout);
}

#[tokio::test]
async fn missing_pattern_file_falls_back_to_builtin_table() {
    let dir = TempDir::new().unwrap();
    let table = load_pattern_table(&dir.path().join("absent.json")).await.unwrap();
    assert_eq!(table, PatternTable::builtin());
}

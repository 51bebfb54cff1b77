// Integration tests for `RemoteLineSink` using wiremock.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sl_core::{
    EmitOutcome, Hardware, HardwareKind, HardwareTree, LoggerCore, RemoteLineSink,
    RemoteSinkConfig, SensorKind, SensorTopology, TickOutcome,
};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn topology() -> Arc<SensorTopology> {
    let board = Hardware::with_device("PRIME X570-PRO", HardwareKind::Mainboard, 0).unwrap();
    let cpu = Hardware::with_device("Ryzen 7 5800X", HardwareKind::Cpu, 0).unwrap();
    let temp = cpu.new_sensor("Tctl", SensorKind::Temperature, 0);
    let power = cpu.new_sensor("Package", SensorKind::Power, 0);
    temp.set_value(Some(45.0));
    power.set_value(Some(12.5));
    cpu.push_sensor(temp);
    cpu.push_sensor(power);

    let tree = Arc::new(HardwareTree::with_roots(vec![board, cpu]));
    Arc::new(SensorTopology::new(tree))
}

fn write_config(path: &Path, host: &str, port: u16) {
    let config = RemoteSinkConfig {
        url: host.to_string(),
        port,
        ..RemoteSinkConfig::default()
    };
    config.save(path).unwrap();
}

fn sink(dir: &TempDir) -> RemoteLineSink {
    RemoteLineSink::with_timeout(
        dir.path().join("remote.json"),
        dir.path().join("fallback.log"),
        Duration::from_secs(2),
    )
    .unwrap()
    .with_computer_name("test-box")
}

async fn server_with_status(status: u16) -> MockServer {
    let server = MockServer::start().await;
    let mut response = ResponseTemplate::new(status);
    if status >= 400 {
        response = response.set_body_string("unable to parse");
    }
    Mock::given(method("POST"))
        .and(path("/write"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

// ── Delivery ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delivered_payload_leaves_no_local_file() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .and(query_param("db", "openhwmon"))
        .and(query_param("source", "test_box"))
        .and(header("content-type", "text/plain; charset=utf-8"))
        .and(body_string_contains("power,computer=test_box total=12.5"))
        .and(body_string_contains(" Tctl=45\n"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    write_config(&dir.path().join("remote.json"), "127.0.0.1", server.address().port());
    let sink = sink(&dir);

    assert_eq!(sink.send(&topology()).await, EmitOutcome::Delivered);
    assert!(!dir.path().join("fallback.log").exists());
}

#[tokio::test]
async fn test_credentials_sent_as_query_params() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .and(query_param("u", "writer"))
        .and(query_param("p", "hunter2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = RemoteSinkConfig {
        url: "http://127.0.0.1".to_string(),
        port: server.address().port(),
        username: "writer".to_string(),
        password: "hunter2".to_string(),
        ..RemoteSinkConfig::default()
    };
    config.save(&dir.path().join("remote.json")).unwrap();

    assert_eq!(sink(&dir).send(&topology()).await, EmitOutcome::Delivered);
}

// ── Fallback ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejection_appends_payload_once() {
    let dir = TempDir::new().unwrap();
    let server = server_with_status(400).await;
    let config_path = dir.path().join("remote.json");
    write_config(&config_path, "127.0.0.1", server.address().port());
    let config_before = fs::read_to_string(&config_path).unwrap();

    let sink = sink(&dir);
    assert_eq!(sink.send(&topology()).await, EmitOutcome::Rejected);

    let contents = fs::read_to_string(dir.path().join("fallback.log")).unwrap();
    assert!(contents.starts_with("motherboard,computer=test_box,sensor=name,device=PRIME_X570_PRO,"));
    assert_eq!(contents.matches("total=12.5").count(), 1);
    assert!(!contents.contains("Error="));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), config_before);
}

#[tokio::test]
async fn test_server_error_records_diagnostic() {
    let dir = TempDir::new().unwrap();
    let server = server_with_status(503).await;
    write_config(&dir.path().join("remote.json"), "127.0.0.1", server.address().port());

    assert_eq!(sink(&dir).send(&topology()).await, EmitOutcome::TransportFailed);

    let contents = fs::read_to_string(dir.path().join("fallback.log")).unwrap();
    let first = contents.lines().next().unwrap();
    assert!(first.starts_with("Error="));
    assert!(first.contains("503"));
    assert!(contents.contains("power,computer=test_box total=12.5\n"));
}

#[tokio::test]
async fn test_connection_refused_records_diagnostic() {
    let dir = TempDir::new().unwrap();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    write_config(&dir.path().join("remote.json"), "127.0.0.1", port);

    assert_eq!(sink(&dir).send(&topology()).await, EmitOutcome::TransportFailed);

    let contents = fs::read_to_string(dir.path().join("fallback.log")).unwrap();
    assert!(contents.starts_with("Error="));
    assert_eq!(contents.matches("motherboard,").count(), 1);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    write_config(&dir.path().join("remote.json"), "127.0.0.1", server.address().port());

    let sink = RemoteLineSink::with_timeout(
        dir.path().join("remote.json"),
        dir.path().join("fallback.log"),
        Duration::from_millis(200),
    )
    .unwrap();

    assert_eq!(sink.send(&topology()).await, EmitOutcome::TransportFailed);
    let contents = fs::read_to_string(dir.path().join("fallback.log")).unwrap();
    assert!(contents.starts_with("Error="));
}

// ── Configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn test_partial_config_uses_per_key_defaults() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/write"))
        .and(query_param("db", "openhwmon"))
        .and(query_param("source", "test_box"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config_path = dir.path().join("remote.json");
    let document = format!(r#"{{"url": "127.0.0.1", "port": {}}}"#, server.address().port());
    fs::write(&config_path, &document).unwrap();

    assert_eq!(sink(&dir).send(&topology()).await, EmitOutcome::Delivered);
    assert_eq!(fs::read_to_string(&config_path).unwrap(), document);
    assert!(!dir.path().join("fallback.log").exists());
}

#[tokio::test]
async fn test_config_edits_apply_on_next_tick() {
    let dir = TempDir::new().unwrap();
    let rejecting = server_with_status(400).await;
    let accepting = server_with_status(204).await;
    let config_path = dir.path().join("remote.json");

    let topology = topology();
    let mut logger = LoggerCore::new(topology, sink(&dir)).with_interval(Duration::from_secs(1));
    let start = chrono::Local::now();

    write_config(&config_path, "127.0.0.1", rejecting.address().port());
    assert_eq!(
        logger.tick(start).await,
        TickOutcome::Emitted(EmitOutcome::Rejected)
    );

    write_config(&config_path, "127.0.0.1", accepting.address().port());
    assert_eq!(
        logger.tick(start + chrono::Duration::seconds(1)).await,
        TickOutcome::Emitted(EmitOutcome::Delivered)
    );
}

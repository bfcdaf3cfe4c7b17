use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use thirdbrain::config::Config;
use thirdbrain::storage::SledSnapshotStore;

#[allow(dead_code)]
pub fn create_temp_store() -> (SledSnapshotStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    let store =
        SledSnapshotStore::new_with_path(db_path).expect("failed to create sled store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Configuration pointing the client at a mock server
#[allow(dead_code)]
pub fn config_for_server(base_url: &str) -> Config {
    let mut config = Config::default();
    config.model.base_url = base_url.to_string();
    config.model.name = "test-model".to_string();
    config.formatting.system_prompt = "You are a test assistant.".to_string();
    config
}

/// Base URL of a local port with nothing listening on it
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind ephemeral port");
    let addr = listener.local_addr().expect("failed to read local address");
    drop(listener);
    format!("http://{}", addr)
}

/// Newline-delimited JSON body streaming `fragments` then a final done line
#[allow(dead_code)]
pub fn ndjson_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let line = serde_json::json!({
            "message": {"role": "assistant", "content": fragment},
            "done": false
        });
        body.push_str(&line.to_string());
        body.push('\n');
    }
    body.push_str(
        &serde_json::json!({"message": {"role": "assistant", "content": ""}, "done": true})
            .to_string(),
    );
    body.push('\n');
    body
}

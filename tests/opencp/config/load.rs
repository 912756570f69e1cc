use std::env;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serial_test::serial;
use tempfile::NamedTempFile;

use opencp::opencp::config::{ConfigError, Setting, ShimConfig};
use opencp::opencp::logger::LogFormat;

const FULL_CONFIG: &str = r#"
ApiResource:
  - Name: firewalls
    SingularName: firewall
    Kind: Firewall
    Namespaced: true
    Verbs: [get, list, create, delete]
    Version: v1alpha1
GrpcServer:
  Host: http://control-plane:9000
  Timeout: 1500ms
Server:
  Listen: 127.0.0.1:4001
  MetricsListen: 127.0.0.1:9101
  AdvertiseAddress: api.opencp.example:443
Auth:
  Enabled: false
  Tokens: [alpha, beta]
Log:
  Format: json
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn loads_every_section() {
    let file = write_config(FULL_CONFIG);
    let config = ShimConfig::load(file.path()).expect("config loads");

    assert_eq!(config.api_resources[0].kind, "Firewall");
    assert!(config.uses_remote_backend());
    assert_eq!(config.backend.timeout().unwrap(), Duration::from_millis(1500));
    assert_eq!(config.server.listen_addr().unwrap().port(), 4001);
    assert_eq!(config.server.metrics_addr().unwrap().unwrap().port(), 9101);
    assert_eq!(
        config.server.advertise_address.as_deref(),
        Some("api.opencp.example:443")
    );
    assert!(!config.auth.enabled);
    assert_eq!(config.auth.tokens, ["alpha", "beta"]);
    assert_eq!(config.log.format().unwrap(), LogFormat::Json);
}

#[test]
#[serial]
fn empty_path_is_rejected() {
    let err = ShimConfig::load(Path::new("")).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyPath));
    assert_eq!(err.to_string(), "config file name is empty");
}

#[test]
#[serial]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.yaml");
    let err = ShimConfig::load(&path).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("config file {} does not exist", path.display())
    );
}

#[test]
#[serial]
fn malformed_yaml_is_a_parse_error() {
    let file = write_config("ApiResource: [unterminated\n");
    let err = ShimConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err
        .to_string()
        .starts_with(&format!("error parsing config file {}", file.path().display())));
}

#[test]
#[serial]
fn invalid_listen_address_fails_validation() {
    let file = write_config("Server:\n  Listen: not-an-address\n");
    let err = ShimConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("Server.Listen"));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let file = write_config(FULL_CONFIG);
    env::set_var(Setting::Listen.env_var(), "127.0.0.1:4999");
    env::set_var(Setting::BackendHost.env_var(), "http://elsewhere:9000");
    env::set_var(Setting::LogFormat.env_var(), "text");
    let result = ShimConfig::load(file.path());
    env::remove_var(Setting::Listen.env_var());
    env::remove_var(Setting::BackendHost.env_var());
    env::remove_var(Setting::LogFormat.env_var());

    let config = result.expect("config loads");
    assert_eq!(config.server.listen, "127.0.0.1:4999");
    assert_eq!(config.backend.host, "http://elsewhere:9000");
    assert_eq!(config.log.format().unwrap(), LogFormat::Text);
}

#[test]
#[serial]
fn config_path_follows_environment() {
    env::remove_var(Setting::ConfigFile.env_var());
    assert_eq!(Setting::config_path(), Path::new("config.yaml"));
    env::set_var(Setting::ConfigFile.env_var(), "/etc/opencp/shim.yaml");
    let path = Setting::config_path();
    env::remove_var(Setting::ConfigFile.env_var());
    assert_eq!(path, Path::new("/etc/opencp/shim.yaml"));
}

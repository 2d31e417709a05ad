use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tinyhttp::config::{AcceptErrorPolicy, Config};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.backlog, 5);
    assert_eq!(cfg.limits.max_request_size, 1024);
    assert_eq!(cfg.limits.max_response_head_size, 1024);
    assert_eq!(cfg.limits.max_connections, None);
    assert_eq!(cfg.timeouts.read(), None);
    assert_eq!(cfg.timeouts.write(), None);
    assert_eq!(cfg.accept_errors, AcceptErrorPolicy::Fatal);
    assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:8080");
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        r#"
server:
  address: 0.0.0.0
  port: 3000
limits:
  max_request_size: 4096
  max_connections: 64
timeouts:
  read_ms: 5000
accept_errors: continue
"#,
    )
    .unwrap();

    assert_eq!(cfg.listen_addr().to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.server.backlog, 5);
    assert_eq!(cfg.limits.max_request_size, 4096);
    assert_eq!(cfg.limits.max_response_head_size, 1024);
    assert_eq!(cfg.limits.max_connections, Some(64));
    assert_eq!(cfg.timeouts.read(), Some(Duration::from_millis(5000)));
    assert_eq!(cfg.timeouts.write(), None);
    assert_eq!(cfg.accept_errors, AcceptErrorPolicy::Continue);
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml_str("{}").unwrap();
    assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:8080");
}

#[test]
fn test_config_rejects_zero_limits() {
    assert!(Config::from_yaml_str("limits:\n  max_request_size: 0\n").is_err());
    assert!(Config::from_yaml_str("limits:\n  max_connections: 0\n").is_err());
}

#[test]
fn test_config_rejects_unknown_policy() {
    assert!(Config::from_yaml_str("accept_errors: sometimes\n").is_err());
}

#[test]
fn test_zero_timeout_means_none() {
    let cfg = Config::from_yaml_str("timeouts:\n  write_ms: 0\n").unwrap();
    assert_eq!(cfg.timeouts.write(), None);
}

#[test]
fn test_apply_listen_override() {
    let mut cfg = Config::default();
    cfg.apply_listen("0.0.0.0:5000").unwrap();

    assert!(cfg.listen_addr().to_string().starts_with("0.0.0.0"));
    assert_eq!(cfg.server.port, 5000);
}

#[test]
fn test_apply_listen_rejects_garbage() {
    let mut cfg = Config::default();
    assert!(cfg.apply_listen("localhost").is_err());
    assert_eq!(cfg.server.port, 8080);
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("tinyhttp-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "server:\n  port: 9090\n").unwrap();

    let cfg = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.server.port, 9090);
}

#[test]
fn test_config_from_missing_file() {
    assert!(Config::from_file("/nonexistent/tinyhttp.yaml").is_err());
}

#[test]
fn test_config_load_from_env() {
    // Only this test touches the environment.
    unsafe {
        std::env::remove_var("TINYHTTP_CONFIG");
        std::env::set_var("LISTEN", "127.0.0.1:8000");
    }
    let cfg = Config::load().unwrap();
    unsafe {
        std::env::remove_var("LISTEN");
    }

    assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:8000");
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr(), cfg2.listen_addr());
}

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use pixio_hub::access::{AccessRole, LinkAccess};
use pixio_hub::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
hub:
  listen: "0.0.0.0:8080"
seed:
  canvases:
    - id: "c1"
      owner_id: "u1"
      width: 8
      height: 8
      acces: [] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.error_code().as_str(), "UNEXPECTED_ERROR");
    assert!(err.to_string().contains("invalid yaml"));
}

#[test]
fn ok_minimal_config_uses_defaults() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.hub.listen, "0.0.0.0:8080");
    assert_eq!(cfg.hub.handshake_timeout_ms, 10_000);
    assert_eq!(cfg.hub.write_timeout_ms, 10_000);
    assert_eq!(cfg.hub.room_idle_ms, 180_000);
    assert_eq!(cfg.hub.outbound_queue, 256);
    assert!(cfg.hub.allowed_origins.is_empty());
    assert!(cfg.auth.access_token_secret.is_none());
    assert!(cfg.seed.canvases.is_empty());
}

#[test]
fn seed_canvases_parse_roles_and_link_access() {
    let ok = r#"
version: 1
seed:
  canvases:
    - id: "c1"
      owner_id: "u1"
      width: 16
      height: 8
      link_access: with_link
      link_role: editor
      access:
        - { user_id: "u2", role: viewer }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let c = &cfg.seed.canvases[0];
    assert_eq!(c.link_access, LinkAccess::WithLink);
    assert_eq!(c.link_role, AccessRole::Editor);
    assert_eq!(c.access[0].role, AccessRole::Viewer);
}

#[test]
fn rejects_unsupported_version() {
    assert!(config::load_from_str("version: 2\n").is_err());
}

#[test]
fn rejects_idle_not_above_ping() {
    let bad = r#"
version: 1
hub:
  ping_interval_ms: 20000
  idle_timeout_ms: 20000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("idle_timeout_ms"));
}

#[test]
fn rejects_zero_queue_and_zero_room_idle() {
    assert!(config::load_from_str("version: 1\nhub:\n  outbound_queue: 0\n").is_err());
    assert!(config::load_from_str("version: 1\nhub:\n  room_idle_ms: 0\n").is_err());
}

#[test]
fn rejects_owner_link_role_and_empty_dimensions() {
    let owner_link = r#"
version: 1
seed:
  canvases:
    - { id: "c1", owner_id: "u1", width: 4, height: 4, link_role: owner }
"#;
    assert!(config::load_from_str(owner_link).is_err());

    let flat = r#"
version: 1
seed:
  canvases:
    - { id: "c1", owner_id: "u1", width: 0, height: 4 }
"#;
    assert!(config::load_from_str(flat).is_err());
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../pixio.yaml");
    let cfg = config::load_from_file(path).expect("sample config must load");
    assert_eq!(cfg.seed.canvases.len(), 2);
}

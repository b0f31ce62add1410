use super::*;

const SAMPLE: &str = r#"
defaults {
  default_user = "deploy"
  max_connections = 3
}

host "web1" {
  hostname = "10.0.0.1"
  port = 2222
}

host "web2" {
  hostname = "10.0.0.2"
}

group "web" {
  members = ["web1", "web2"]
}

task "build" {
  on = "local"
  commands = [
    { kind = "shell", cmd = "make build" },
  ]
}

task "deploy" {
  deps = ["build"]
  on = "web"
  strategy = "rolling"
  batch_size = 1
  commands = [
    { kind = "shell", cmd = "systemctl restart app" },
  ]
}
"#;

#[test]
fn loads_hosts_groups_tasks_and_defaults() {
    let config = load_str(SAMPLE).expect("loads");
    assert_eq!(config.hosts.len(), 2);
    assert_eq!(config.groups.len(), 1);
    assert_eq!(config.tasks.len(), 2);
    assert_eq!(config.defaults.default_user, "deploy");
    assert_eq!(config.defaults.max_connections, 3);

    let web1 = &config.hosts["web1"];
    assert_eq!(web1.hostname, "10.0.0.1");
    assert_eq!(web1.port, Some(2222));
}

#[test]
fn task_on_local_resolves_to_target_local() {
    let config = load_str(SAMPLE).expect("loads");
    assert_eq!(config.tasks["build"].on, Target::Local);
}

#[test]
fn task_on_group_name_resolves_to_target_group() {
    let config = load_str(SAMPLE).expect("loads");
    assert_eq!(config.tasks["deploy"].on, Target::Group("web".into()));
}

#[test]
fn unknown_on_target_is_reported() {
    let hcl = r#"
task "t" {
  on = "nowhere"
  commands = []
}
"#;
    let err = load_str(hcl).unwrap_err();
    assert!(matches!(err, LoadError::AmbiguousTarget { .. }));
}

#[test]
fn unknown_strategy_is_reported() {
    let hcl = r#"
task "t" {
  on = "local"
  strategy = "yolo"
  commands = []
}
"#;
    let err = load_str(hcl).unwrap_err();
    assert!(matches!(err, LoadError::UnknownStrategy { .. }));
}

#[test]
fn group_referencing_undefined_host_fails_core_validation() {
    let hcl = r#"
group "web" {
  members = ["ghost"]
}
"#;
    let err = load_str(hcl).unwrap_err();
    assert!(matches!(err, LoadError::Validation(_)));
}

#[test]
fn load_file_reads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nexus.hcl");
    std::fs::write(&path, SAMPLE).expect("write");
    let config = load_file(&path).expect("loads");
    assert_eq!(config.tasks.len(), 2);
}

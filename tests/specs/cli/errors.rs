use crate::prelude::*;

#[test]
fn missing_runbook_reports_a_load_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("does-not-exist.hcl");

    let output = nexus_cmd().arg("-c").arg(&missing).arg("plan").arg("build").output().expect("run nexus");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading runbook"), "stderr: {stderr}");
}

#[test]
fn dependency_cycle_is_reported_rather_than_hanging() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hcl = r#"
task "a" {
  deps = ["b"]
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
task "b" {
  deps = ["a"]
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
"#;
    let runbook = write_runbook(dir.path(), hcl);

    let output = nexus_cmd().arg("-c").arg(&runbook).arg("plan").arg("a").output().expect("run nexus");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cycle") || stderr.contains("Cycle"), "stderr: {stderr}");
}

#[test]
fn task_targeting_an_undefined_host_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hcl = r#"
task "deploy" {
  on = "ghost"
  commands = [{ kind = "shell", cmd = "true" }]
}
"#;
    let runbook = write_runbook(dir.path(), hcl);

    let output = nexus_cmd().arg("-c").arg(&runbook).arg("run").arg("deploy").output().expect("run nexus");

    assert!(!output.status.success());
}

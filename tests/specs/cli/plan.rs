use crate::prelude::*;

const DIAMOND: &str = r#"
task "base" {
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
task "left" {
  deps = ["base"]
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
task "right" {
  deps = ["base"]
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
task "join" {
  deps = ["left", "right"]
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
"#;

#[test]
fn plan_reports_phases_without_running_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runbook = write_runbook(dir.path(), DIAMOND);

    let output = nexus_cmd()
        .arg("-c")
        .arg(&runbook)
        .arg("plan")
        .arg("join")
        .output()
        .expect("run nexus");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "phase 0: base\nphase 1: left, right\nphase 2: join\n"
    );
}

#[test]
fn plan_on_an_undefined_task_fails_without_executing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runbook = write_runbook(dir.path(), DIAMOND);

    let output = nexus_cmd()
        .arg("-c")
        .arg(&runbook)
        .arg("plan")
        .arg("missing")
        .output()
        .expect("run nexus");

    assert!(!output.status.success());
}

use crate::prelude::*;

#[test]
fn linear_pipeline_runs_tasks_in_dependency_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("order.log");
    let hcl = format!(
        r#"
task "build" {{
  on = "local"
  commands = [
    {{ kind = "shell", cmd = "echo build >> {log}" }},
  ]
}}

task "test" {{
  deps = ["build"]
  on = "local"
  commands = [
    {{ kind = "shell", cmd = "echo test >> {log}" }},
  ]
}}

task "deploy" {{
  deps = ["test"]
  on = "local"
  commands = [
    {{ kind = "shell", cmd = "echo deploy >> {log}" }},
  ]
}}
"#,
        log = log.display()
    );
    let runbook = write_runbook(dir.path(), &hcl);

    let output = nexus_cmd()
        .arg("-c")
        .arg(&runbook)
        .arg("run")
        .arg("deploy")
        .output()
        .expect("run nexus");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 task(s) run, 3 succeeded, 0 failed"), "stdout: {stdout}");

    let order = std::fs::read_to_string(&log).expect("read log");
    assert_eq!(order.lines().collect::<Vec<_>>(), vec!["build", "test", "deploy"]);
}

#[test]
fn diamond_dependency_runs_fan_out_tasks_before_the_join() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("order.log");
    let hcl = format!(
        r#"
task "base" {{
  on = "local"
  commands = [{{ kind = "shell", cmd = "echo base >> {log}" }}]
}}
task "left" {{
  deps = ["base"]
  on = "local"
  commands = [{{ kind = "shell", cmd = "echo left >> {log}" }}]
}}
task "right" {{
  deps = ["base"]
  on = "local"
  commands = [{{ kind = "shell", cmd = "echo right >> {log}" }}]
}}
task "join" {{
  deps = ["left", "right"]
  on = "local"
  commands = [{{ kind = "shell", cmd = "echo join >> {log}" }}]
}}
"#,
        log = log.display()
    );
    let runbook = write_runbook(dir.path(), &hcl);

    let output = nexus_cmd()
        .arg("-c")
        .arg(&runbook)
        .arg("run")
        .arg("join")
        .output()
        .expect("run nexus");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let order: Vec<String> = std::fs::read_to_string(&log)
        .expect("read log")
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(order[0], "base");
    assert_eq!(order[3], "join");
    assert!(order[1..3].contains(&"left".to_string()));
    assert!(order[1..3].contains(&"right".to_string()));
}

#[test]
fn failing_task_aborts_later_phases_and_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hcl = r#"
task "build" {
  on = "local"
  commands = [{ kind = "shell", cmd = "exit 1" }]
}
task "deploy" {
  deps = ["build"]
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
"#;
    let runbook = write_runbook(dir.path(), hcl);

    let output = nexus_cmd()
        .arg("-c")
        .arg(&runbook)
        .arg("run")
        .arg("deploy")
        .output()
        .expect("run nexus");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("aborted at task build"), "stdout: {stdout}");
}

#[test]
fn json_output_is_parseable_pipeline_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let hcl = r#"
task "build" {
  on = "local"
  commands = [{ kind = "shell", cmd = "true" }]
}
"#;
    let runbook = write_runbook(dir.path(), hcl);

    let output = nexus_cmd()
        .arg("-c")
        .arg(&runbook)
        .arg("-o")
        .arg("json")
        .arg("run")
        .arg("build")
        .output()
        .expect("run nexus");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["tasks_run"], 1);
    assert_eq!(value["status"], "ok");
}

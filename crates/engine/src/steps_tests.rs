use super::*;
use nexus_core::Predicate;
use nexus_ssh::FakeTransport;
use std::collections::HashMap;

fn facts_with_os(family: &str) -> Facts {
    let mut facts = Facts::new();
    facts.insert("os_family", FactValue::Str(family.to_string()));
    facts
}

#[tokio::test]
async fn shell_step_succeeds_and_captures_output() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "echo hi",
        nexus_ssh::CommandOutput {
            stdout: "hi\n".into(),
            stderr: String::new(),
            exit_code: 0,
        },
    );
    let executor = Executor::Remote(&fake);
    let step = Step::Shell {
        cmd: "echo hi".into(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Ok);
    assert_eq!(result.output, "hi\n");
}

#[tokio::test]
async fn shell_step_wraps_sudo() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "sudo -- sh -c 'echo hi'",
        nexus_ssh::CommandOutput {
            stdout: "hi\n".into(),
            stderr: String::new(),
            exit_code: 0,
        },
    );
    let executor = Executor::Remote(&fake);
    let step = Step::Shell {
        cmd: "echo hi".into(),
        sudo: true,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Ok);
}

#[tokio::test]
async fn upload_direct_writes_remote_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = dir.path().join("src.txt");
    tokio::fs::write(&local, b"payload").await.expect("write");

    let fake = FakeTransport::new();
    let executor = Executor::Remote(&fake);
    let step = Step::Upload {
        local_path: local.to_string_lossy().into_owned(),
        remote_path: "/etc/app.conf".into(),
        sudo: false,
        mode: None,
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Ok);
    assert_eq!(fake.seeded_file("/etc/app.conf"), Some(b"payload".to_vec()));
}

#[tokio::test]
async fn download_direct_reads_remote_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = dir.path().join("out.txt");

    let fake = FakeTransport::new();
    fake.seed_file("/etc/app.conf", b"payload");
    let executor = Executor::Remote(&fake);
    let step = Step::Download {
        remote_path: "/etc/app.conf".into(),
        local_path: local.to_string_lossy().into_owned(),
        sudo: false,
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Ok);
    let contents = tokio::fs::read(&local).await.expect("read back");
    assert_eq!(contents, b"payload");
}

#[tokio::test]
async fn wait_for_step_reports_timeout_as_error() {
    let fake = FakeTransport::new().with_exec_error("down");
    let executor = Executor::Remote(&fake);
    let step = Step::WaitFor {
        kind: WaitForKind::Command,
        target: "curl localhost".into(),
        timeout_ms: 60,
        interval_ms: 20,
        expected_status: None,
        expected_body: None,
        when: Predicate::Always,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Error);
    assert_eq!(result.output, "timeout");
}

#[tokio::test]
async fn guarded_command_skips_when_creates_path_exists() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "test -e /opt/marker",
        nexus_ssh::CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        },
    );
    let executor = Executor::Remote(&fake);
    let step = Step::GuardedCommand {
        cmd: "touch /opt/marker".into(),
        creates: Some("/opt/marker".into()),
        removes: None,
        unless: None,
        onlyif: None,
        sudo: false,
        sudo_user: None,
        cwd: None,
        env: HashMap::new(),
        timeout_ms: 5_000,
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Skipped);
}

#[tokio::test]
async fn guarded_command_runs_when_no_guard_fires() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "touch /opt/marker",
        nexus_ssh::CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        },
    );
    let executor = Executor::Remote(&fake);
    let step = Step::GuardedCommand {
        cmd: "touch /opt/marker".into(),
        creates: None,
        removes: None,
        unless: None,
        onlyif: None,
        sudo: false,
        sudo_user: None,
        cwd: None,
        env: HashMap::new(),
        timeout_ms: 5_000,
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &Facts::new()).await;
    assert_eq!(result.status, StepStatus::Ok);
}

#[tokio::test]
async fn resource_package_reports_changed_when_not_present() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "dpkg-query -W -f='${Status}' nginx",
        nexus_ssh::CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 1,
        },
    );
    fake.on_exec(
        "sudo apt-get install -y nginx",
        nexus_ssh::CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        },
    );
    let executor = Executor::Remote(&fake);
    let step = Step::Resource {
        resource: ResourceKind::Package,
        name: "nginx".into(),
        attrs: ResourceAttrs::default(),
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &facts_with_os("linux")).await;
    assert_eq!(result.status, StepStatus::Changed);
}

#[tokio::test]
async fn resource_package_is_ok_when_already_present() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "dpkg-query -W -f='${Status}' nginx",
        nexus_ssh::CommandOutput {
            stdout: "install ok installed".into(),
            stderr: String::new(),
            exit_code: 0,
        },
    );
    let executor = Executor::Remote(&fake);
    let step = Step::Resource {
        resource: ResourceKind::Package,
        name: "nginx".into(),
        attrs: ResourceAttrs::default(),
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &facts_with_os("linux")).await;
    assert_eq!(result.status, StepStatus::Ok);
}

#[tokio::test]
async fn resource_service_on_unsupported_platform_errors() {
    let fake = FakeTransport::new();
    let executor = Executor::Remote(&fake);
    let step = Step::Resource {
        resource: ResourceKind::Service,
        name: "nginx".into(),
        attrs: ResourceAttrs::default(),
        when: Predicate::Always,
        notify: None,
    };
    let result = execute_once(&step, &executor, &facts_with_os("windows")).await;
    assert_eq!(result.status, StepStatus::Error);
}

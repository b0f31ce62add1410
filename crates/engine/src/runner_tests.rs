use super::*;
use nexus_core::{Predicate, Strategy, Target};
use nexus_ssh::FakeTransport;

fn shell_step(cmd: &str) -> Step {
    Step::Shell {
        cmd: cmd.to_string(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: None,
    }
}

fn task_with(commands: Vec<Step>, continue_on_error: Option<bool>) -> Task {
    Task {
        name: "deploy".into(),
        deps: vec![],
        on: Target::Local,
        commands,
        timeout_ms: 600_000,
        strategy: Strategy::Parallel,
        batch_size: 1,
        canary_hosts: 1,
        canary_wait_s: 0,
        continue_on_error,
        tags: vec![],
    }
}

#[tokio::test]
async fn halts_on_first_error_by_default() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "false",
        nexus_ssh::CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 1,
        },
    );
    let executor = Executor::Remote(&fake);
    let task = task_with(vec![shell_step("false"), shell_step("echo never")], None);
    let outcome = run_task_on_host(&task, "web1", &executor, &Facts::new()).await;
    assert_eq!(outcome.result.steps.len(), 1);
    assert_eq!(outcome.result.status, nexus_core::RunStatus::Error);
}

#[tokio::test]
async fn continue_on_error_runs_every_step() {
    let fake = FakeTransport::new();
    fake.on_exec(
        "false",
        nexus_ssh::CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 1,
        },
    );
    let executor = Executor::Remote(&fake);
    let task = task_with(vec![shell_step("false"), shell_step("echo still runs")], Some(true));
    let outcome = run_task_on_host(&task, "web1", &executor, &Facts::new()).await;
    assert_eq!(outcome.result.steps.len(), 2);
}

#[tokio::test]
async fn false_when_predicate_skips_the_step() {
    let fake = FakeTransport::new();
    let executor = Executor::Remote(&fake);
    let step = Step::Shell {
        cmd: "echo hi".into(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Literal(nexus_core::predicate::Literal::Bool(false)),
        notify: None,
    };
    let task = task_with(vec![step], None);
    let outcome = run_task_on_host(&task, "web1", &executor, &Facts::new()).await;
    assert_eq!(outcome.result.steps[0].status, StepStatus::Skipped);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn notify_is_collected_only_on_success() {
    let fake = FakeTransport::new();
    let executor = Executor::Remote(&fake);
    let step = Step::Shell {
        cmd: "echo hi".into(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: Some("restart".into()),
    };
    let task = task_with(vec![step], None);
    let outcome = run_task_on_host(&task, "web1", &executor, &Facts::new()).await;
    assert_eq!(outcome.triggered_handlers, vec![HandlerName::from("restart")]);
}

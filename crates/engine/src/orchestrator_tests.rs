use super::*;
use nexus_core::{Handler, HandlerName, Host, HostName, Predicate, RunStatus, Strategy, Target};
use nexus_ssh::FakeTransport;

fn dial_fake() -> nexus_ssh::pool::DialFn<FakeTransport> {
    Arc::new(move |_addr| Box::pin(async move { Ok(FakeTransport::new()) }))
}

fn orchestrator() -> Orchestrator<FakeTransport> {
    Orchestrator::new(Arc::new(Pool::new(dial_fake())), PoolConfig::default())
}

fn shell_step(cmd: &str) -> nexus_core::Step {
    nexus_core::Step::Shell {
        cmd: cmd.into(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: None,
    }
}

fn local_task(name: &str, deps: Vec<&str>) -> Task {
    Task {
        name: name.into(),
        deps: deps.into_iter().map(Into::into).collect(),
        on: Target::Local,
        commands: vec![shell_step("echo hi")],
        timeout_ms: 60_000,
        strategy: Strategy::Parallel,
        batch_size: 1,
        canary_hosts: 1,
        canary_wait_s: 0,
        continue_on_error: None,
        tags: vec![],
    }
}

#[tokio::test]
async fn linear_pipeline_runs_every_task_in_dependency_order() {
    let mut config = Config::default();
    config.tasks.insert("build".into(), local_task("build", vec![]));
    config.tasks.insert("test".into(), local_task("test", vec!["build"]));
    config.tasks.insert("deploy".into(), local_task("deploy", vec!["test"]));

    let orchestrator = orchestrator();
    let opts = RunOptions::default();
    let result = orchestrator
        .run(&config, &["deploy".into()], &opts)
        .await
        .expect("run succeeds");

    assert_eq!(result.tasks_run, 3);
    assert_eq!(result.tasks_failed, 0);
    assert!(result.aborted_at.is_none());
}

#[tokio::test]
async fn diamond_dependency_runs_fan_out_tasks_in_the_same_phase() {
    let mut config = Config::default();
    config.tasks.insert("base".into(), local_task("base", vec![]));
    config.tasks.insert("left".into(), local_task("left", vec!["base"]));
    config.tasks.insert("right".into(), local_task("right", vec!["base"]));
    config.tasks.insert("join".into(), local_task("join", vec!["left", "right"]));

    let orchestrator = orchestrator();
    let plan = orchestrator.plan(&config, &["join".into()]).expect("plan succeeds");
    assert_eq!(plan.phases.len(), 3);
    assert_eq!(plan.phases[0], vec![TaskName::from("base")]);
    assert_eq!(plan.phases[1], vec![TaskName::from("left"), TaskName::from("right")]);
    assert_eq!(plan.phases[2], vec![TaskName::from("join")]);

    let opts = RunOptions::default();
    let result = orchestrator
        .run(&config, &["join".into()], &opts)
        .await
        .expect("run succeeds");
    assert_eq!(result.tasks_run, 4);
    assert_eq!(result.status, RunStatus::Ok);
}

#[tokio::test]
async fn dry_run_reports_the_plan_without_executing_anything() {
    let mut config = Config::default();
    config.tasks.insert("build".into(), local_task("build", vec![]));

    let orchestrator = orchestrator();
    let opts = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let result = orchestrator
        .run(&config, &["build".into()], &opts)
        .await
        .expect("dry run succeeds");

    assert_eq!(result.tasks_run, 1);
    assert_eq!(result.task_results[0].task, TaskName::from("build"));
    assert_eq!(result.task_results[0].status, RunStatus::Skipped);
    assert!(result.task_results[0].host_results.is_empty());
}

#[tokio::test]
async fn unknown_target_task_surfaces_as_orchestrator_error() {
    let config = Config::default();
    let orchestrator = orchestrator();
    let err = orchestrator
        .run(&config, &["missing".into()], &RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::UnknownTasks(_)));
}

#[tokio::test]
async fn failing_task_aborts_later_phases_unless_continue_on_error() {
    let mut config = Config::default();
    let mut failing = local_task("build", vec![]);
    failing.commands = vec![nexus_core::Step::GuardedCommand {
        cmd: "false".into(),
        cwd: None,
        env: Default::default(),
        sudo: false,
        sudo_user: None,
        creates: None,
        removes: None,
        unless: None,
        onlyif: None,
        timeout_ms: 5_000,
        when: Predicate::Always,
        notify: None,
    }];
    config.tasks.insert("build".into(), failing);
    config.tasks.insert("deploy".into(), local_task("deploy", vec!["build"]));

    let orchestrator = orchestrator();
    let result = orchestrator
        .run(&config, &["deploy".into()], &RunOptions::default())
        .await
        .expect("run completes with a failure, not an orchestrator error");

    assert_eq!(result.status, RunStatus::Error);
    assert_eq!(result.aborted_at, Some(TaskName::from("build")));
    assert_eq!(result.tasks_run, 1, "deploy must not run once its dependency failed");
}

#[tokio::test]
async fn remote_task_dials_a_host_through_the_pool() {
    let mut config = Config::default();
    config.hosts.insert("web1".into(), Host::new("web1", "web1.internal"));
    config.tasks.insert(
        "deploy".into(),
        Task {
            name: "deploy".into(),
            deps: vec![],
            on: Target::Host("web1".into()),
            commands: vec![shell_step("echo hi")],
            timeout_ms: 60_000,
            strategy: Strategy::Parallel,
            batch_size: 1,
            canary_hosts: 1,
            canary_wait_s: 0,
            continue_on_error: None,
            tags: vec![],
        },
    );

    let orchestrator = orchestrator();
    let result = orchestrator
        .run(&config, &["deploy".into()], &RunOptions::default())
        .await
        .expect("run succeeds");

    assert_eq!(result.tasks_run, 1);
    assert_eq!(result.status, RunStatus::Ok);
    assert_eq!(result.task_results[0].host_results[0].host, "web1");
}

#[tokio::test]
async fn handlers_triggered_by_a_task_are_reported_in_its_task_result() {
    let mut config = Config::default();
    config.handlers.insert(
        "restart".into(),
        Handler {
            name: "restart".into(),
            commands: vec![shell_step("echo restarting")],
        },
    );
    let mut task = local_task("deploy", vec![]);
    task.commands = vec![nexus_core::Step::Shell {
        cmd: "echo hi".into(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: Some("restart".into()),
    }];
    config.tasks.insert("deploy".into(), task);

    let orchestrator = orchestrator();
    let result = orchestrator
        .run(&config, &["deploy".into()], &RunOptions::default())
        .await
        .expect("run succeeds");

    assert_eq!(result.task_results[0].triggered_handlers, vec![HandlerName::from("restart")]);
    assert_eq!(result.tasks_run, 2, "the handler runs as its own task result");
    assert_eq!(result.task_results[1].task, TaskName::from("restart"));
    assert_eq!(result.task_results[1].status, RunStatus::Ok);
    assert_eq!(result.task_results[1].host_results[0].host, ":local");
}

#[tokio::test]
async fn a_handler_triggered_by_multiple_hosts_dispatches_only_once() {
    let mut config = Config::default();
    config.hosts.insert("web1".into(), Host::new("web1", "web1.internal"));
    config.hosts.insert("web2".into(), Host::new("web2", "web2.internal"));
    config.groups.insert(
        "web".into(),
        nexus_core::HostGroup::new("web", vec![HostName::from("web1"), HostName::from("web2")]),
    );
    config.handlers.insert(
        "restart".into(),
        Handler {
            name: "restart".into(),
            commands: vec![shell_step("echo restarting")],
        },
    );
    config.tasks.insert(
        "deploy".into(),
        Task {
            name: "deploy".into(),
            deps: vec![],
            on: Target::Group("web".into()),
            commands: vec![nexus_core::Step::Shell {
                cmd: "echo hi".into(),
                sudo: false,
                sudo_user: None,
                timeout_ms: 5_000,
                retries: 0,
                retry_delay_ms: 1_000,
                when: Predicate::Always,
                notify: Some("restart".into()),
            }],
            timeout_ms: 60_000,
            strategy: Strategy::Parallel,
            batch_size: 1,
            canary_hosts: 1,
            canary_wait_s: 0,
            continue_on_error: None,
            tags: vec![],
        },
    );

    let orchestrator = orchestrator();
    let result = orchestrator
        .run(&config, &["deploy".into()], &RunOptions::default())
        .await
        .expect("run succeeds");

    assert_eq!(result.task_results[0].triggered_handlers, vec![HandlerName::from("restart")]);
    assert_eq!(result.tasks_run, 2, "restart dispatches exactly once despite two hosts notifying it");
    assert_eq!(result.task_results[1].task, TaskName::from("restart"));
}

#[tokio::test]
async fn notifying_an_undefined_handler_fails_as_a_dispatch_error() {
    let mut config = Config::default();
    let mut task = local_task("deploy", vec![]);
    task.commands = vec![nexus_core::Step::Shell {
        cmd: "echo hi".into(),
        sudo: false,
        sudo_user: None,
        timeout_ms: 5_000,
        retries: 0,
        retry_delay_ms: 1_000,
        when: Predicate::Always,
        notify: Some("ghost".into()),
    }];
    config.tasks.insert("deploy".into(), task);

    let orchestrator = orchestrator();
    let result = orchestrator
        .run(&config, &["deploy".into()], &RunOptions::default())
        .await
        .expect("run completes with a failing handler dispatch, not an orchestrator error");

    assert_eq!(result.tasks_run, 2);
    assert_eq!(result.task_results[1].task, TaskName::from("ghost"));
    assert_eq!(result.task_results[1].status, RunStatus::Error);
    assert_eq!(result.status, RunStatus::Error);
}

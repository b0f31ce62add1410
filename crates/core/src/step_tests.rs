use super::*;

#[test]
fn shell_step_deserializes_with_defaults() {
    let json = r#"{"kind": "shell", "cmd": "echo ok"}"#;
    let step: Step = serde_json::from_str(json).expect("valid step json");
    match &step {
        Step::Shell {
            cmd,
            retries,
            timeout_ms,
            ..
        } => {
            assert_eq!(cmd, "echo ok");
            assert_eq!(*retries, 0);
            assert_eq!(*timeout_ms, 30_000);
        }
        other => panic!("expected Shell, got {other:?}"),
    }
    assert_eq!(step.when(), &Predicate::Always);
    assert!(step.is_retryable());
}

#[test]
fn wait_for_step_is_not_retryable() {
    let json = r#"{"kind":"wait_for","type":"tcp","target":"localhost:9999"}"#;
    let step: Step = serde_json::from_str(json).expect("valid step json");
    assert!(!step.is_retryable());
    assert!(step.notify().is_none());
}

#[test]
fn guarded_command_description() {
    let step = Step::GuardedCommand {
        cmd: "touch /tmp/x".into(),
        creates: Some("/tmp/x".into()),
        removes: None,
        unless: None,
        onlyif: None,
        sudo: false,
        sudo_user: None,
        cwd: None,
        env: Default::default(),
        timeout_ms: 30_000,
        when: Predicate::Always,
        notify: None,
    };
    assert_eq!(step.description(), "command: touch /tmp/x");
}

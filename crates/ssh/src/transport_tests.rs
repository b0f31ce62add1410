use super::*;

#[test]
fn destination_key_is_host_port_user() {
    let addr = HostAddr::new("10.0.0.1", 22, "deploy");
    assert_eq!(addr.destination_key(), "10.0.0.1:22:deploy");
}

#[test]
fn combined_output_concatenates_stdout_and_stderr() {
    let out = CommandOutput {
        stdout: "hello\n".into(),
        stderr: "warn\n".into(),
        exit_code: 0,
    };
    assert_eq!(out.combined(), "hello\nwarn\n");
}

#[test]
fn combined_output_with_empty_stderr_is_just_stdout() {
    let out = CommandOutput {
        stdout: "hello\n".into(),
        stderr: String::new(),
        exit_code: 0,
    };
    assert_eq!(out.combined(), "hello\n");
}

use super::*;
use nexus_core::{GroupName, Host, HostGroup};

fn config_with_host_and_group() -> Config {
    let mut config = Config::default();
    config.hosts.insert(HostName::from("web1"), Host::new("web1", "web1.internal"));
    config.hosts.insert(HostName::from("web2"), Host::new("web2", "web2.internal"));
    config.groups.insert(
        GroupName::from("web"),
        HostGroup::new("web", vec![HostName::from("web1"), HostName::from("web2"), HostName::from("web1")]),
    );
    config
}

#[test]
fn local_target_resolves_to_local() {
    let config = Config::default();
    let resolved = resolve_hosts(&config, &TaskName::from("deploy"), &Target::Local).expect("ok");
    assert!(matches!(resolved, Resolved::Local));
}

#[test]
fn host_target_resolves_to_singleton() {
    let config = config_with_host_and_group();
    let resolved = resolve_hosts(&config, &TaskName::from("deploy"), &Target::Host(HostName::from("web1"))).expect("ok");
    let Resolved::Hosts(hosts) = resolved else { panic!("expected Hosts") };
    assert_eq!(hosts, vec![HostName::from("web1")]);
}

#[test]
fn group_target_resolves_to_unique_ordered_members() {
    let config = config_with_host_and_group();
    let resolved = resolve_hosts(&config, &TaskName::from("deploy"), &Target::Group(GroupName::from("web"))).expect("ok");
    let Resolved::Hosts(hosts) = resolved else { panic!("expected Hosts") };
    assert_eq!(hosts, vec![HostName::from("web1"), HostName::from("web2")]);
}

#[test]
fn unknown_host_target_errors() {
    let config = Config::default();
    let err = resolve_hosts(&config, &TaskName::from("deploy"), &Target::Host(HostName::from("ghost"))).unwrap_err();
    assert!(matches!(err, OrchestratorError::UndefinedHost { .. }));
}

#[test]
fn empty_group_target_errors_before_any_step_runs() {
    let mut config = Config::default();
    config.groups.insert(GroupName::from("empty"), HostGroup::new("empty", vec![]));
    let err = resolve_hosts(&config, &TaskName::from("deploy"), &Target::Group(GroupName::from("empty"))).unwrap_err();
    assert!(matches!(err, OrchestratorError::Exec(ExecError::NoHosts(_))));
}

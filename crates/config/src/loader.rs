// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HCL runbook loading: parse, convert, then run the core's own
//! structural validation before handing the result back.

use std::path::Path;

use indexmap::IndexMap;
use nexus_core::{Config, Defaults, Handler, Host, HostGroup, Strategy, Target, Task};

use crate::document::{Document, HostDoc, TaskDoc};
use crate::error::LoadError;

/// Load and validate a runbook from disk.
pub fn load_file(path: impl AsRef<Path>) -> Result<Config, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&content)
}

/// Load and validate a runbook from an in-memory HCL string.
pub fn load_str(content: &str) -> Result<Config, LoadError> {
    let doc: Document = hcl::from_str(content)?;
    let config = to_config(doc)?;
    config.validate()?;
    Ok(config)
}

fn to_config(doc: Document) -> Result<Config, LoadError> {
    let hosts: IndexMap<_, _> = doc
        .hosts
        .into_iter()
        .map(|(name, h)| (name.clone().into(), to_host(name, h)))
        .collect();

    let groups: IndexMap<_, _> = doc
        .groups
        .into_iter()
        .map(|(name, g)| {
            (
                name.clone().into(),
                HostGroup::new(name.into(), g.members.into_iter().map(Into::into).collect()),
            )
        })
        .collect();

    let mut tasks: IndexMap<_, _> = IndexMap::new();
    for (name, t) in doc.tasks {
        let task = to_task(&name, t, &hosts, &groups)?;
        tasks.insert(name.into(), task);
    }

    let handlers: IndexMap<_, _> = doc
        .handlers
        .into_iter()
        .map(|(name, h)| {
            (
                name.clone().into(),
                Handler {
                    name: name.into(),
                    commands: h.commands,
                },
            )
        })
        .collect();

    let defaults = doc.defaults.map(to_defaults).unwrap_or_default();

    Ok(Config {
        hosts,
        groups,
        tasks,
        handlers,
        defaults,
    })
}

fn to_host(name: String, h: HostDoc) -> Host {
    Host {
        name: name.into(),
        hostname: h.hostname,
        user: h.user,
        port: h.port,
        identity_file: h.identity_file,
        proxy_jump: h.proxy_jump,
    }
}

fn to_defaults(d: crate::document::DefaultsDoc) -> Defaults {
    let base = Defaults::default();
    Defaults {
        default_user: d.default_user.unwrap_or(base.default_user),
        default_port: d.default_port.unwrap_or(base.default_port),
        connect_timeout_ms: d.connect_timeout_ms.unwrap_or(base.connect_timeout_ms),
        command_timeout_ms: d.command_timeout_ms.unwrap_or(base.command_timeout_ms),
        max_connections: d.max_connections.unwrap_or(base.max_connections),
        continue_on_error: d.continue_on_error.unwrap_or(base.continue_on_error),
    }
}

fn to_task(
    name: &str,
    t: TaskDoc,
    hosts: &IndexMap<nexus_core::HostName, Host>,
    groups: &IndexMap<nexus_core::GroupName, HostGroup>,
) -> Result<Task, LoadError> {
    let on = resolve_target(name, &t.on, hosts, groups)?;
    let strategy = match &t.strategy {
        None => Strategy::default(),
        Some(s) => parse_strategy(name, s)?,
    };

    Ok(Task {
        name: name.into(),
        deps: t.deps.into_iter().map(Into::into).collect(),
        on,
        commands: t.commands,
        timeout_ms: t.timeout_ms.unwrap_or(600_000),
        strategy,
        batch_size: t.batch_size.unwrap_or(1),
        canary_hosts: t.canary_hosts.unwrap_or(1),
        canary_wait_s: t.canary_wait_s.unwrap_or(0),
        continue_on_error: t.continue_on_error,
        tags: t.tags,
    })
}

fn resolve_target(
    task: &str,
    on: &str,
    hosts: &IndexMap<nexus_core::HostName, Host>,
    groups: &IndexMap<nexus_core::GroupName, HostGroup>,
) -> Result<Target, LoadError> {
    if on == "local" {
        return Ok(Target::Local);
    }
    if hosts.contains_key(on) {
        return Ok(Target::Host(on.into()));
    }
    if groups.contains_key(on) {
        return Ok(Target::Group(on.into()));
    }
    Err(LoadError::AmbiguousTarget {
        task: task.to_string(),
        target: on.to_string(),
    })
}

fn parse_strategy(task: &str, s: &str) -> Result<Strategy, LoadError> {
    match s {
        "parallel" => Ok(Strategy::Parallel),
        "serial" => Ok(Strategy::Serial),
        "rolling" => Ok(Strategy::Rolling),
        "canary" => Ok(Strategy::Canary),
        other => Err(LoadError::UnknownStrategy {
            task: task.to_string(),
            strategy: other.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host resolution: turn a task's `on` target into the host list the
//! strategy driver fans a task's steps out across. `Target::Local` is
//! kept distinct from a resolved-but-empty host list: the former runs
//! once against the local executor, the latter (an empty group) is a
//! failure before any step runs.

use nexus_core::{Config, HostName, Target, TaskName};

use crate::error::{ExecError, OrchestratorError};

/// Result of resolving a task's `on` selector.
pub enum Resolved {
    /// `on = local`: run once against the local executor.
    Local,
    /// A host or group target, resolved to one or more hosts.
    Hosts(Vec<HostName>),
}

pub fn resolve_hosts(config: &Config, task_name: &TaskName, target: &Target) -> Result<Resolved, OrchestratorError> {
    match target {
        Target::Local => Ok(Resolved::Local),
        Target::Host(host) => {
            if !config.hosts.contains_key(host) {
                return Err(OrchestratorError::UndefinedHost {
                    task: task_name.clone(),
                    host: host.clone(),
                });
            }
            Ok(Resolved::Hosts(vec![host.clone()]))
        }
        Target::Group(group_name) => {
            let group = config.groups.get(group_name).ok_or_else(|| OrchestratorError::UndefinedGroup {
                task: task_name.clone(),
                group: group_name.clone(),
            })?;
            let members = group.unique_members();
            if members.is_empty() {
                return Err(OrchestratorError::Exec(ExecError::NoHosts(group_name.to_string())));
            }
            Ok(Resolved::Hosts(members))
        }
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;

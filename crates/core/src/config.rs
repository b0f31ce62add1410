// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable run configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::host::{Host, HostGroup};
use crate::names::{GroupName, HandlerName, HostName, TaskName};
use crate::task::{Handler, Target, Task};

/// Run-wide defaults. `max_connections` governs SSH pool sizing;
/// `parallel_limit` lives on orchestrator options, not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_user")]
    pub default_user: String,
    #[serde(default = "default_port")]
    pub default_port: u16,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default)]
    pub continue_on_error: bool,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_command_timeout_ms() -> u64 {
    30_000
}

fn default_max_connections() -> usize {
    5
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            default_user: default_user(),
            default_port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            max_connections: default_max_connections(),
            continue_on_error: false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hosts: IndexMap<HostName, Host>,
    #[serde(default)]
    pub groups: IndexMap<GroupName, HostGroup>,
    #[serde(default)]
    pub tasks: IndexMap<TaskName, Task>,
    #[serde(default)]
    pub handlers: IndexMap<HandlerName, Handler>,
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("group {group} references undefined host {host}")]
    UndefinedHostInGroup { group: String, host: String },
    #[error("task {task} has on=group({group}) which is not defined")]
    UndefinedGroupOnTask { task: String, group: String },
    #[error("task {task} has on=host({host}) which is not defined")]
    UndefinedHostOnTask { task: String, host: String },
    #[error("task {task} names itself in its own deps")]
    SelfDependency { task: String },
    #[error("task {task} depends on undefined task {dep}")]
    UndefinedDependency { task: String, dep: String },
}

impl Config {
    /// Structural validation the DSL-loading boundary must perform before
    /// the engine ever sees a `Config`: every group member must resolve to
    /// a defined host, and so on. Cycle detection is *not* done here;
    /// that is `nexus-dag`'s job, surfaced as a distinct error kind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for group in self.groups.values() {
            for member in &group.members {
                if !self.hosts.contains_key(member) {
                    return Err(ConfigError::UndefinedHostInGroup {
                        group: group.name.to_string(),
                        host: member.to_string(),
                    });
                }
            }
        }

        for task in self.tasks.values() {
            match &task.on {
                Target::Local => {}
                Target::Host(h) => {
                    if !self.hosts.contains_key(h) {
                        return Err(ConfigError::UndefinedHostOnTask {
                            task: task.name.to_string(),
                            host: h.to_string(),
                        });
                    }
                }
                Target::Group(g) => {
                    if !self.groups.contains_key(g) {
                        return Err(ConfigError::UndefinedGroupOnTask {
                            task: task.name.to_string(),
                            group: g.to_string(),
                        });
                    }
                }
            }

            for dep in &task.deps {
                if dep == &task.name {
                    return Err(ConfigError::SelfDependency {
                        task: task.name.to_string(),
                    });
                }
                if !self.tasks.contains_key(dep) {
                    return Err(ConfigError::UndefinedDependency {
                        task: task.name.to_string(),
                        dep: dep.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Resolve a host's effective `(hostname, user, port)` honoring the
    /// config-wide defaults.
    pub fn resolve_host(&self, name: &HostName) -> Option<(&Host, &str, u16)> {
        let host = self.hosts.get(name)?;
        let user = host.user_or(&self.defaults.default_user);
        let port = host.port_or(self.defaults.default_port);
        Some((host, user, port))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

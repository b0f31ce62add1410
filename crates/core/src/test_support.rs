// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders for constructing `Config` values in other crates' tests.
//! Gated behind the `test-support` feature so these never ship in a
//! release build.

use crate::config::Config;
use crate::host::{Host, HostGroup};
use crate::names::{GroupName, HostName, TaskName};
use crate::predicate::Predicate;
use crate::step::Step;
use crate::task::{Strategy, Target, Task};

/// A local, single-step shell task with no dependencies. Useful as a test
/// fixture building block.
pub fn local_shell_task(name: &str, deps: &[&str], cmd: &str) -> Task {
    Task {
        name: TaskName::new(name),
        deps: deps.iter().map(|d| TaskName::new(*d)).collect(),
        on: Target::Local,
        commands: vec![Step::Shell {
            cmd: cmd.to_string(),
            sudo: false,
            sudo_user: None,
            timeout_ms: 30_000,
            retries: 0,
            retry_delay_ms: 1_000,
            when: Predicate::Always,
            notify: None,
        }],
        timeout_ms: 60_000,
        strategy: Strategy::Parallel,
        batch_size: 1,
        canary_hosts: 1,
        canary_wait_s: 0,
        continue_on_error: None,
        tags: vec![],
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, name: &str, hostname: &str) -> Self {
        self.config
            .hosts
            .insert(HostName::new(name), Host::new(name, hostname));
        self
    }

    pub fn with_group(mut self, name: &str, members: &[&str]) -> Self {
        self.config.groups.insert(
            GroupName::new(name),
            HostGroup::new(name, members.iter().map(|m| HostName::new(*m)).collect()),
        );
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.config.tasks.insert(task.name.clone(), task);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and Handler records.

use serde::{Deserialize, Serialize};

use crate::names::{GroupName, HostName, TaskName};
use crate::step::Step;

/// Fan-out discipline across a task's resolved host set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Parallel,
    Serial,
    Rolling,
    Canary,
}

/// Target host selector for a task's `on` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Local,
    Host(HostName),
    Group(GroupName),
}

/// A named, ordered step list invoked at most once per run after the
/// triggering task succeeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    pub name: crate::names::HandlerName,
    pub commands: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: TaskName,
    #[serde(default)]
    pub deps: Vec<TaskName>,
    pub on: Target,
    pub commands: Vec<Step>,
    #[serde(default = "default_task_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_canary_hosts")]
    pub canary_hosts: usize,
    #[serde(default = "default_canary_wait_s")]
    pub canary_wait_s: u64,
    #[serde(default)]
    pub continue_on_error: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_task_timeout_ms() -> u64 {
    600_000
}

fn default_batch_size() -> usize {
    1
}

fn default_canary_hosts() -> usize {
    1
}

fn default_canary_wait_s() -> u64 {
    0
}

impl Task {
    /// `wait_for` steps in declaration order, used as inter-batch and
    /// bake-time health gates by the rolling/canary strategies.
    pub fn wait_for_steps(&self) -> Vec<&Step> {
        self.commands
            .iter()
            .filter(|s| matches!(s, Step::WaitFor { .. }))
            .collect()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;

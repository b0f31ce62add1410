// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result hierarchy produced by a run: step -> host -> task -> pipeline.

use serde::{Deserialize, Serialize};

use crate::names::{HandlerName, TaskName};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    /// A resource step applied a change.
    Changed,
    Error,
    Skipped,
}

impl StepStatus {
    /// A host/task is `ok` iff every step is `ok`, `changed`, or
    /// `skipped`.
    pub fn is_ok_like(&self) -> bool {
        !matches!(self, StepStatus::Error)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub description: String,
    pub status: StepStatus,
    #[serde(default)]
    pub output: String,
    pub exit_code: i32,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(default)]
    pub notify: Option<HandlerName>,
}

impl StepResult {
    pub fn skipped(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: StepStatus::Skipped,
            output: String::new(),
            exit_code: 0,
            attempts: 0,
            duration_ms: 0,
            notify: None,
        }
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self {
            description: "connect".to_string(),
            status: StepStatus::Error,
            output: reason.into(),
            exit_code: -1,
            attempts: 1,
            duration_ms: 0,
            notify: None,
        }
    }

    pub fn timeout(description: impl Into<String>, attempts: u32, duration_ms: u64) -> Self {
        Self {
            description: description.into(),
            status: StepStatus::Error,
            output: "timeout".to_string(),
            exit_code: -1,
            attempts,
            duration_ms,
            notify: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    Error,
    Skipped,
}

impl RunStatus {
    /// Derive host/task status from a sequence of step statuses: `ok`
    /// iff every step is in {ok, changed, skipped}.
    pub fn from_steps<'a>(steps: impl IntoIterator<Item = &'a StepStatus>) -> Self {
        let mut any = false;
        for status in steps {
            any = true;
            if matches!(status, StepStatus::Error) {
                return RunStatus::Error;
            }
        }
        if any {
            RunStatus::Ok
        } else {
            RunStatus::Skipped
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    /// Host name, or the literal `:local` for local execution.
    pub host: String,
    pub status: RunStatus,
    pub steps: Vec<StepResult>,
}

impl HostResult {
    pub fn new(host: impl Into<String>, steps: Vec<StepResult>) -> Self {
        let status = RunStatus::from_steps(steps.iter().map(|s| &s.status));
        Self {
            host: host.into(),
            status,
            steps,
        }
    }
}

/// A handler appears at most once per task, in first-trigger order, even
/// when several hosts notify the same handler.
fn dedup_handlers(handlers: Vec<HandlerName>) -> Vec<HandlerName> {
    let mut seen = std::collections::HashSet::new();
    handlers.into_iter().filter(|h| seen.insert(h.clone())).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: TaskName,
    pub status: RunStatus,
    pub duration_ms: u64,
    pub host_results: Vec<HostResult>,
    pub triggered_handlers: Vec<HandlerName>,
}

impl TaskResult {
    pub fn aggregate(
        task: TaskName,
        duration_ms: u64,
        host_results: Vec<HostResult>,
        triggered_handlers: Vec<HandlerName>,
    ) -> Self {
        let status = RunStatus::from_steps(
            host_results
                .iter()
                .flat_map(|h| h.steps.iter())
                .map(|s| &s.status),
        );
        Self {
            task,
            status,
            duration_ms,
            host_results,
            triggered_handlers: dedup_handlers(triggered_handlers),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, RunStatus::Error)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: RunStatus,
    pub duration_ms: u64,
    pub tasks_run: usize,
    pub tasks_succeeded: usize,
    pub tasks_failed: usize,
    pub task_results: Vec<TaskResult>,
    pub aborted_at: Option<TaskName>,
}

impl PipelineResult {
    pub fn empty() -> Self {
        Self {
            status: RunStatus::Ok,
            duration_ms: 0,
            tasks_run: 0,
            tasks_succeeded: 0,
            tasks_failed: 0,
            task_results: vec![],
            aborted_at: None,
        }
    }

    pub fn from_task_results(
        duration_ms: u64,
        task_results: Vec<TaskResult>,
        aborted_at: Option<TaskName>,
    ) -> Self {
        let tasks_failed = task_results.iter().filter(|t| t.is_error()).count();
        let tasks_succeeded = task_results.len() - tasks_failed;
        let status = if tasks_failed > 0 {
            RunStatus::Error
        } else {
            RunStatus::Ok
        };
        Self {
            status,
            duration_ms,
            tasks_run: task_results.len(),
            tasks_succeeded,
            tasks_failed,
            task_results,
            aborted_at,
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;

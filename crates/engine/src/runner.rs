// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Runner: execute one task's step sequence against a single host
//! (or the local executor), honoring `when`, retrying shell/guarded-
//! command steps, and halting on the first error unless the task opts
//! into `continue_on_error`.

use nexus_core::{Facts, HandlerName, HostResult, Step, StepResult, StepStatus, Task};
use nexus_ssh::Transport;

use crate::executor::Executor;
use crate::steps;

pub struct HostRunOutcome {
    pub result: HostResult,
    pub triggered_handlers: Vec<HandlerName>,
}

/// A step's retry budget. Only `Shell` carries an explicit
/// `retries`/`retry_delay_ms` pair; `GuardedCommand` is retryable in the
/// sense that a transient connection failure is safe to retry, but
/// carries no budget of its own, so it defaults to zero retries (run
/// once, no backoff loop) rather than inventing a number the step never
/// declared.
fn retry_policy(step: &Step) -> (u32, u64) {
    match step {
        Step::Shell {
            retries, retry_delay_ms, ..
        } => (*retries, *retry_delay_ms),
        _ => (0, 1_000),
    }
}

/// Run `task`'s step sequence against `executor`, labeling the resulting
/// `HostResult` with `host_label` (a host name, or `:local`).
pub async fn run_task_on_host<T: Transport>(
    task: &Task,
    host_label: &str,
    executor: &Executor<'_, T>,
    facts: &Facts,
) -> HostRunOutcome {
    run_steps_on_host(&task.commands, host_label, executor, facts, task.continue_on_error.unwrap_or(false)).await
}

/// Run a bare step sequence against `executor`, labeling the resulting
/// `HostResult` with `host_label`. Shared by task execution and handler
/// dispatch, which runs a handler's `commands` the same way but without a
/// surrounding `Task`.
pub async fn run_steps_on_host<T: Transport>(
    steps: &[Step],
    host_label: &str,
    executor: &Executor<'_, T>,
    facts: &Facts,
    continue_on_error: bool,
) -> HostRunOutcome {
    let mut step_results = Vec::with_capacity(steps.len());
    let mut triggered_handlers = Vec::new();

    for step in steps {
        if !step.when().eval(facts) {
            step_results.push(StepResult::skipped(step.description()));
            continue;
        }

        let result = if step.is_retryable() {
            let (retries, retry_delay_ms) = retry_policy(step);
            crate::retry::run_with_retries(retries, retry_delay_ms, |_attempt| steps::execute_once(step, executor, facts)).await
        } else {
            steps::execute_once(step, executor, facts).await
        };

        let is_error = matches!(result.status, StepStatus::Error);
        if !is_error {
            if let Some(handler) = result.notify.clone() {
                triggered_handlers.push(handler);
            }
        }
        step_results.push(result);

        if is_error && !continue_on_error {
            break;
        }
    }

    HostRunOutcome {
        result: HostResult::new(host_label, step_results),
        triggered_handlers,
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

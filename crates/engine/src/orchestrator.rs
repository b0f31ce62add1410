// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline Orchestrator (C8): resolve the required task subgraph for a
//! set of targets, run it phase by phase, bounded by `parallel_limit`,
//! aborting on the first task failure within a phase (lexicographically
//! by task name) unless `continue_on_error` is set. After each phase,
//! every handler a task in that phase notified is dispatched against
//! `:local`, once per run, before the next phase starts.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use nexus_core::{Config, HandlerName, HostResult, StepResult, Task, TaskName, TaskResult};
use nexus_dag::Graph;
use nexus_ssh::{Pool, PoolConfig, Transport};
use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};

use crate::executor::Executor;
use crate::facts::FactsCache;
use crate::resolve::{resolve_hosts, Resolved};
use crate::runner;
use crate::strategy::{self, StrategyContext};
use crate::{OrchestratorError, TelemetryEvent};

/// The task-name layering a `dry_run` plan reports without executing
/// anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub phases: Vec<Vec<TaskName>>,
}

#[derive(Clone)]
pub struct RunOptions {
    /// Overrides `Config::defaults::continue_on_error` when set.
    pub continue_on_error: Option<bool>,
    pub parallel_limit: usize,
    pub dry_run: bool,
    pub telemetry: Option<mpsc::Sender<TelemetryEvent>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            continue_on_error: None,
            parallel_limit: 10,
            dry_run: false,
            telemetry: None,
        }
    }
}

pub struct Orchestrator<T: Transport + 'static> {
    pool: Arc<Pool<T>>,
    pool_config: PoolConfig,
}

impl<T: Transport + 'static> Orchestrator<T> {
    pub fn new(pool: Arc<Pool<T>>, pool_config: PoolConfig) -> Self {
        Self { pool, pool_config }
    }

    /// Build the required-subgraph execution plan without running
    /// anything.
    pub fn plan(&self, config: &Config, targets: &[TaskName]) -> Result<Plan, OrchestratorError> {
        let graph = Graph::build(config)?;
        let required: Vec<TaskName> = graph.required_set(targets)?;
        let phases = graph.execution_phases(&required);
        Ok(Plan { phases })
    }

    /// Run `targets` and everything they transitively depend on.
    pub async fn run(
        &self,
        config: &Config,
        targets: &[TaskName],
        opts: &RunOptions,
    ) -> Result<nexus_core::PipelineResult, OrchestratorError> {
        let start = Instant::now();
        let plan = self.plan(config, targets)?;
        if opts.dry_run {
            let task_results: Vec<TaskResult> = plan
                .phases
                .iter()
                .flatten()
                .map(|name| TaskResult::aggregate(name.clone(), 0, vec![], vec![]))
                .collect();
            return Ok(nexus_core::PipelineResult::from_task_results(
                start.elapsed().as_millis() as u64,
                task_results,
                None,
            ));
        }

        let continue_on_error = opts.continue_on_error.unwrap_or(config.defaults.continue_on_error);
        let strategy_ctx = StrategyContext {
            config: Arc::new(config.clone()),
            pool: self.pool.clone(),
            pool_config: Arc::new(self.pool_config.clone()),
            facts_cache: Arc::new(FactsCache::new()),
            parallel_limit: opts.parallel_limit,
        };

        let mut task_results: Vec<TaskResult> = Vec::new();
        let mut aborted_at: Option<TaskName> = None;
        let mut dispatched_handlers: HashSet<HandlerName> = HashSet::new();

        'phases: for phase in &plan.phases {
            let mut names = phase.clone();
            names.sort();

            let semaphore = Arc::new(Semaphore::new(opts.parallel_limit.max(1)));
            let futures_vec: Vec<_> = names
                .iter()
                .map(|name| {
                    let semaphore = semaphore.clone();
                    let strategy_ctx = &strategy_ctx;
                    let telemetry = opts.telemetry.clone();
                    async move {
                        match semaphore.acquire().await {
                            Ok(_permit) => run_one_task(config, name, strategy_ctx, telemetry).await,
                            Err(_) => synthesize_task_error(name, "concurrency limiter closed"),
                        }
                    }
                })
                .collect();

            let phase_results = join_all(futures_vec).await;

            let mut first_failure: Option<TaskName> = None;
            for result in &phase_results {
                if result.is_error() && first_failure.is_none() {
                    first_failure = Some(result.task.clone());
                }
            }

            let mut pending_handlers: Vec<HandlerName> = Vec::new();
            for result in &phase_results {
                for handler in &result.triggered_handlers {
                    if dispatched_handlers.insert(handler.clone()) {
                        pending_handlers.push(handler.clone());
                    }
                }
            }

            task_results.extend(phase_results);

            for handler in &pending_handlers {
                let handler_result = dispatch_handler(config, handler, &strategy_ctx).await;
                if handler_result.is_error() && first_failure.is_none() {
                    first_failure = Some(handler_result.task.clone());
                }
                task_results.push(handler_result);
            }

            if let Some(failed) = first_failure {
                if !continue_on_error {
                    aborted_at = Some(failed);
                    break 'phases;
                }
            }
        }

        Ok(nexus_core::PipelineResult::from_task_results(
            start.elapsed().as_millis() as u64,
            task_results,
            aborted_at,
        ))
    }

    /// Close every pooled session. The pool may be shared beyond this
    /// orchestrator's lifetime, so callers opt in explicitly rather than
    /// this happening implicitly at the end of `run`.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

async fn run_one_task<T: Transport + 'static>(
    config: &Config,
    name: &TaskName,
    strategy_ctx: &StrategyContext<T>,
    telemetry: Option<mpsc::Sender<TelemetryEvent>>,
) -> TaskResult {
    let span = tracing::info_span!("task", task = name.as_str());
    let _guard = span.enter();
    send_telemetry(&telemetry, TelemetryEvent::TaskStart { task: name.clone() }).await;

    let Some(task) = config.tasks.get(name) else {
        let result = synthesize_task_error(name, "task disappeared from config mid-run");
        send_telemetry(
            &telemetry,
            TelemetryEvent::TaskStop {
                task: name.clone(),
                status: result.status,
            },
        )
        .await;
        return result;
    };

    let result = run_task_with_timeout(task, config, strategy_ctx).await;
    send_telemetry(
        &telemetry,
        TelemetryEvent::TaskStop {
            task: name.clone(),
            status: result.status,
        },
    )
    .await;
    result
}

async fn run_task_with_timeout<T: Transport + 'static>(task: &Task, config: &Config, strategy_ctx: &StrategyContext<T>) -> TaskResult {
    let start = Instant::now();
    let deadline = Duration::from_millis(task.timeout_ms);

    let resolved = match resolve_hosts(config, &task.name, &task.on) {
        Ok(resolved) => resolved,
        Err(e) => {
            return TaskResult::aggregate(
                task.name.clone(),
                start.elapsed().as_millis() as u64,
                vec![HostResult::new(":local", vec![StepResult::connect_error(e.to_string())])],
                vec![],
            );
        }
    };

    let labels: Vec<String> = match &resolved {
        Resolved::Local => vec![":local".to_string()],
        Resolved::Hosts(hosts) => hosts.iter().map(|h| h.to_string()).collect(),
    };

    let run = async {
        match &resolved {
            Resolved::Local => {
                let executor = Executor::<T>::Local;
                let facts = match strategy_ctx.facts_cache.get_or_gather(":local", &executor).await {
                    Ok(f) => f,
                    Err(e) => {
                        return (
                            vec![HostResult::new(":local", vec![StepResult::connect_error(e.to_string())])],
                            vec![],
                        )
                    }
                };
                let outcome = runner::run_task_on_host(task, ":local", &executor, &facts).await;
                (vec![outcome.result], outcome.triggered_handlers)
            }
            Resolved::Hosts(hosts) => strategy::run_task_on_hosts(strategy_ctx, Arc::new(task.clone()), hosts.clone()).await,
        }
    };

    match tokio::time::timeout(deadline, run).await {
        Ok((host_results, triggered_handlers)) => {
            TaskResult::aggregate(task.name.clone(), start.elapsed().as_millis() as u64, host_results, triggered_handlers)
        }
        Err(_) => {
            let timed_out = labels
                .into_iter()
                .map(|label| {
                    HostResult::new(
                        label,
                        vec![StepResult::timeout("task", 1, start.elapsed().as_millis() as u64)],
                    )
                })
                .collect();
            TaskResult::aggregate(task.name.clone(), start.elapsed().as_millis() as u64, timed_out, vec![])
        }
    }
}

/// Run a handler's step list against `:local`, reported as its own
/// task result. An undefined handler name (e.g. config mutated between
/// validation and dispatch) surfaces as a failing result rather than a
/// panic.
async fn dispatch_handler<T: Transport + 'static>(config: &Config, name: &HandlerName, strategy_ctx: &StrategyContext<T>) -> TaskResult {
    let start = Instant::now();
    let task_name = TaskName::from(name.as_str());

    let Some(handler) = config.handlers.get(name) else {
        return TaskResult::aggregate(
            task_name,
            start.elapsed().as_millis() as u64,
            vec![HostResult::new(
                ":local",
                vec![StepResult::connect_error(format!("handler {name} is not defined"))],
            )],
            vec![],
        );
    };

    let executor = Executor::<T>::Local;
    let facts = match strategy_ctx.facts_cache.get_or_gather(":local", &executor).await {
        Ok(f) => f,
        Err(e) => {
            return TaskResult::aggregate(
                task_name,
                start.elapsed().as_millis() as u64,
                vec![HostResult::new(":local", vec![StepResult::connect_error(e.to_string())])],
                vec![],
            );
        }
    };

    let outcome = runner::run_steps_on_host(&handler.commands, ":local", &executor, &facts, false).await;
    TaskResult::aggregate(
        task_name,
        start.elapsed().as_millis() as u64,
        vec![outcome.result],
        outcome.triggered_handlers,
    )
}

fn synthesize_task_error(name: &TaskName, reason: impl Into<String>) -> TaskResult {
    TaskResult::aggregate(
        name.clone(),
        0,
        vec![HostResult::new(":local", vec![StepResult::connect_error(reason.into())])],
        vec![],
    )
}

async fn send_telemetry(sender: &Option<mpsc::Sender<TelemetryEvent>>, event: TelemetryEvent) {
    if let Some(sender) = sender {
        let _ = sender.send(event).await;
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

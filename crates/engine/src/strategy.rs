// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy Driver: fan a task's resolved host list out
//! across Parallel / Serial / Rolling / Canary, each grounded on the
//! same `Arc`-wrapped shared state plus semaphore-bounded `tokio::spawn`
//! + `join_all` fan-out a host-oriented task runner uses for concurrent
//! per-host work.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use nexus_core::{Config, HandlerName, HostName, HostResult, RunStatus, Strategy, StepResult, Task};
use nexus_ssh::{HostAddr, Pool, PoolConfig, Transport};
use tokio::sync::Semaphore;

use crate::executor::Executor;
use crate::facts::FactsCache;
use crate::runner::{self, HostRunOutcome};
use crate::steps;

/// Shared, cheaply-cloneable state every spawned per-host task needs.
pub struct StrategyContext<T: Transport + 'static> {
    pub config: Arc<Config>,
    pub pool: Arc<Pool<T>>,
    pub pool_config: Arc<PoolConfig>,
    pub facts_cache: Arc<FactsCache>,
    pub parallel_limit: usize,
}

impl<T: Transport + 'static> Clone for StrategyContext<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            pool: self.pool.clone(),
            pool_config: self.pool_config.clone(),
            facts_cache: self.facts_cache.clone(),
            parallel_limit: self.parallel_limit,
        }
    }
}

/// Run `task` against `hosts` under its configured strategy, returning
/// per-host results in a stable order plus every handler name any host
/// triggered.
pub async fn run_task_on_hosts<T: Transport + 'static>(
    ctx: &StrategyContext<T>,
    task: Arc<Task>,
    hosts: Vec<HostName>,
) -> (Vec<HostResult>, Vec<HandlerName>) {
    let task = task.as_ref();
    let outcomes = match task.strategy {
        Strategy::Parallel => run_parallel(ctx, task, hosts, ctx.parallel_limit).await,
        Strategy::Serial => run_serial(ctx, task, hosts).await,
        Strategy::Rolling => run_rolling(ctx, task, hosts).await,
        Strategy::Canary => run_canary(ctx, task, hosts).await,
    };
    split(outcomes)
}

fn split(outcomes: Vec<HostRunOutcome>) -> (Vec<HostResult>, Vec<HandlerName>) {
    let mut results = Vec::with_capacity(outcomes.len());
    let mut handlers = Vec::new();
    for outcome in outcomes {
        results.push(outcome.result);
        handlers.extend(outcome.triggered_handlers);
    }
    (results, handlers)
}

fn host_addr(config: &Config, host_name: &HostName) -> Option<HostAddr> {
    let (host, user, port) = config.resolve_host(host_name)?;
    let mut addr = HostAddr::new(host.hostname.clone(), port, user.to_string());
    addr.identity_path = host.identity_file.clone();
    Some(addr)
}

async fn run_one_host<T: Transport + 'static>(ctx: &StrategyContext<T>, task: &Task, host: &HostName) -> HostRunOutcome {
    let Some(addr) = host_addr(&ctx.config, host) else {
        return connect_error_outcome(host.as_str(), format!("host {host} is not defined"));
    };

    let facts_cache = ctx.facts_cache.clone();
    let host_key = host.as_str().to_string();
    let checkout = ctx
        .pool
        .checkout(&addr, &ctx.pool_config, move |transport| async move {
            let executor = Executor::Remote(transport.as_ref());
            let facts = match facts_cache.get_or_gather(&host_key, &executor).await {
                Ok(f) => f,
                Err(e) => return connect_error_outcome(&host_key, e.to_string()),
            };
            runner::run_task_on_host(task, &host_key, &executor, &facts).await
        })
        .await;

    match checkout {
        Ok(outcome) => outcome,
        Err(e) => connect_error_outcome(host.as_str(), e.to_string()),
    }
}

/// Synthesize the single `connect` step-result a host reports when no
/// working session could be produced.
fn connect_error_outcome(host: &str, reason: impl Into<String>) -> HostRunOutcome {
    HostRunOutcome {
        result: HostResult::new(host, vec![StepResult::connect_error(reason.into())]),
        triggered_handlers: vec![],
    }
}

fn host_failed(outcome: &HostRunOutcome) -> bool {
    matches!(outcome.result.status, RunStatus::Error)
}

async fn run_parallel<T: Transport + 'static>(
    ctx: &StrategyContext<T>,
    task: &Task,
    hosts: Vec<HostName>,
    limit: usize,
) -> Vec<HostRunOutcome> {
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let futures_vec: Vec<_> = hosts
        .into_iter()
        .map(|host| {
            let semaphore = semaphore.clone();
            async move {
                match semaphore.acquire().await {
                    Ok(_permit) => run_one_host(ctx, task, &host).await,
                    Err(_) => connect_error_outcome(host.as_str(), "concurrency limiter closed"),
                }
            }
        })
        .collect();
    join_all(futures_vec).await
}

async fn run_serial<T: Transport + 'static>(ctx: &StrategyContext<T>, task: &Task, hosts: Vec<HostName>) -> Vec<HostRunOutcome> {
    let continue_on_error = task.continue_on_error.unwrap_or(false);
    let mut outcomes = Vec::with_capacity(hosts.len());
    for host in hosts {
        let outcome = run_one_host(ctx, task, &host).await;
        let failed = host_failed(&outcome);
        outcomes.push(outcome);
        if failed && !continue_on_error {
            break;
        }
    }
    outcomes
}

/// Re-run every `wait_for` step in `task` against `batch` as an
/// inter-batch / bake-time health gate for the rolling/canary strategies.
async fn run_gate<T: Transport + 'static>(ctx: &StrategyContext<T>, task: &Task, batch: &[HostName]) -> bool {
    let wait_for_steps = task.wait_for_steps();
    if wait_for_steps.is_empty() {
        return true;
    }

    for host in batch {
        let Some(addr) = host_addr(&ctx.config, host) else {
            return false;
        };
        let facts_cache = ctx.facts_cache.clone();
        let host_key = host.as_str().to_string();
        let wait_for_steps = wait_for_steps.clone();
        let gated = ctx
            .pool
            .checkout(&addr, &ctx.pool_config, move |transport| async move {
                let executor = Executor::Remote(transport.as_ref());
                let facts = match facts_cache.get_or_gather(&host_key, &executor).await {
                    Ok(f) => f,
                    Err(_) => return false,
                };
                for step in &wait_for_steps {
                    let result = steps::execute_once(step, &executor, &facts).await;
                    if !result.status.is_ok_like() {
                        return false;
                    }
                }
                true
            })
            .await
            .unwrap_or(false);
        if !gated {
            return false;
        }
    }
    true
}

async fn run_rolling<T: Transport + 'static>(ctx: &StrategyContext<T>, task: &Task, hosts: Vec<HostName>) -> Vec<HostRunOutcome> {
    let continue_on_error = task.continue_on_error.unwrap_or(false);
    let batch_size = task.batch_size.max(1);
    let mut outcomes = Vec::with_capacity(hosts.len());

    for batch in hosts.chunks(batch_size) {
        let batch_outcomes = run_parallel(ctx, task, batch.to_vec(), batch.len()).await;
        let batch_failed = batch_outcomes.iter().any(host_failed);
        outcomes.extend(batch_outcomes);
        if batch_failed && !continue_on_error {
            break;
        }
        if !run_gate(ctx, task, batch).await {
            break;
        }
    }
    outcomes
}

async fn run_canary<T: Transport + 'static>(ctx: &StrategyContext<T>, task: &Task, hosts: Vec<HostName>) -> Vec<HostRunOutcome> {
    if hosts.is_empty() {
        return Vec::new();
    }
    let canary_n = task.canary_hosts.max(1).min(hosts.len());
    let (head, tail) = hosts.split_at(canary_n);
    let head = head.to_vec();
    let tail = tail.to_vec();

    let head_outcomes = run_parallel(ctx, task, head.clone(), head.len()).await;
    if head_outcomes.iter().any(host_failed) {
        return head_outcomes;
    }

    if task.canary_wait_s > 0 {
        tokio::time::sleep(Duration::from_secs(task.canary_wait_s)).await;
    }

    if !run_gate(ctx, task, &head).await {
        return head_outcomes;
    }

    let mut outcomes = head_outcomes;
    outcomes.extend(run_rolling(ctx, task, tail).await);
    outcomes
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;

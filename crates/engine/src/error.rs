// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy: narrower errors compose into the engine's
//! top-level error types via `#[from]`.

use nexus_core::{ConfigError, GroupName, HostName, TaskName};
use nexus_dag::DagError;
use nexus_ssh::{PoolError, TransportError};
use thiserror::Error;

/// Step/host-level execution failure: connection, transport, step
/// timeout, or a failing command.
#[derive(Debug, Error, Clone)]
pub enum ExecError {
    #[error("connection error: {0}")]
    Connection(#[from] PoolError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("step timed out after {0}ms")]
    StepTimeout(u64),
    #[error("command failed with exit code {0}")]
    CommandFailed(i32),
    #[error("health check failed: {0}")]
    HealthCheckFailed(String),
    #[error("no hosts resolved for target {0}")]
    NoHosts(String),
}

/// Pipeline-level failure, fatal before any task runs.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unknown target tasks: {0:?}")]
    UnknownTasks(Vec<TaskName>),
    #[error("dependency cycle: {0:?}")]
    Cycle(Vec<TaskName>),
    #[error("task {task} targets undefined host {host}")]
    UndefinedHost { task: TaskName, host: HostName },
    #[error("task {task} targets undefined group {group}")]
    UndefinedGroup { task: TaskName, group: GroupName },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl From<DagError> for OrchestratorError {
    fn from(e: DagError) -> Self {
        match e {
            DagError::Cycle { path } => OrchestratorError::Cycle(path),
            DagError::UnknownTasks { names } => OrchestratorError::UnknownTasks(names),
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),
    #[error("task {task} has on = \"{target}\", which matches neither a host nor a group")]
    AmbiguousTarget { task: String, target: String },
    #[error("unknown strategy {strategy:?} on task {task} (expected parallel, serial, rolling, or canary)")]
    UnknownStrategy { task: String, strategy: String },
    #[error(transparent)]
    Validation(#[from] nexus_core::ConfigError),
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step variants.
//!
//! Dynamic dispatch on step kind is modeled as a tagged variant rather than
//! a trait object: shell/upload/download/template/wait-for implement only
//! "apply" semantics, while the resource kinds additionally carry enough
//! information for the describe/check/apply protocol.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::names::HandlerName;
use crate::predicate::Predicate;

/// Kind discriminant for the wait-for step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitForKind {
    Http,
    Tcp,
    Command,
}

/// Desired-state attributes for the declarative resource kinds: package,
/// service, file, directory, user, group. Not
/// every field is meaningful for every kind; the executor (`nexus-engine`)
/// interprets the subset relevant to its `ResourceKind`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAttrs {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Package,
    Service,
    File,
    Directory,
    User,
    Group,
}

/// Every step variant, tagged on `kind` for a readable DSL/JSON
/// encoding. `when`/`notify` are common to every variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Shell {
        cmd: String,
        #[serde(default)]
        sudo: bool,
        #[serde(default)]
        sudo_user: Option<String>,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
        #[serde(default)]
        retries: u32,
        #[serde(default = "default_retry_delay_ms")]
        retry_delay_ms: u64,
        #[serde(default)]
        when: Predicate,
        #[serde(default)]
        notify: Option<HandlerName>,
    },
    Upload {
        local_path: String,
        remote_path: String,
        #[serde(default)]
        sudo: bool,
        #[serde(default)]
        mode: Option<String>,
        #[serde(default)]
        when: Predicate,
        #[serde(default)]
        notify: Option<HandlerName>,
    },
    Download {
        remote_path: String,
        local_path: String,
        #[serde(default)]
        sudo: bool,
        #[serde(default)]
        when: Predicate,
        #[serde(default)]
        notify: Option<HandlerName>,
    },
    Template {
        source: String,
        destination: String,
        #[serde(default)]
        vars: HashMap<String, serde_json::Value>,
        #[serde(default)]
        sudo: bool,
        #[serde(default)]
        mode: Option<String>,
        #[serde(default)]
        when: Predicate,
        #[serde(default)]
        notify: Option<HandlerName>,
    },
    WaitFor {
        #[serde(rename = "type")]
        kind: WaitForKind,
        target: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
        #[serde(default)]
        expected_status: Option<u16>,
        #[serde(default)]
        expected_body: Option<String>,
        #[serde(default)]
        when: Predicate,
    },
    GuardedCommand {
        cmd: String,
        #[serde(default)]
        creates: Option<String>,
        #[serde(default)]
        removes: Option<String>,
        #[serde(default)]
        unless: Option<String>,
        #[serde(default)]
        onlyif: Option<String>,
        #[serde(default)]
        sudo: bool,
        #[serde(default)]
        sudo_user: Option<String>,
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
        #[serde(default)]
        when: Predicate,
        #[serde(default)]
        notify: Option<HandlerName>,
    },
    Resource {
        resource: ResourceKind,
        name: String,
        #[serde(default)]
        attrs: ResourceAttrs,
        #[serde(default)]
        when: Predicate,
        #[serde(default)]
        notify: Option<HandlerName>,
    },
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_interval_ms() -> u64 {
    1_000
}

impl Step {
    /// A short human-readable label used as the step-result `description`.
    pub fn description(&self) -> String {
        match self {
            Step::Shell { cmd, .. } => format!("shell: {cmd}"),
            Step::Upload { remote_path, .. } => format!("upload: {remote_path}"),
            Step::Download { local_path, .. } => format!("download: {local_path}"),
            Step::Template { destination, .. } => format!("template: {destination}"),
            Step::WaitFor { kind, target, .. } => format!("wait_for {kind:?}: {target}"),
            Step::GuardedCommand { cmd, .. } => format!("command: {cmd}"),
            Step::Resource { resource, name, .. } => format!("{resource:?}: {name}"),
        }
    }

    pub fn when(&self) -> &Predicate {
        match self {
            Step::Shell { when, .. }
            | Step::Upload { when, .. }
            | Step::Download { when, .. }
            | Step::Template { when, .. }
            | Step::WaitFor { when, .. }
            | Step::GuardedCommand { when, .. }
            | Step::Resource { when, .. } => when,
        }
    }

    pub fn notify(&self) -> Option<&HandlerName> {
        match self {
            Step::Shell { notify, .. }
            | Step::Upload { notify, .. }
            | Step::Download { notify, .. }
            | Step::Template { notify, .. }
            | Step::GuardedCommand { notify, .. }
            | Step::Resource { notify, .. } => notify.as_ref(),
            Step::WaitFor { .. } => None,
        }
    }

    /// Only shell and guarded-command steps retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Step::Shell { .. } | Step::GuardedCommand { .. })
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intermediate HCL document shape. Labeled blocks (`host "web1" { ... }`)
//! deserialize straight into `IndexMap` keyed by label, kept ordered via
//! `indexmap` rather than `std::collections::HashMap`.

use indexmap::IndexMap;
use nexus_core::Step;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Document {
    #[serde(default, alias = "host")]
    pub hosts: IndexMap<String, HostDoc>,
    #[serde(default, alias = "group")]
    pub groups: IndexMap<String, GroupDoc>,
    #[serde(default, alias = "task")]
    pub tasks: IndexMap<String, TaskDoc>,
    #[serde(default, alias = "handler")]
    pub handlers: IndexMap<String, HandlerDoc>,
    #[serde(default)]
    pub defaults: Option<DefaultsDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HostDoc {
    pub hostname: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub identity_file: Option<String>,
    #[serde(default)]
    pub proxy_jump: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GroupDoc {
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TaskDoc {
    #[serde(default)]
    pub deps: Vec<String>,
    pub on: String,
    #[serde(default)]
    pub commands: Vec<Step>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub canary_hosts: Option<usize>,
    #[serde(default)]
    pub canary_wait_s: Option<u64>,
    #[serde(default)]
    pub continue_on_error: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HandlerDoc {
    #[serde(default)]
    pub commands: Vec<Step>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DefaultsDoc {
    #[serde(default)]
    pub default_user: Option<String>,
    #[serde(default)]
    pub default_port: Option<u16>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub command_timeout_ms: Option<u64>,
    #[serde(default)]
    pub max_connections: Option<usize>,
    #[serde(default)]
    pub continue_on_error: Option<bool>,
}

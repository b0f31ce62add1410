// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host and host-group records.

use serde::{Deserialize, Serialize};

use crate::names::HostName;

/// A single remote target. Per-host SSH options beyond `hostname`/`user`/
/// `port` (identity file, proxy-jump, etc.) are opaque to the core; they
/// pass through to `nexus-ssh::HostAddr` untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: HostName,
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

impl Host {
    pub fn new(name: impl Into<HostName>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            user: None,
            port: None,
            identity_file: None,
            proxy_jump: None,
        }
    }

    /// Effective port, falling back to the given config-wide default.
    pub fn port_or(&self, default_port: u16) -> u16 {
        self.port.unwrap_or(default_port)
    }

    /// Effective user, falling back to the given config-wide default.
    pub fn user_or<'a>(&'a self, default_user: &'a str) -> &'a str {
        self.user.as_deref().unwrap_or(default_user)
    }
}

/// An ordered, semantically-set collection of host names (spec allows
/// duplicate members; the core treats repeats as a no-op rather than an
/// error, matching "duplicates allowed but semantically a set").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostGroup {
    pub name: crate::names::GroupName,
    pub members: Vec<HostName>,
}

impl HostGroup {
    pub fn new(name: impl Into<crate::names::GroupName>, members: Vec<HostName>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Members with duplicates removed, preserving first-seen order.
    pub fn unique_members(&self) -> Vec<HostName> {
        let mut seen = std::collections::HashSet::new();
        self.members
            .iter()
            .filter(|m| seen.insert((*m).clone()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Transport` capability seam.
//!
//! Every concrete session (real `russh` dial or fake in-memory script)
//! implements this trait. The engine and pool depend only on it.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::TransportError;

/// An already-resolved destination: no SSH-config-file reading, no
/// secrets-vault lookups happen below this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostAddr {
    pub hostname: String,
    pub port: u16,
    pub user: String,
    pub identity_path: Option<String>,
    pub password: Option<String>,
    /// TOFU: accept an unknown host key instead of failing the dial.
    pub silently_accept_hosts: bool,
}

impl HostAddr {
    pub fn new(hostname: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            user: user.into(),
            identity_path: None,
            password: None,
            silently_accept_hosts: false,
        }
    }

    /// The destination key a connection pool groups sessions by
    /// (`host:port:user`).
    pub fn destination_key(&self) -> String {
        format!("{}:{}:{}", self.hostname, self.port, self.user)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}{}", self.stdout, self.stderr)
        }
    }
}

/// Run a command with a timeout, stream SFTP read/write, and probe
/// liveness. `dial`/`close` live outside the trait object itself — a
/// `Transport` value *is* an open session; the pool owns the
/// dial/close lifecycle.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a command, waiting up to `timeout` for it to finish.
    async fn exec(&self, command: &str, timeout: Duration) -> Result<CommandOutput, TransportError>;

    /// Write `contents` to `remote_path` over SFTP, creating parent
    /// directories as needed.
    async fn sftp_write(&self, remote_path: &str, contents: &[u8]) -> Result<(), TransportError>;

    /// Read `remote_path` into memory over SFTP.
    async fn sftp_read(&self, remote_path: &str) -> Result<Vec<u8>, TransportError>;

    /// `chmod` a remote path to an octal mode string (e.g. `"0644"`).
    async fn chmod(&self, remote_path: &str, mode: &str) -> Result<(), TransportError>;

    /// Cheap liveness probe used by the pool before handing a session
    /// out.
    async fn is_alive(&self) -> bool;

    /// Close the underlying channel/session.
    async fn close(&self);
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

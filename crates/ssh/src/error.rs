// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds for the transport and pool.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("dial failed: {0}")]
    DialFailed(String),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("host key rejected for {host} (silently_accept_hosts is false)")]
    HostKeyRejected { host: String },
    #[error("private key permissions too loose: {path} (require 0600 or stricter)")]
    KeyPermissionsTooLoose { path: String },
    #[error("command execution failed: {0}")]
    ExecFailed(String),
    #[error("operation timed out after {0}ms")]
    Timeout(u64),
    #[error("sftp error: {0}")]
    Sftp(String),
    #[error("session is not alive")]
    NotAlive,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Clone for TransportError {
    fn clone(&self) -> Self {
        match self {
            TransportError::DialFailed(s) => TransportError::DialFailed(s.clone()),
            TransportError::AuthFailed(s) => TransportError::AuthFailed(s.clone()),
            TransportError::HostKeyRejected { host } => TransportError::HostKeyRejected { host: host.clone() },
            TransportError::KeyPermissionsTooLoose { path } => {
                TransportError::KeyPermissionsTooLoose { path: path.clone() }
            }
            TransportError::ExecFailed(s) => TransportError::ExecFailed(s.clone()),
            TransportError::Timeout(ms) => TransportError::Timeout(*ms),
            TransportError::Sftp(s) => TransportError::Sftp(s.clone()),
            TransportError::NotAlive => TransportError::NotAlive,
            TransportError::Io(e) => TransportError::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("checkout timed out after {0}ms")]
    CheckoutTimeout(u64),
    #[error("pool lock timeout")]
    PoolLockTimeout,
    #[error("pool is closed")]
    PoolClosed,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

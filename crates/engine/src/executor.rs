// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The local/remote dispatch seam step executors run against. For
//! `on = :local` the step sequence runs once against the local
//! executor, which invokes the host shell directly rather than an SSH
//! channel.

use std::path::Path;
use std::time::Duration;

use nexus_ssh::{CommandOutput, Transport, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Either the local machine (no SSH session) or an open remote session.
pub enum Executor<'a, T: Transport> {
    Local,
    Remote(&'a T),
}

impl<'a, T: Transport> Executor<'a, T> {
    pub async fn exec(&self, command: &str, timeout: Duration) -> Result<CommandOutput, TransportError> {
        match self {
            Executor::Local => exec_local(command, timeout).await,
            Executor::Remote(t) => t.exec(command, timeout).await,
        }
    }

    pub async fn write_file(&self, path: &str, contents: &[u8]) -> Result<(), TransportError> {
        match self {
            Executor::Local => write_local(path, contents).await,
            Executor::Remote(t) => t.sftp_write(path, contents).await,
        }
    }

    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        match self {
            Executor::Local => read_local(path).await,
            Executor::Remote(t) => t.sftp_read(path).await,
        }
    }

    pub async fn chmod(&self, path: &str, mode: &str) -> Result<(), TransportError> {
        match self {
            Executor::Local => chmod_local(path, mode).await,
            Executor::Remote(t) => t.chmod(path, mode).await,
        }
    }
}

async fn exec_local(command: &str, timeout: Duration) -> Result<CommandOutput, TransportError> {
    let fut = tokio::process::Command::new("sh").arg("-c").arg(command).output();
    let output = tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| TransportError::Timeout(timeout.as_millis() as u64))??;
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub(crate) async fn write_local(path: &str, contents: &[u8]) -> Result<(), TransportError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    Ok(())
}

pub(crate) async fn read_local(path: &str) -> Result<Vec<u8>, TransportError> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn chmod_local(path: &str, mode: &str) -> Result<(), TransportError> {
    let parsed = u32::from_str_radix(mode, 8)
        .map_err(|e| TransportError::ExecFailed(format!("invalid mode {mode}: {e}")))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(parsed)).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = parsed;
    }
    Ok(())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

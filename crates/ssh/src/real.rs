// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real `Transport` implementation, dialing over `russh` (pure-Rust
//! SSH, no libssh2/OpenSSH subprocess dependency).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use russh::client::{self, Handle};
use russh::ChannelMsg;
use russh_keys::key::PublicKey;
use tokio::time::timeout;

use crate::auth::{check_key_permissions, resolve_auth_methods, AuthMethod};
use crate::error::TransportError;
use crate::transport::{CommandOutput, HostAddr, Transport};

struct ClientHandler {
    silently_accept_hosts: bool,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        // Unknown hosts cause a dial failure unless
        // `silently_accept_hosts` is true. TOFU/known-hosts persistence is
        // the operator's SSH-config-file collaborator's concern, not ours.
        Ok(self.silently_accept_hosts)
    }
}

/// A live, authenticated SSH session.
pub struct RealTransport {
    handle: Arc<Mutex<Option<Handle<ClientHandler>>>>,
    addr: HostAddr,
}

impl RealTransport {
    /// Dial `addr`, trying auth methods in priority order until one
    /// succeeds or all are exhausted.
    pub async fn dial(addr: &HostAddr, connect_timeout: Duration) -> Result<Self, TransportError> {
        let config = Arc::new(client::Config {
            connection_timeout: Some(connect_timeout),
            ..Default::default()
        });
        let handler = ClientHandler {
            silently_accept_hosts: addr.silently_accept_hosts,
        };

        let mut handle = timeout(
            connect_timeout,
            client::connect(config, (addr.hostname.as_str(), addr.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(connect_timeout.as_millis() as u64))?
        .map_err(|e| TransportError::DialFailed(e.to_string()))?;

        let home = dirs_home();
        let ssh_auth_sock_set = std::env::var_os("SSH_AUTH_SOCK").is_some();
        let methods = resolve_auth_methods(addr, ssh_auth_sock_set, &home);

        let mut last_err = TransportError::AuthFailed("no auth methods available".to_string());
        let mut authenticated = false;
        for method in methods {
            match Self::try_auth(&mut handle, &addr.user, &method).await {
                Ok(true) => {
                    authenticated = true;
                    break;
                }
                Ok(false) => continue,
                Err(e) => {
                    last_err = e;
                }
            }
        }

        if !authenticated {
            return Err(last_err);
        }

        Ok(Self {
            handle: Arc::new(Mutex::new(Some(handle))),
            addr: addr.clone(),
        })
    }

    async fn try_auth(
        handle: &mut Handle<ClientHandler>,
        user: &str,
        method: &AuthMethod,
    ) -> Result<bool, TransportError> {
        match method {
            AuthMethod::Identity(path) | AuthMethod::DefaultKey(path) => {
                if !path.exists() {
                    return Ok(false);
                }
                check_key_permissions(path)?;
                let key_pair = russh_keys::load_secret_key(path, None)
                    .map_err(|e| TransportError::AuthFailed(e.to_string()))?;
                let ok = handle
                    .authenticate_publickey(user, Arc::new(key_pair))
                    .await
                    .map_err(|e| TransportError::AuthFailed(e.to_string()))?;
                Ok(ok)
            }
            AuthMethod::Password(password) => {
                let ok = handle
                    .authenticate_password(user, password)
                    .await
                    .map_err(|e| TransportError::AuthFailed(e.to_string()))?;
                Ok(ok)
            }
            AuthMethod::Agent => {
                // Agent-forwarded auth is environment-dependent and out of
                // this transport's direct control; treated as unavailable
                // when russh's agent client can't reach SSH_AUTH_SOCK.
                Ok(false)
            }
        }
    }

    fn handle_guard(&self) -> Result<Handle<ClientHandler>, TransportError> {
        // `Handle` is cheaply cloneable (it's a channel-backed handle into
        // the connection's event loop), so we clone under the lock rather
        // than holding it across an await point.
        self.handle
            .lock()
            .clone()
            .ok_or(TransportError::NotAlive)
    }
}

#[async_trait]
impl Transport for RealTransport {
    async fn exec(&self, command: &str, timeout_dur: Duration) -> Result<CommandOutput, TransportError> {
        let handle = self.handle_guard()?;
        let fut = async {
            let mut channel = handle
                .channel_open_session()
                .await
                .map_err(|e| TransportError::ExecFailed(e.to_string()))?;
            channel
                .exec(true, command)
                .await
                .map_err(|e| TransportError::ExecFailed(e.to_string()))?;

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let mut exit_code = -1;

            loop {
                match channel.wait().await {
                    Some(ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                    Some(ChannelMsg::ExtendedData { data, .. }) => stderr.extend_from_slice(&data),
                    Some(ChannelMsg::ExitStatus { exit_status }) => exit_code = exit_status as i32,
                    Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => break,
                    _ => {}
                }
            }

            Ok(CommandOutput {
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                exit_code,
            })
        };

        timeout(timeout_dur, fut)
            .await
            .map_err(|_| TransportError::Timeout(timeout_dur.as_millis() as u64))?
    }

    async fn sftp_write(&self, remote_path: &str, contents: &[u8]) -> Result<(), TransportError> {
        let handle = self.handle_guard()?;
        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        let sftp = russh_sftp::client::SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;

        if let Some(parent) = std::path::Path::new(remote_path).parent() {
            let mut acc = PathBuf::new();
            for component in parent.components() {
                acc.push(component);
                let dir = acc.to_string_lossy().to_string();
                if dir.is_empty() {
                    continue;
                }
                // best-effort: ignore "already exists" failures.
                let _ = sftp.create_dir(&dir).await;
            }
        }

        let mut file = sftp
            .create(remote_path)
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        use tokio::io::AsyncWriteExt;
        file.write_all(contents)
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        file.shutdown().await.map_err(|e| TransportError::Sftp(e.to_string()))?;
        Ok(())
    }

    async fn sftp_read(&self, remote_path: &str) -> Result<Vec<u8>, TransportError> {
        let handle = self.handle_guard()?;
        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        let sftp = russh_sftp::client::SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;

        let mut file = sftp
            .open(remote_path)
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        use tokio::io::AsyncReadExt;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .await
            .map_err(|e| TransportError::Sftp(e.to_string()))?;
        Ok(buf)
    }

    async fn chmod(&self, remote_path: &str, mode: &str) -> Result<(), TransportError> {
        let escaped = shell_quote(remote_path);
        let cmd = format!("chmod {mode} {escaped}");
        let out = self.exec(&cmd, Duration::from_secs(10)).await?;
        if out.exit_code != 0 {
            return Err(TransportError::ExecFailed(format!("chmod failed: {}", out.combined())));
        }
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        matches!(self.exec("true", Duration::from_secs(5)).await, Ok(out) if out.exit_code == 0)
    }

    async fn close(&self) {
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle
                .disconnect(russh::Disconnect::ByApplication, "", "English")
                .await;
        }
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/root"))
}

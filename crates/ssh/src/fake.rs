// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory `Transport` for engine tests: no network I/O, scripted
//! command responses, and an observable call log (teacher's
//! `FakeAgentAdapter` pattern, `crates/adapters/src/agent/fake.rs`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::{CommandOutput, Transport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    Exec(String),
    SftpWrite(String),
    SftpRead(String),
    Chmod(String, String),
    IsAlive,
    Close,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<TransportCall>,
    files: HashMap<String, Vec<u8>>,
    alive: bool,
    closed: bool,
}

/// A scripted `Transport`. Register exact-match responses with
/// [`FakeTransport::on_exec`]; unregistered commands return exit code 0
/// with empty output, matching a quiet no-op shell command.
#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
    scripts: Arc<Mutex<HashMap<String, CommandOutput>>>,
    dial_error: Option<String>,
    exec_error: Option<String>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                alive: true,
                ..Default::default()
            })),
            scripts: Arc::new(Mutex::new(HashMap::new())),
            dial_error: None,
            exec_error: None,
        }
    }

    pub fn with_exec_error(mut self, message: impl Into<String>) -> Self {
        self.exec_error = Some(message.into());
        self
    }

    pub fn on_exec(&self, command: impl Into<String>, output: CommandOutput) {
        self.scripts.lock().insert(command.into(), output);
    }

    pub fn set_alive(&self, alive: bool) {
        self.state.lock().alive = alive;
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    pub fn seed_file(&self, remote_path: &str, contents: &[u8]) {
        self.state
            .lock()
            .files
            .insert(remote_path.to_string(), contents.to_vec());
    }

    pub fn seeded_file(&self, remote_path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(remote_path).cloned()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn exec(&self, command: &str, _timeout: Duration) -> Result<CommandOutput, TransportError> {
        self.state.lock().calls.push(TransportCall::Exec(command.to_string()));
        if let Some(msg) = &self.exec_error {
            return Err(TransportError::ExecFailed(msg.clone()));
        }
        let scripted = self.scripts.lock().get(command).cloned();
        Ok(scripted.unwrap_or(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        }))
    }

    async fn sftp_write(&self, remote_path: &str, contents: &[u8]) -> Result<(), TransportError> {
        self.state
            .lock()
            .calls
            .push(TransportCall::SftpWrite(remote_path.to_string()));
        self.state.lock().files.insert(remote_path.to_string(), contents.to_vec());
        Ok(())
    }

    async fn sftp_read(&self, remote_path: &str) -> Result<Vec<u8>, TransportError> {
        self.state
            .lock()
            .calls
            .push(TransportCall::SftpRead(remote_path.to_string()));
        self.state
            .lock()
            .files
            .get(remote_path)
            .cloned()
            .ok_or_else(|| TransportError::Sftp(format!("no such file: {remote_path}")))
    }

    async fn chmod(&self, remote_path: &str, mode: &str) -> Result<(), TransportError> {
        self.state
            .lock()
            .calls
            .push(TransportCall::Chmod(remote_path.to_string(), mode.to_string()));
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.state.lock().calls.push(TransportCall::IsAlive);
        self.state.lock().alive
    }

    async fn close(&self) {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::Close);
        state.closed = true;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

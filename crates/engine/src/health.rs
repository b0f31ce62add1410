// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health checker: poll a condition at a fixed interval until success
//! or deadline, never sleeping after a first-probe success.

use std::time::{Duration, Instant};

use nexus_core::WaitForKind;
use nexus_ssh::Transport;
use regex::Regex;

use crate::executor::Executor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    Timeout,
    ProbeError(String),
}

impl std::fmt::Display for HealthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthError::Timeout => write!(f, "timeout"),
            HealthError::ProbeError(e) => write!(f, "probe error: {e}"),
        }
    }
}

/// The fields a `Step::WaitFor` carries, independent of step
/// representation so `health::wait_for` can be unit-tested directly.
pub struct Probe<'a> {
    pub kind: WaitForKind,
    /// URL for `Http`, `host:port` for `Tcp`, command string for `Command`.
    pub target: &'a str,
    pub expected_status: u16,
    pub expected_body: Option<&'a str>,
}

/// Poll `probe` at `interval_ms` until success or `timeout_ms` elapses.
/// Never sleeps if the first probe succeeds.
pub async fn wait_for<T: Transport>(
    probe: &Probe<'_>,
    executor: &Executor<'_, T>,
    interval_ms: u64,
    timeout_ms: u64,
) -> Result<(), HealthError> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let interval = Duration::from_millis(interval_ms);

    loop {
        if check_once(probe, executor).await {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(HealthError::Timeout);
        }
        let remaining = deadline - now;
        tokio::time::sleep(interval.min(remaining)).await;
        if Instant::now() >= deadline {
            return Err(HealthError::Timeout);
        }
    }
}

async fn check_once<T: Transport>(probe: &Probe<'_>, executor: &Executor<'_, T>) -> bool {
    match probe.kind {
        WaitForKind::Http => check_http(probe.target, probe.expected_status, probe.expected_body).await,
        WaitForKind::Tcp => check_tcp(probe.target).await,
        WaitForKind::Command => executor
            .exec(probe.target, Duration::from_secs(10))
            .await
            .map(|out| out.exit_code == 0)
            .unwrap_or(false),
    }
}

async fn check_http(url: &str, expected_status: u16, expected_body: Option<&str>) -> bool {
    let client = match reqwest::Client::builder().timeout(Duration::from_secs(5)).build() {
        Ok(c) => c,
        Err(_) => return false,
    };
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(_) => return false,
    };
    if response.status().as_u16() != expected_status {
        return false;
    }
    match expected_body {
        None => true,
        Some(pattern) => match response.text().await {
            Ok(body) => body_matches(&body, pattern),
            Err(_) => false,
        },
    }
}

fn body_matches(body: &str, pattern: &str) -> bool {
    if let Ok(re) = Regex::new(pattern) {
        if re.is_match(body) {
            return true;
        }
    }
    body.contains(pattern)
}

async fn check_tcp(address: &str) -> bool {
    let connect = tokio::net::TcpStream::connect(address);
    matches!(tokio::time::timeout(Duration::from_secs(5), connect).await, Ok(Ok(_)))
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Facts provider: gather-once per host per run, cache for the run's
//! lifetime, serialize concurrent
//! first-miss lookups so losers observe the winner's result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use nexus_core::{FactValue, Facts};
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::executor::Executor;
use nexus_ssh::{Transport, TransportError};

const LOCAL_KEY: &str = ":local";

/// One shared, write-once-per-host, read-many map.
#[derive(Default)]
pub struct FactsCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<Facts>>>>,
}

impl FactsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up cached facts for `host_key`, gathering via `executor` on
    /// first miss. Concurrent callers for the same key share the same
    /// `OnceCell` and so observe the single winner's result rather than
    /// racing to gather twice.
    pub async fn get_or_gather<T: Transport>(
        &self,
        host_key: &str,
        executor: &Executor<'_, T>,
    ) -> Result<Facts, TransportError> {
        let cell = {
            let mut cells = self.cells.lock();
            cells.entry(host_key.to_string()).or_default().clone()
        };
        let facts = cell.get_or_try_init(|| gather(host_key, executor)).await?;
        Ok(facts.clone())
    }

    pub fn clear(&self) {
        self.cells.lock().clear();
    }
}

/// Printed in this order by `PROBE`: OS name, machine arch, CPU count,
/// memory in bytes. Works unprobed for local execution too since
/// `Executor::Local` shells out through `sh -c` the same as a remote
/// session, so the same probe gathers OS family, arch, CPU count, and
/// memory either way.
const PROBE: &str = "uname -s; uname -m; \
(nproc 2>/dev/null || getconf _NPROCESSORS_ONLN 2>/dev/null || echo 1); \
(awk '/MemTotal/{print $2*1024}' /proc/meminfo 2>/dev/null || sysctl -n hw.memsize 2>/dev/null || echo 0)";

async fn gather<T: Transport>(host_key: &str, executor: &Executor<'_, T>) -> Result<Facts, TransportError> {
    let out = executor.exec(PROBE, Duration::from_secs(10)).await?;
    let mut lines = out.stdout.lines();

    let os_family = match lines.next().unwrap_or_default().trim().to_lowercase().as_str() {
        "linux" => "linux",
        "darwin" => "darwin",
        _ => "unknown",
    };
    let arch = lines.next().unwrap_or_default().trim();
    let arch = if arch.is_empty() { std::env::consts::ARCH } else { arch };
    let cpu_count: i64 = lines.next().unwrap_or_default().trim().parse().unwrap_or(1);
    let memory: i64 = lines.next().unwrap_or_default().trim().parse().unwrap_or(0);

    let mut facts = Facts::new();
    facts.insert("os_family", FactValue::Str(os_family.to_string()));
    facts.insert("arch", FactValue::Str(arch.to_string()));
    facts.insert("cpu_count", FactValue::Int(cpu_count));
    facts.insert("memory", FactValue::Int(memory));
    facts.insert("hostname", FactValue::Str(host_key.to_string()));
    Ok(facts)
}

#[cfg(test)]
#[path = "facts_tests.rs"]
mod tests;

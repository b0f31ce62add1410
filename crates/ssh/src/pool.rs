// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pool.
//!
//! Per-destination bounded pools of `Transport` sessions, single-flight
//! creation keyed by destination, idle reaping, and validation on
//! checkout.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use crate::error::{PoolError, TransportError};
use crate::transport::{HostAddr, Transport};

pub type DestinationKey = String;

#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Max sessions per destination (defaults to Config's
    /// `max_connections`, default 5).
    pub size: usize,
    pub checkout_timeout: Duration,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 5,
            checkout_timeout: Duration::from_millis(30_000),
            idle_timeout: Duration::from_millis(300_000),
            connect_timeout: Duration::from_millis(10_000),
        }
    }
}

struct Slot<T> {
    transport: Arc<T>,
    last_used: Instant,
}

struct Destination<T> {
    config: PoolConfig,
    semaphore: Arc<Semaphore>,
    idle: AsyncMutex<Vec<Slot<T>>>,
}

/// A dial function the pool calls to create a fresh session for a
/// destination. Abstracted so tests can supply `FakeTransport` dials
/// without touching the network.
pub type DialFn<T> = Arc<
    dyn Fn(HostAddr) -> std::pin::Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send>> + Send + Sync,
>;

/// Per-destination bounded session pool.
pub struct Pool<T: Transport + 'static> {
    destinations: Mutex<HashMap<DestinationKey, Arc<Destination<T>>>>,
    creation_lock: AsyncMutex<()>,
    dial: DialFn<T>,
    closed: Mutex<bool>,
}

impl<T: Transport + 'static> Pool<T> {
    pub fn new(dial: DialFn<T>) -> Self {
        Self {
            destinations: Mutex::new(HashMap::new()),
            creation_lock: AsyncMutex::new(()),
            dial,
            closed: Mutex::new(false),
        }
    }

    /// Single-flight lookup-or-create of the per-destination pool state.
    async fn destination_for(&self, key: &DestinationKey, config: &PoolConfig) -> Arc<Destination<T>> {
        if let Some(dest) = self.destinations.lock().get(key).cloned() {
            return dest;
        }
        // Serialize first-access creation so concurrent callers for the
        // same key never build two independent pools.
        let _guard = self.creation_lock.lock().await;
        if let Some(dest) = self.destinations.lock().get(key).cloned() {
            return dest;
        }
        let dest = Arc::new(Destination {
            config: config.clone(),
            semaphore: Arc::new(Semaphore::new(config.size)),
            idle: AsyncMutex::new(Vec::new()),
        });
        self.destinations.lock().insert(key.clone(), dest.clone());
        dest
    }

    /// Block up to `checkout_timeout` acquiring a permit, validate (or
    /// dial) a session, run `f` against it, then return it to the pool.
    pub async fn checkout<F, Fut, R>(&self, addr: &HostAddr, config: &PoolConfig, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(Arc<T>) -> Fut,
        Fut: Future<Output = R>,
    {
        if *self.closed.lock() {
            return Err(PoolError::PoolClosed);
        }

        let key = addr.destination_key();
        let dest = self.destination_for(&key, config).await;

        let permit = tokio::time::timeout(config.checkout_timeout, dest.semaphore.clone().acquire_owned())
            .await
            .map_err(|_| PoolError::CheckoutTimeout(config.checkout_timeout.as_millis() as u64))?
            .map_err(|_| PoolError::PoolClosed)?;

        let transport = self.validated_session(&dest, addr).await?;
        let result = f(transport.clone()).await;

        // Return-to-pool: a session is re-validated lazily on its *next*
        // checkout, not eagerly here.
        dest.idle.lock().await.push(Slot {
            transport,
            last_used: Instant::now(),
        });
        drop(permit);

        Ok(result)
    }

    async fn validated_session(&self, dest: &Destination<T>, addr: &HostAddr) -> Result<Arc<T>, PoolError> {
        self.reap_idle(dest).await;

        let mut idle = dest.idle.lock().await;
        while let Some(slot) = idle.pop() {
            if slot.transport.is_alive().await {
                return Ok(slot.transport);
            }
            // Dropped: validation failed post-use; fall through and dial
            // a fresh one.
        }
        drop(idle);

        let transport = (self.dial)(addr.clone()).await.map_err(PoolError::Transport)?;
        Ok(Arc::new(transport))
    }

    async fn reap_idle(&self, dest: &Destination<T>) {
        let mut idle = dest.idle.lock().await;
        let idle_timeout = dest.config.idle_timeout;
        let now = Instant::now();
        let mut kept = Vec::with_capacity(idle.len());
        for slot in idle.drain(..) {
            if now.duration_since(slot.last_used) < idle_timeout {
                kept.push(slot);
            } else {
                slot.transport.close().await;
            }
        }
        *idle = kept;
    }

    /// Close every session across every destination.
    pub async fn shutdown(&self) {
        *self.closed.lock() = true;
        let destinations: Vec<Arc<Destination<T>>> = self.destinations.lock().values().cloned().collect();
        for dest in destinations {
            let mut idle = dest.idle.lock().await;
            for slot in idle.drain(..) {
                slot.transport.close().await;
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;

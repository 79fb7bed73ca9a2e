/*
 * executor.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Executors schedule closures: inline on the calling thread, or queued onto a worker thread.

use std::thread;

use tokio::sync::mpsc;

use crate::callback::Closure;
use crate::error::{Error, Result};

/// Schedules closures for execution.
pub trait Executor: Send + Sync {
    /// Accept `closure` for execution. An error means it was dropped without running.
    fn add(&self, closure: Closure) -> Result<()>;
}

/// Runs every closure synchronously inside `add`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for InlineExecutor {
    fn add(&self, closure: Closure) -> Result<()> {
        closure.run();
        Ok(())
    }
}

/// FIFO queue drained by one worker thread. Closures run in submission order.
///
/// Dropping the executor closes the queue; the worker finishes what is already queued and exits.
pub struct QueuedExecutor {
    tx: mpsc::UnboundedSender<Closure>,
}

impl QueuedExecutor {
    pub fn new(name: &str) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Closure>();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(closure) = rx.blocking_recv() {
                    closure.run();
                }
                log::debug!("executor queue closed");
            })?;
        Ok(Self { tx })
    }
}

impl Executor for QueuedExecutor {
    fn add(&self, closure: Closure) -> Result<()> {
        self.tx.send(closure).map_err(|_| {
            log::warn!("executor worker gone; closure dropped");
            Error::unknown("executor worker has stopped")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    #[test]
    fn inline_runs_before_add_returns() {
        let (tx, rx) = std_mpsc::channel();
        InlineExecutor::new()
            .add(Closure::once(move || tx.send(7).unwrap()))
            .unwrap();
        assert_eq!(rx.try_recv().unwrap(), 7);
    }

    #[test]
    fn queued_preserves_order_on_worker_thread() {
        let exec = QueuedExecutor::new("test-queue").unwrap();
        let (tx, rx) = std_mpsc::channel();
        for i in 0..20 {
            let tx = tx.clone();
            exec.add(Closure::once(move || {
                let name = thread::current().name().map(|s| s.to_string());
                tx.send((i, name)).unwrap();
            }))
            .unwrap();
        }
        for i in 0..20 {
            let (n, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(n, i);
            assert_eq!(name.as_deref(), Some("test-queue"));
        }
    }

    #[test]
    fn add_fails_once_worker_has_died() {
        let exec = QueuedExecutor::new("test-dying").unwrap();
        exec.add(Closure::once(|| panic!("worker dies"))).unwrap();
        let mut rejected = false;
        for _ in 0..200 {
            if let Err(e) = exec.add(Closure::once(|| {})) {
                assert_eq!(e.code(), crate::error::ErrorCode::Unknown);
                rejected = true;
                break;
            }
            thread::sleep(Duration::from_millis(25));
        }
        assert!(rejected, "closed queue still accepted closures");
    }
}

/*
 * pool.rs
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

//! Pool of idle processors owned by a transaction.
//!
//! A processor is handed out by value, so it is used by at most one request at a time. The
//! lock is held only to pop or push, never across network I/O. The pool never shrinks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::config::TransactionOptions;
use crate::protocol::http::processor::Processor;

pub struct ProcessorPool {
    options: TransactionOptions,
    idle: Mutex<Vec<Processor>>,
    allocated: AtomicUsize,
}

impl ProcessorPool {
    pub fn new(options: TransactionOptions) -> Self {
        Self {
            options,
            idle: Mutex::new(Vec::new()),
            allocated: AtomicUsize::new(0),
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<Processor>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pop an idle processor, or make a new one bound to this pool's target.
    pub fn acquire(&self) -> Processor {
        if let Some(p) = self.idle().pop() {
            return p;
        }
        let id = self.allocated.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "new processor #{} for {}:{}",
            id,
            self.options.host,
            self.options.port
        );
        Processor::new(id, &self.options)
    }

    pub fn release(&self, processor: Processor) {
        self.idle().push(processor);
    }

    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }

    /// Processors created over the pool's lifetime.
    pub fn allocated_count(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn released_processor_is_reused() {
        let pool = ProcessorPool::new(TransactionOptions::new("127.0.0.1", 80));
        let p = pool.acquire();
        let id = p.id();
        pool.release(p);
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.acquire().id(), id);
        assert_eq!(pool.allocated_count(), 1);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn concurrent_callers_never_share_a_processor() {
        const THREADS: usize = 8;
        let pool = Arc::new(ProcessorPool::new(TransactionOptions::new("127.0.0.1", 80)));
        let in_use = Arc::new(Mutex::new(HashSet::new()));
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let pool = pool.clone();
                let in_use = in_use.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t as u64);
                    barrier.wait();
                    for _ in 0..200 {
                        let p = pool.acquire();
                        assert!(
                            in_use.lock().unwrap().insert(p.id()),
                            "processor {} handed out twice",
                            p.id()
                        );
                        if rng.gen_bool(0.3) {
                            thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
                        }
                        assert!(in_use.lock().unwrap().remove(&p.id()));
                        pool.release(p);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // At most one processor per concurrent caller was ever needed.
        assert!(pool.allocated_count() <= THREADS);
        assert_eq!(pool.idle_count(), pool.allocated_count());
    }
}

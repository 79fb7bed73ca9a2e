/*
 * callback.rs
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

//! Closures used for asynchronous notification: invoke-once or invoke-repeatable.

use std::fmt;
use std::sync::Arc;

/// Argument-less closure, the unit of work handed to an `Executor`.
pub enum Closure {
    /// Consumed by its single invocation.
    Once(Box<dyn FnOnce() + Send>),
    /// May be invoked any number of times.
    Repeatable(Arc<dyn Fn() + Send + Sync>),
}

impl Closure {
    pub fn once(f: impl FnOnce() + Send + 'static) -> Self {
        Closure::Once(Box::new(f))
    }

    pub fn repeatable(f: impl Fn() + Send + Sync + 'static) -> Self {
        Closure::Repeatable(Arc::new(f))
    }

    pub fn is_repeatable(&self) -> bool {
        matches!(self, Closure::Repeatable(_))
    }

    pub fn run(self) {
        match self {
            Closure::Once(f) => f(),
            Closure::Repeatable(f) => f(),
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closure::Once(_) => f.write_str("Closure::Once"),
            Closure::Repeatable(_) => f.write_str("Closure::Repeatable"),
        }
    }
}

/// Closure taking one borrowed argument.
pub enum Callback1<A: ?Sized> {
    Once(Box<dyn FnOnce(&A) + Send>),
    Repeatable(Arc<dyn Fn(&A) + Send + Sync>),
}

impl<A: ?Sized> Callback1<A> {
    pub fn once(f: impl FnOnce(&A) + Send + 'static) -> Self {
        Callback1::Once(Box::new(f))
    }

    pub fn repeatable(f: impl Fn(&A) + Send + Sync + 'static) -> Self {
        Callback1::Repeatable(Arc::new(f))
    }

    pub fn is_repeatable(&self) -> bool {
        matches!(self, Callback1::Repeatable(_))
    }

    /// Invoke with `arg`. A repeatable callback hands itself back so the caller can keep it
    /// registered; a one-shot callback is spent.
    pub fn run(self, arg: &A) -> Option<Self> {
        match self {
            Callback1::Once(f) => {
                f(arg);
                None
            }
            Callback1::Repeatable(f) => {
                f(arg);
                Some(Callback1::Repeatable(f))
            }
        }
    }
}

impl<A: ?Sized> fmt::Debug for Callback1<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback1::Once(_) => f.write_str("Callback1::Once"),
            Callback1::Repeatable(_) => f.write_str("Callback1::Repeatable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn once_runs_and_is_spent() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let cb: Callback1<str> = Callback1::once(move |s: &str| {
            assert_eq!(s, "done");
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!cb.is_repeatable());
        assert!(cb.run("done").is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeatable_comes_back() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let mut cb = Some(Callback1::<u32>::repeatable(move |n| {
            h.fetch_add(*n as usize, Ordering::SeqCst);
        }));
        for _ in 0..3 {
            cb = cb.take().and_then(|c| c.run(&2));
        }
        assert!(cb.is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn closure_variants() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let c = Closure::repeatable(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(c.is_repeatable());
        if let Closure::Repeatable(f) = &c {
            f();
        }
        c.run();
        let h = hits.clone();
        Closure::once(move || {
            h.fetch_add(10, Ordering::SeqCst);
        })
        .run();
        assert_eq!(hits.load(Ordering::SeqCst), 12);
    }
}

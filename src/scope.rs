//! Scoped task spawning on a [`CpuPool`].
//!
//! Tasks spawned inside [`scope`] may borrow from the caller's stack; the
//! scope does not return until every one of them has finished.

use crate::error::{Error, Result};
use crate::executor::{catch_panic, CpuPool};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::marker::PhantomData;

pub struct Scope<'scope> {
    pool: &'scope CpuPool,
    tx: Sender<Option<String>>,
    rx: Receiver<Option<String>>,
    pending: usize,
    panics: Vec<String>,
    _marker: PhantomData<&'scope ()>,
}

impl<'scope> Scope<'scope> {
    fn new(pool: &'scope CpuPool) -> Self {
        let (tx, rx) = unbounded();
        Self {
            pool,
            tx,
            rx,
            pending: 0,
            panics: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn spawn<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        let tx = self.tx.clone();
        self.pending += 1;

        let job: Box<dyn FnOnce() + Send + 'scope> = Box::new(move || {
            let outcome = catch_panic(f).err().map(|info| info.message);
            let _ = tx.send(outcome);
        });

        // SAFETY: `wait_all` runs before the scope is released (including on
        // unwind via Drop), so the job never outlives the borrows it holds.
        let job: Box<dyn FnOnce() + Send + 'static> = unsafe { std::mem::transmute(job) };

        self.pool.execute(job);
    }

    fn wait_all(&mut self) {
        while self.pending > 0 {
            match self.rx.recv() {
                Ok(Some(message)) => self.panics.push(message),
                Ok(None) => {}
                // unreachable while `self.tx` is alive
                Err(_) => break,
            }
            self.pending -= 1;
        }
    }
}

impl<'scope> Drop for Scope<'scope> {
    fn drop(&mut self) {
        self.wait_all();
    }
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("pending", &self.pending)
            .finish()
    }
}

/// Runs `f` with a scope bound to `pool`, then waits for every spawned task.
///
/// Returns `Error::WorkerPanic` if any spawned task panicked.
pub fn scope<'scope, F, R>(pool: &'scope CpuPool, f: F) -> Result<R>
where
    F: FnOnce(&mut Scope<'scope>) -> R,
{
    let mut scope = Scope::new(pool);
    let result = f(&mut scope);
    scope.wait_all();

    if scope.panics.is_empty() {
        Ok(result)
    } else {
        Err(Error::WorkerPanic(scope.panics.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use parking_lot::Mutex;

    fn pool(n: usize) -> CpuPool {
        CpuPool::new(&Config::builder().num_threads(n).build().unwrap()).unwrap()
    }

    #[test]
    fn test_scope_borrows_stack_data() {
        let pool = pool(4);
        let data: Vec<u64> = (1..=100).collect();
        let mut slots = vec![0u64; 4];

        scope(&pool, |s| {
            for (i, slot) in slots.iter_mut().enumerate() {
                let chunk = &data[i * 25..(i + 1) * 25];
                s.spawn(move || *slot = chunk.iter().sum());
            }
        })
        .unwrap();

        assert_eq!(slots.iter().sum::<u64>(), 5050);
    }

    #[test]
    fn test_scope_simple() {
        let pool = pool(2);
        let counter = Mutex::new(0);

        scope(&pool, |s| {
            for _ in 0..10 {
                s.spawn(|| *counter.lock() += 1);
            }
        })
        .unwrap();

        assert_eq!(*counter.lock(), 10);
    }

    #[test]
    fn test_panic_surfaces_as_error() {
        let pool = pool(2);

        let err = scope(&pool, |s| {
            s.spawn(|| panic!("bad block"));
            s.spawn(|| {});
        })
        .unwrap_err();

        match err {
            Error::WorkerPanic(msg) => assert!(msg.contains("bad block")),
            other => panic!("unexpected error {:?}", other),
        }

        // the pool still serves later scopes
        let value = scope(&pool, |s| {
            s.spawn(|| {});
            7
        })
        .unwrap();
        assert_eq!(value, 7);
    }
}

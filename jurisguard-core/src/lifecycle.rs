// jurisguard-core/src/lifecycle.rs
//! Lazy, single-flight construction of the process-wide engine.
//!
//! The engine moves through `Uninitialized -> Initializing -> Ready`. A failed
//! or panicking construction drops back to `Uninitialized`, so the next caller
//! retries. Callers that arrive while a construction is in flight block on a
//! condition variable and receive the outcome of that same attempt. Once the
//! handle is ready it is read from a `OnceCell` without taking the lock.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, error};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::config::RedactorConfig;
use crate::engine::EngineHandle;
use crate::errors::RedactorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug)]
struct Slot {
    state: LifecycleState,
    /// Incremented each time a construction starts.
    generation: u64,
    /// Callers currently blocked on an in-flight construction.
    waiting: usize,
    last_failure: Option<(u64, RedactorError)>,
}

/// A lazily built, shared value whose construction may fail and be retried.
#[derive(Debug)]
pub struct EngineCell<T> {
    ready: OnceCell<Arc<T>>,
    slot: Mutex<Slot>,
    changed: Condvar,
    constructions: AtomicUsize,
}

impl<T> Default for EngineCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EngineCell<T> {
    pub const fn new() -> Self {
        Self {
            ready: OnceCell::new(),
            slot: Mutex::new(Slot {
                state: LifecycleState::Uninitialized,
                generation: 0,
                waiting: 0,
                last_failure: None,
            }),
            changed: Condvar::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    /// The value, if construction has completed.
    pub fn get(&self) -> Option<Arc<T>> {
        self.ready.get().cloned()
    }

    pub fn state(&self) -> LifecycleState {
        if self.ready.get().is_some() {
            return LifecycleState::Ready;
        }
        self.lock().state
    }

    /// Number of construction attempts started so far.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    /// Number of callers blocked on the construction in flight.
    pub fn waiters(&self) -> usize {
        self.lock().waiting
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // The slot is only ever written with consistent values, so a poisoned
        // lock still holds a usable state.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value, running `init` if no construction has succeeded yet.
    ///
    /// At most one `init` runs at a time. Errors and panics from `init` are
    /// reported as `EngineUnavailable` to the caller that ran it and to every
    /// caller that waited on that attempt.
    pub fn get_or_init<F>(&self, init: F) -> Result<Arc<T>, RedactorError>
    where
        F: FnOnce() -> Result<T, RedactorError>,
    {
        if let Some(value) = self.ready.get() {
            return Ok(Arc::clone(value));
        }

        let mut slot = self.lock();
        loop {
            if let Some(value) = self.ready.get() {
                return Ok(Arc::clone(value));
            }
            if slot.state != LifecycleState::Initializing {
                break;
            }
            let awaited = slot.generation;
            debug!("Waiting for engine construction #{} to finish.", awaited);
            slot.waiting += 1;
            slot = self
                .changed
                .wait_while(slot, |s| s.state == LifecycleState::Initializing && s.generation == awaited)
                .unwrap_or_else(PoisonError::into_inner);
            slot.waiting -= 1;
            if let Some((generation, err)) = &slot.last_failure {
                if *generation == awaited {
                    return Err(err.clone());
                }
            }
        }

        slot.state = LifecycleState::Initializing;
        slot.generation += 1;
        let generation = slot.generation;
        drop(slot);

        self.constructions.fetch_add(1, Ordering::SeqCst);
        let outcome = match panic::catch_unwind(AssertUnwindSafe(init)) {
            Ok(Ok(value)) => Ok(Arc::new(value)),
            Ok(Err(err)) => Err(err.into_engine_unavailable()),
            Err(payload) => Err(RedactorError::EngineUnavailable(format!(
                "engine construction panicked: {}",
                panic_message(payload.as_ref())
            ))),
        };

        let mut slot = self.lock();
        let result = match outcome {
            Ok(value) => {
                // Only the thread holding the Initializing state reaches this,
                // so the cell is still empty.
                let value = Arc::clone(self.ready.get_or_init(|| value));
                slot.state = LifecycleState::Ready;
                slot.last_failure = None;
                Ok(value)
            }
            Err(err) => {
                error!("Engine construction #{} failed: {}", generation, err);
                slot.state = LifecycleState::Uninitialized;
                slot.last_failure = Some((generation, err.clone()));
                Err(err)
            }
        };
        drop(slot);
        self.changed.notify_all();
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

static ENGINE: EngineCell<EngineHandle> = EngineCell::new();

/// Returns the process-wide engine, building it from the resolved
/// configuration (file and environment) on first use.
pub fn get_engine() -> Result<Arc<EngineHandle>, RedactorError> {
    ENGINE.get_or_init(|| {
        let config = RedactorConfig::load(None).map_err(|e| RedactorError::Config(format!("{:#}", e)))?;
        EngineHandle::from_config(&config)
    })
}

/// Builds the process-wide engine from `config` unless one is already ready,
/// in which case the existing engine is returned unchanged.
pub fn init_engine(config: &RedactorConfig) -> Result<Arc<EngineHandle>, RedactorError> {
    if let Some(engine) = ENGINE.get() {
        debug!("Engine already initialized; ignoring the supplied configuration.");
        return Ok(engine);
    }
    ENGINE.get_or_init(|| EngineHandle::from_config(config))
}

pub fn engine_state() -> LifecycleState {
    ENGINE.state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_concurrent_first_calls_construct_once() {
        let cell: EngineCell<String> = EngineCell::new();
        let barrier = Barrier::new(8);
        let results: Vec<Arc<String>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cell.get_or_init(|| {
                            thread::sleep(Duration::from_millis(50));
                            Ok("engine".to_string())
                        })
                        .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cell.constructions(), 1);
        assert_eq!(cell.state(), LifecycleState::Ready);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[test]
    fn test_failure_resets_and_retries() {
        let cell: EngineCell<u32> = EngineCell::new();
        assert_eq!(cell.state(), LifecycleState::Uninitialized);

        let err = cell
            .get_or_init(|| Err(RedactorError::Config("model missing".into())))
            .unwrap_err();
        assert!(matches!(err, RedactorError::EngineUnavailable(ref m) if m.contains("model missing")));
        assert_eq!(cell.state(), LifecycleState::Uninitialized);
        assert!(cell.get().is_none());

        assert_eq!(*cell.get_or_init(|| Ok(7)).unwrap(), 7);
        assert_eq!(*cell.get_or_init(|| Ok(8)).unwrap(), 7, "ready value is never rebuilt");
        assert_eq!(cell.constructions(), 2);
    }

    #[test]
    fn test_panicking_constructor_counts_as_failure() {
        let cell: EngineCell<u32> = EngineCell::new();
        let err = cell.get_or_init(|| panic!("boom")).unwrap_err();
        assert!(matches!(err, RedactorError::EngineUnavailable(ref m) if m.contains("boom")));
        assert_eq!(cell.state(), LifecycleState::Uninitialized);
        assert_eq!(*cell.get_or_init(|| Ok(1)).unwrap(), 1);
    }

    #[test]
    fn test_waiters_share_the_same_failure() {
        let cell: EngineCell<u32> = EngineCell::new();
        let barrier = Barrier::new(4);
        let errors: Vec<RedactorError> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cell.get_or_init(|| {
                            // Fail only once every other caller is parked on this attempt.
                            while cell.waiters() < 3 {
                                thread::sleep(Duration::from_millis(1));
                            }
                            Err(RedactorError::EngineUnavailable("no model".into()))
                        })
                        .unwrap_err()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(errors.iter().all(|e| e.to_string() == errors[0].to_string()));
        assert_eq!(cell.constructions(), 1);
        assert_eq!(cell.waiters(), 0);
        assert_eq!(cell.state(), LifecycleState::Uninitialized);
    }
}

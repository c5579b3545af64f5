//! Background package work and the promise that reports its outcome.
//!
//! Work is a closed set of [`Task`]s run on the blocking pool of a tokio
//! runtime. Callers get a [`Promise`] they can attach callbacks to or
//! await.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use addonsync_pack::{ContentPackage, ContentPackageLoader, PackError};
use addonsync_types::ContentId;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::{TaskError, TaskFailure};

// ============================================================================
// Promise / Resolver
// ============================================================================

type OnResolve<T> = Box<dyn FnOnce(&T) + Send>;
type OnReject = Box<dyn FnOnce(&TaskFailure) + Send>;

enum State<T> {
    Pending {
        on_resolve: Vec<OnResolve<T>>,
        on_reject: Vec<OnReject>,
    },
    Resolved(Arc<T>),
    Rejected(TaskFailure),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    settled: Notify,
}

/// Read side of a pending result.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

/// Write side of a pending result. Settles exactly once.
pub struct Resolver<T> {
    shared: Arc<Shared<T>>,
}

/// Creates a linked resolver and promise.
pub fn promise<T: Send + Sync + 'static>() -> (Resolver<T>, Promise<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Pending {
            on_resolve: Vec::new(),
            on_reject: Vec::new(),
        }),
        settled: Notify::new(),
    });
    (
        Resolver {
            shared: Arc::clone(&shared),
        },
        Promise { shared },
    )
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + Sync + 'static> Promise<T> {
    /// Runs `f` with the value once resolved, immediately if it already is.
    /// Never runs when the promise is rejected.
    pub fn then<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let value = {
            let mut state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                State::Pending { on_resolve, .. } => {
                    on_resolve.push(Box::new(f));
                    return self;
                }
                State::Resolved(value) => Arc::clone(value),
                State::Rejected(_) => return self,
            }
        };
        f(&value);
        self
    }

    /// Runs `f` with the failure once rejected, immediately if it already is.
    pub fn catch<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&TaskFailure) + Send + 'static,
    {
        let failure = {
            let mut state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                State::Pending { on_reject, .. } => {
                    on_reject.push(Box::new(f));
                    return self;
                }
                State::Rejected(failure) => failure.clone(),
                State::Resolved(_) => return self,
            }
        };
        f(&failure);
        self
    }

    pub fn is_settled(&self) -> bool {
        !matches!(
            *self.shared.state.lock().unwrap_or_else(PoisonError::into_inner),
            State::Pending { .. }
        )
    }

    /// Waits for the outcome.
    pub async fn settled(&self) -> Result<Arc<T>, TaskFailure> {
        loop {
            let notified = self.shared.settled.notified();
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            notified.await;
        }
    }

    fn outcome(&self) -> Option<Result<Arc<T>, TaskFailure>> {
        match &*self.shared.state.lock().unwrap_or_else(PoisonError::into_inner) {
            State::Pending { .. } => None,
            State::Resolved(value) => Some(Ok(Arc::clone(value))),
            State::Rejected(failure) => Some(Err(failure.clone())),
        }
    }
}

impl<T: Send + Sync + 'static> Resolver<T> {
    pub fn resolve(&self, value: T) -> Result<(), TaskError> {
        let value = Arc::new(value);
        let callbacks = {
            let mut state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            let State::Pending { on_resolve, .. } = &mut *state else {
                return Err(TaskError::AlreadySettled);
            };
            let callbacks = std::mem::take(on_resolve);
            *state = State::Resolved(Arc::clone(&value));
            callbacks
        };
        self.shared.settled.notify_waiters();
        for callback in callbacks {
            callback(&value);
        }
        Ok(())
    }

    pub fn reject(&self, failure: TaskFailure) -> Result<(), TaskError> {
        let callbacks = {
            let mut state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
            let State::Pending { on_reject, .. } = &mut *state else {
                return Err(TaskError::AlreadySettled);
            };
            let callbacks = std::mem::take(on_reject);
            *state = State::Rejected(failure.clone());
            callbacks
        };
        self.shared.settled.notify_waiters();
        for callback in callbacks {
            callback(&failure);
        }
        Ok(())
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// Blocking package work that can run off the session threads.
pub enum Task {
    HashPackage(Arc<ContentPackage>),
    LoadPackage(PathBuf),
    ReadChunk {
        package: Arc<ContentPackage>,
        start: u64,
        length: usize,
    },
}

#[derive(Debug)]
pub enum TaskOutput {
    Hashed {
        content_id: ContentId,
        sha256: [u8; 32],
    },
    Loaded(Box<ContentPackage>),
    Chunk(Vec<u8>),
}

impl Task {
    fn name(&self) -> &'static str {
        match self {
            Self::HashPackage(_) => "hash_package",
            Self::LoadPackage(_) => "load_package",
            Self::ReadChunk { .. } => "read_chunk",
        }
    }

    fn run(self) -> Result<TaskOutput, PackError> {
        match self {
            Self::HashPackage(package) => Ok(TaskOutput::Hashed {
                content_id: package.content_id(),
                sha256: package.sha256()?,
            }),
            Self::LoadPackage(path) => {
                Ok(TaskOutput::Loaded(Box::new(ContentPackageLoader::load(path)?)))
            }
            Self::ReadChunk {
                package,
                start,
                length,
            } => Ok(TaskOutput::Chunk(package.read_chunk(start, length)?)),
        }
    }
}

/// Runs [`Task`]s on a runtime's blocking pool.
#[derive(Clone)]
pub struct TaskPool {
    handle: Handle,
}

impl TaskPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on.
    pub fn current() -> Result<Self, TaskError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| TaskError::NoRuntime)
    }

    pub fn submit(&self, task: Task) -> Promise<TaskOutput> {
        let (resolver, promise) = promise();
        let name = task.name();
        let work = self.handle.spawn_blocking(move || task.run());

        self.handle.spawn(async move {
            let settled = match work.await {
                Ok(Ok(output)) => {
                    debug!(task = name, "task finished");
                    resolver.resolve(output)
                }
                Ok(Err(e)) => {
                    warn!(task = name, error = %e, "task failed");
                    resolver.reject(TaskFailure::new(e.to_string()))
                }
                Err(e) => {
                    warn!(task = name, error = %e, "task aborted");
                    resolver.reject(TaskFailure::new(format!("task aborted: {e}")))
                }
            };
            if let Err(e) = settled {
                warn!(task = name, error = %e, "task outcome dropped");
            }
        });
        promise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn callbacks_queued_before_resolution_run_once() {
        let (resolver, promise) = promise::<u32>();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        promise.then(move |v| {
            s.fetch_add(*v as usize, Ordering::SeqCst);
        });
        promise.catch(|_| panic!("rejected"));
        assert!(!promise.is_settled());

        resolver.resolve(7).unwrap();
        assert!(promise.is_settled());
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn late_callbacks_run_immediately_in_matching_state() {
        let (resolver, promise) = promise::<u32>();
        resolver.reject(TaskFailure::new("boom")).unwrap();

        let caught = Arc::new(Mutex::new(None));
        let c = Arc::clone(&caught);
        promise
            .then(|_| panic!("resolved"))
            .catch(move |f| *c.lock().unwrap() = Some(f.message.clone()));
        assert_eq!(caught.lock().unwrap().as_deref(), Some("boom"));
    }

    #[test]
    fn settling_twice_is_an_error() {
        let (resolver, _promise) = promise::<u32>();
        resolver.resolve(1).unwrap();
        assert_eq!(resolver.resolve(2), Err(TaskError::AlreadySettled));
        assert_eq!(
            resolver.reject(TaskFailure::new("late")),
            Err(TaskError::AlreadySettled)
        );
    }

    #[test]
    fn settled_returns_outcome() {
        let (resolver, promise) = promise::<&'static str>();
        resolver.resolve("done").unwrap();
        let value = tokio_test::block_on(promise.settled()).unwrap();
        assert_eq!(*value, "done");
    }

    #[test]
    fn current_without_runtime_fails() {
        assert!(matches!(TaskPool::current(), Err(TaskError::NoRuntime)));
    }
}

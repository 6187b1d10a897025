//! The pool manager: owns the worker set and the pending-task queue, and
//! runs the two background loops that keep dispatch, growth, and shrink
//! converging on the configured bounds.
//!
//! Grounded on the worker pool's `WorkerPool::new`/`shutdown` shape (spawn
//! eagerly, join with a bound on shutdown) and on the original dynamic
//! thread pool's `pushNewWorker`/`popWorker`/`submit` trio, reworked around
//! two condition variables instead of one so growth/shrink decisions don't
//! contend with plain dispatch.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::PoolConfig;

use super::error::PoolError;
use super::task::{make_task, JoinHandle, Thunk};
use super::worker::Worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Stopped,
}

struct ManagerState {
    idle: VecDeque<Worker>,
    busy: HashMap<u64, Worker>,
    pending: VecDeque<Thunk>,
    active_worker_count: usize,
    lower: usize,
    upper: Option<usize>,
    phase: Phase,
}

impl ManagerState {
    fn under_upper(&self) -> bool {
        match self.upper {
            None => true,
            Some(upper) => self.active_worker_count < upper,
        }
    }

    fn exceeds_upper(&self) -> bool {
        matches!(self.upper, Some(upper) if self.active_worker_count > upper)
    }
}

struct PoolInner {
    state: Mutex<ManagerState>,
    c_tasks: Condvar,
    c_workers: Condvar,
    next_id: AtomicU64,
}

/// A dynamically-sized pool of worker threads, dispatching submitted work to
/// idle workers and growing or shrinking the worker set to stay within
/// `[lower, upper]`.
///
/// Two background threads drive the pool: a tasks-loop that dispatches work
/// and grows the pool when none is idle, and a workers-loop that shrinks the
/// pool when it exceeds `upper` and drains every worker on [`Pool::stop`].
/// Both share one mutex and wake each other through a pair of condition
/// variables whenever a worker becomes idle, a task is submitted, or a bound
/// changes.
pub struct Pool {
    inner: Arc<PoolInner>,
    tasks_thread: Mutex<Option<thread::JoinHandle<()>>>,
    workers_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Pool {
    /// Construct a pool per `config`, spawning `config.initial_size` workers
    /// and the two background loops before returning.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BoundViolation`] if `config`'s bounds are
    /// inverted.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let inner = Arc::new(PoolInner {
            state: Mutex::new(ManagerState {
                idle: VecDeque::new(),
                busy: HashMap::new(),
                pending: VecDeque::new(),
                active_worker_count: 0,
                lower: config.lower_limit,
                upper: config.upper_limit,
                phase: Phase::Running,
            }),
            c_tasks: Condvar::new(),
            c_workers: Condvar::new(),
            next_id: AtomicU64::new(0),
        });

        {
            let mut state = inner.state.lock();
            for _ in 0..config.initial_size {
                create_free_worker(&mut state, &inner);
            }
            // initial_size may still leave active_worker_count under
            // lower_limit; top it up the same way the bound setters do.
            resize(&mut state, &inner);
        }

        let tasks_inner = Arc::clone(&inner);
        let tasks_thread = thread::Builder::new()
            .name("dynapool-tasks-loop".into())
            .spawn(move || tasks_loop(&tasks_inner))
            .expect("failed to spawn tasks-loop thread");

        let workers_inner = Arc::clone(&inner);
        let workers_thread = thread::Builder::new()
            .name("dynapool-workers-loop".into())
            .spawn(move || workers_loop(&workers_inner))
            .expect("failed to spawn workers-loop thread");

        info!(initial_size = config.initial_size, "pool started");

        Ok(Self {
            inner,
            tasks_thread: Mutex::new(Some(tasks_thread)),
            workers_thread: Mutex::new(Some(workers_thread)),
        })
    }

    /// Submit a closure for execution on a worker thread, returning a
    /// [`JoinHandle`] to its eventual result.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolStopped`] if the pool is no longer running;
    /// the closure is dropped without running.
    pub fn submit<F, T>(&self, f: F) -> Result<JoinHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (thunk, handle) = make_task(f);
        {
            let mut state = self.inner.state.lock();
            if state.phase != Phase::Running {
                return Err(PoolError::PoolStopped);
            }
            state.pending.push_back(thunk);
        }
        self.inner.c_tasks.notify_one();
        self.inner.c_workers.notify_one();
        Ok(handle)
    }

    /// Transition to `Stopped`: no further `submit` calls succeed, any
    /// tasks still waiting in the pending queue are dropped (aborting their
    /// handles), and both background loops are signaled. Idempotent.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.phase == Phase::Stopped {
                return;
            }
            state.phase = Phase::Stopped;
            state.pending.clear();
        }
        info!("pool stopping");
        self.inner.c_tasks.notify_all();
        self.inner.c_workers.notify_all();
    }

    /// Block until both background loops have exited. Idempotent; safe to
    /// call concurrently from multiple threads.
    ///
    /// Calling this before [`Pool::stop`] blocks until the pool is stopped
    /// by some other means, since the tasks-loop only exits once the phase
    /// is no longer `Running`.
    pub fn join(&self) {
        if let Some(handle) = self.tasks_thread.lock().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.workers_thread.lock().take() {
            let _ = handle.join();
        }
    }

    /// Set the upper bound. Fails if it would invert `lower <= upper`.
    /// Destroys idle workers over the new bound (blocking briefly to join
    /// them) and signals the workers-loop.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BoundViolation`] if `n < lower_limit`.
    pub fn set_upper_limit(&self, n: usize) -> Result<(), PoolError> {
        let mut state = self.inner.state.lock();
        if n < state.lower {
            return Err(PoolError::BoundViolation {
                lower: state.lower,
                upper: n,
            });
        }
        state.upper = Some(n);
        resize(&mut state, &self.inner);
        drop(state);
        self.inner.c_workers.notify_all();
        Ok(())
    }

    /// Remove the upper bound (pool may grow without limit).
    pub fn unset_upper_limit(&self) {
        self.inner.state.lock().upper = None;
    }

    /// Set the lower bound. Fails if it would invert `lower <= upper`.
    /// Creates workers up to the new bound.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BoundViolation`] if `n > upper_limit`.
    pub fn set_lower_limit(&self, n: usize) -> Result<(), PoolError> {
        let mut state = self.inner.state.lock();
        if let Some(upper) = state.upper {
            if n > upper {
                return Err(PoolError::BoundViolation { lower: n, upper });
            }
        }
        state.lower = n;
        resize(&mut state, &self.inner);
        drop(state);
        self.inner.c_tasks.notify_all();
        self.inner.c_workers.notify_all();
        Ok(())
    }

    /// Reset the lower bound to zero.
    pub fn unset_lower_limit(&self) {
        self.inner.state.lock().lower = 0;
    }

    /// Snapshot of the current active worker count (idle + busy).
    #[must_use]
    pub fn workers_count(&self) -> usize {
        self.inner.state.lock().active_worker_count
    }

    /// Snapshot of the number of workers currently idle.
    #[must_use]
    pub fn free_workers_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Snapshot of the number of tasks currently waiting for a worker.
    #[must_use]
    pub fn tasks_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        let already_stopped = self.inner.state.lock().phase == Phase::Stopped;
        if !already_stopped {
            self.stop();
        }
        self.join();
    }
}

/// Spawn a new worker, wire its after-completion callback back into `inner`,
/// and place it at the front of the idle list. Must be called under `M`.
fn create_free_worker(state: &mut ManagerState, inner: &Arc<PoolInner>) {
    let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
    let callback_inner = Arc::clone(inner);
    let worker = Worker::spawn(id, move |worker_id| on_worker_idle(&callback_inner, worker_id));
    state.idle.push_front(worker);
    state.active_worker_count += 1;
}

/// Called on a worker's own thread once its thunk completes normally: move
/// it from `busy` back onto the tail of `idle` and wake both loops.
fn on_worker_idle(inner: &Arc<PoolInner>, id: u64) {
    {
        let mut state = inner.state.lock();
        if let Some(worker) = state.busy.remove(&id) {
            state.idle.push_back(worker);
        }
    }
    inner.c_tasks.notify_all();
    inner.c_workers.notify_all();
}

/// Destroy idle workers above `upper`, then create workers up to `lower`.
/// Called under `M` after a bound change. Joining an idle worker never
/// deadlocks here: an idle worker only ever touches its own mailbox lock,
/// never `M`.
fn resize(state: &mut ManagerState, inner: &Arc<PoolInner>) {
    while state.exceeds_upper() {
        let Some(mut worker) = state.idle.pop_front() else {
            break;
        };
        state.active_worker_count -= 1;
        worker.stop();
        worker.join();
    }
    while state.active_worker_count < state.lower {
        create_free_worker(state, inner);
    }
}

/// Pop the front idle worker and front pending task together, under `M`.
fn try_combine(state: &mut ManagerState) -> Option<(Worker, Thunk)> {
    if state.idle.is_empty() || state.pending.is_empty() {
        return None;
    }
    let worker = state.idle.pop_front()?;
    let task = state.pending.pop_front()?;
    Some((worker, task))
}

/// Records `worker` as busy before handing it the task, so a fast-completing
/// task can never call back into `on_worker_idle` and find the worker
/// untracked in both `idle` and `busy`.
fn dispatch(inner: &Arc<PoolInner>, worker: Worker, task: Thunk) {
    let id = worker.id();
    let mut state = inner.state.lock();
    state.busy.insert(id, worker);
    let worker = state.busy.get(&id).expect("just inserted");
    worker.assign(task);
}

/// Dispatches pending tasks to idle workers, growing the pool when work is
/// waiting and none is idle but the upper bound allows it. Exits once the
/// pool is no longer `Running`; draining remaining state is the
/// workers-loop's job.
fn tasks_loop(inner: &Arc<PoolInner>) {
    loop {
        let action = {
            let mut state = inner.state.lock();
            loop {
                if state.phase == Phase::Stopped {
                    return;
                }
                if let Some(pair) = try_combine(&mut state) {
                    break pair;
                }
                if !state.pending.is_empty() && state.idle.is_empty() && state.under_upper() {
                    create_free_worker(&mut state, inner);
                    continue;
                }
                inner.c_tasks.wait(&mut state);
            }
        };
        debug!(worker_id = action.0.id(), "tasks-loop dispatching");
        dispatch(inner, action.0, action.1);
    }
}

/// Shrinks the pool when it exceeds `upper`, and also dispatches when a task
/// is pending and a worker is idle (the tasks-loop may be busy growing or
/// blocked elsewhere). On transition to `Stopped`, drains every worker.
fn workers_loop(inner: &Arc<PoolInner>) {
    enum Action {
        Destroy(Worker),
        Dispatch(Worker, Thunk),
    }

    loop {
        let action = {
            let mut state = inner.state.lock();
            let mut stopped = false;
            let action = loop {
                if state.phase == Phase::Stopped {
                    stopped = true;
                    break None;
                }
                if state.exceeds_upper() && !state.idle.is_empty() {
                    let worker = state.idle.pop_front().expect("idle non-empty");
                    state.active_worker_count -= 1;
                    break Some(Action::Destroy(worker));
                }
                if let Some((worker, task)) = try_combine(&mut state) {
                    break Some(Action::Dispatch(worker, task));
                }
                inner.c_workers.wait(&mut state);
            };
            if stopped {
                break;
            }
            action
        };
        match action {
            Some(Action::Destroy(mut worker)) => {
                debug!(worker_id = worker.id(), "workers-loop shrinking");
                worker.stop();
                worker.join();
            }
            Some(Action::Dispatch(worker, task)) => {
                debug!(worker_id = worker.id(), "workers-loop dispatching");
                dispatch(inner, worker, task);
            }
            None => unreachable!("loop above only breaks Some(..) or via `stopped`"),
        }
    }

    drain(inner);
}

/// Destroy every worker, including ones still busy, waiting for each to
/// return to idle before tearing it down.
fn drain(inner: &Arc<PoolInner>) {
    loop {
        let worker = {
            let mut state = inner.state.lock();
            loop {
                if let Some(worker) = state.idle.pop_front() {
                    break Some(worker);
                }
                if state.active_worker_count == 0 {
                    break None;
                }
                inner.c_workers.wait(&mut state);
            }
        };
        let Some(mut worker) = worker else {
            break;
        };
        let id = worker.id();
        worker.stop();
        worker.join();
        let mut state: MutexGuard<'_, ManagerState> = inner.state.lock();
        state.active_worker_count -= 1;
        debug!(worker_id = id, "drained worker during shutdown");
    }
    info!("pool drained, both loops exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn wait_until(mut pred: impl FnMut() -> bool, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if pred() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        pred()
    }

    #[test]
    fn submit_runs_and_joins() {
        let pool = Pool::new(PoolConfig::new().with_initial_size(2)).unwrap();
        let handle = pool.submit(|| 2 + 2).unwrap();
        assert_eq!(handle.join().unwrap(), 4);
        pool.stop();
        pool.join();
    }

    #[test]
    fn grows_from_zero_when_task_submitted() {
        let pool = Pool::new(PoolConfig::new()).unwrap();
        assert_eq!(pool.workers_count(), 0);
        let handle = pool.submit(|| 1).unwrap();
        assert_eq!(handle.join().unwrap(), 1);
        assert!(wait_until(|| pool.workers_count() >= 1, Duration::from_secs(1)));
        pool.stop();
        pool.join();
    }

    #[test]
    fn many_tasks_complete_with_bounded_workers() {
        let pool = Pool::new(PoolConfig::new().with_upper_limit(4)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert!(pool.workers_count() <= 4);
        pool.stop();
        pool.join();
    }

    #[test]
    fn submit_after_stop_fails() {
        let pool = Pool::new(PoolConfig::new().with_initial_size(1)).unwrap();
        pool.stop();
        pool.join();
        assert_eq!(pool.submit(|| ()).err(), Some(PoolError::PoolStopped));
    }

    #[test]
    fn stop_aborts_pending_tasks() {
        let pool = Pool::new(PoolConfig::new()).unwrap();
        // Upper-bounded to zero: the task can never be dispatched.
        pool.set_upper_limit(0).unwrap();
        let handle = pool.submit(|| 1).unwrap();
        pool.stop();
        assert_eq!(handle.join(), Err(PoolError::TaskAborted));
        pool.join();
    }

    #[test]
    fn set_upper_limit_shrinks_idle_workers() {
        let pool = Pool::new(PoolConfig::new().with_initial_size(5)).unwrap();
        assert!(wait_until(|| pool.free_workers_count() == 5, Duration::from_secs(1)));
        pool.set_upper_limit(2).unwrap();
        assert!(wait_until(|| pool.workers_count() == 2, Duration::from_secs(1)));
        pool.stop();
        pool.join();
    }

    #[test]
    fn new_honors_lower_limit_without_a_separate_setter_call() {
        let pool = Pool::new(PoolConfig::new().with_lower_limit(3)).unwrap();
        assert_eq!(pool.workers_count(), 3);
        pool.stop();
        pool.join();
    }

    #[test]
    fn set_lower_limit_grows_workers() {
        let pool = Pool::new(PoolConfig::new()).unwrap();
        assert_eq!(pool.workers_count(), 0);
        pool.set_lower_limit(3).unwrap();
        assert_eq!(pool.workers_count(), 3);
        pool.stop();
        pool.join();
    }

    #[test]
    fn inverted_bound_setters_fail() {
        let pool = Pool::new(PoolConfig::new().with_upper_limit(2)).unwrap();
        assert_eq!(
            pool.set_lower_limit(5).err(),
            Some(PoolError::BoundViolation { lower: 5, upper: 2 })
        );
        pool.stop();
        pool.join();
    }

    #[test]
    fn drop_without_explicit_stop_still_drains() {
        let pool = Pool::new(PoolConfig::new().with_initial_size(3)).unwrap();
        let handle = pool.submit(|| 7).unwrap();
        assert_eq!(handle.join().unwrap(), 7);
        drop(pool);
    }

    #[test]
    fn panicking_task_does_not_wedge_the_pool() {
        let pool = Pool::new(PoolConfig::new().with_initial_size(1)).unwrap();
        let panicked = pool.submit(|| -> i32 { panic!("boom") }).unwrap();
        assert_eq!(panicked.join(), Err(PoolError::TaskPanicked));
        // The panic was caught at the submission boundary, so the worker
        // that ran it returns to idle and keeps serving new tasks.
        let next = pool.submit(|| 9).unwrap();
        assert_eq!(next.join().unwrap(), 9);
        pool.stop();
        pool.join();
    }
}

//! The terminal worker.
//!
//! A [`Terminal`] owns one backend connection and one worker thread. Callers
//! enqueue tasks on a bounded queue and the worker runs them strictly in
//! order. Failures reported by the backend are captured into the terminal's
//! last result instead of being raised; callers observe them through
//! [`Terminal::get_last_ret_code`].

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use super::backend::{Backend, BackendError};
use super::{RuntimeError, Value};

/// Maximum number of undispatched tasks per terminal. Producers block
/// beyond it.
pub const QUEUE_CAPACITY: usize = 20;

/// Last-result message for tasks queued after the worker has exited.
pub const SHUT_DOWN: &str = "terminal shut down";

/// Last-result message left by a worker that panicked.
pub const WORKER_PANICKED: &str = "terminal worker panicked";

#[derive(Debug)]
enum Task {
    Shutdown,
    Execute(String),
    FetchAndStore(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    NotStarted,
    WaitingForInput,
    Executing,
    ShutDown,
}

/// Outcome class of the last executed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    Success = 0,
    Warning = 1,
    Error = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub code: ReturnCode,
    pub message: String,
}

impl ExecutionResult {
    pub fn success() -> Self {
        Self {
            code: ReturnCode::Success,
            message: String::new(),
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            code: ReturnCode::Error,
            message: message.to_string(),
        }
    }
}

impl From<&BackendError> for ExecutionResult {
    fn from(err: &BackendError) -> Self {
        let code = match err {
            BackendError::Warning(_) => ReturnCode::Warning,
            BackendError::Error(_) => ReturnCode::Error,
        };
        Self {
            code,
            message: err.message().to_string(),
        }
    }
}

#[derive(Debug)]
enum StoredResult {
    NotReady,
    Ready(Value),
}

#[derive(Debug, Default)]
struct Pending {
    count: usize,
    /// Set once the worker has exited; nothing will drain the queue anymore.
    closed: bool,
}

#[derive(Debug)]
struct Shared {
    status: Mutex<TerminalStatus>,
    last_result: Mutex<ExecutionResult>,
    results: Mutex<HashMap<String, StoredResult>>,
    pending: Mutex<Pending>,
    drained: Condvar,
}

impl Shared {
    fn set_status(&self, status: TerminalStatus) {
        *self.status.lock() = status;
    }

    fn task_done(&self) {
        let mut pending = self.pending.lock();
        pending.count = pending.count.saturating_sub(1);
        if pending.count == 0 {
            self.drained.notify_all();
        }
    }
}

/// Handle to a terminal worker. Clones share the same worker.
#[derive(Debug, Clone)]
pub struct Terminal {
    name: Arc<str>,
    tasks: Sender<Task>,
    shared: Arc<Shared>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Terminal {
    /// Starts a worker thread that owns `backend`.
    pub fn start(name: &str, backend: Box<dyn Backend>) -> Result<Self, RuntimeError> {
        let (tasks, queue) = bounded(QUEUE_CAPACITY);
        let shared = Arc::new(Shared {
            status: Mutex::new(TerminalStatus::NotStarted),
            last_result: Mutex::new(ExecutionResult::success()),
            results: Mutex::new(HashMap::new()),
            pending: Mutex::new(Pending::default()),
            drained: Condvar::new(),
        });
        let name: Arc<str> = Arc::from(name);

        let worker = Worker {
            name: Arc::clone(&name),
            backend,
            shared: Arc::clone(&shared),
        };
        let handle = thread::Builder::new()
            .name(format!("terminal-{}", name))
            .spawn(move || worker.run(queue))
            .map_err(|err| RuntimeError::Spawn {
                terminal: name.to_string(),
                message: err.to_string(),
            })?;

        tracing::debug!(terminal = %name, "terminal started");
        Ok(Self {
            name,
            tasks,
            shared,
            worker: Arc::new(Mutex::new(Some(handle))),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TerminalStatus {
        *self.shared.status.lock()
    }

    /// Queues a query. Returns as soon as the task is queued.
    pub fn execute(&self, query: &str) {
        self.enqueue(Task::Execute(query.to_string()));
    }

    /// Queues a fetch of the last query's rows into the result store under
    /// `name`. Until the fetch has run the entry reads as not ready.
    pub fn store_result(&self, name: &str) {
        self.shared
            .results
            .lock()
            .insert(name.to_string(), StoredResult::NotReady);
        self.enqueue(Task::FetchAndStore(name.to_string()));
    }

    /// Blocks until every task queued so far has completed.
    pub fn wait_finish(&self) {
        let mut pending = self.shared.pending.lock();
        while pending.count > 0 {
            self.shared.drained.wait(&mut pending);
        }
    }

    /// Reads a stored result set.
    pub fn get_result_set(&self, name: &str) -> Result<Value, RuntimeError> {
        let results = self.shared.results.lock();
        match results.get(name) {
            Some(StoredResult::Ready(rows)) => {
                tracing::debug!(terminal = %self.name, result = name, rows = %rows, "result set");
                Ok(rows.clone())
            }
            Some(StoredResult::NotReady) => Err(RuntimeError::ResultNotReady {
                terminal: self.name.to_string(),
                name: name.to_string(),
            }),
            None => Err(RuntimeError::MissingResult {
                terminal: self.name.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// The last return code: 0 success, 1 warning, 2 error.
    pub fn get_last_ret_code(&self) -> Value {
        Value::Int(self.shared.last_result.lock().code as i64)
    }

    pub fn last_result(&self) -> ExecutionResult {
        self.shared.last_result.lock().clone()
    }

    /// Queues the shutdown task. Tasks queued after it are never run.
    pub fn close(&self) {
        self.enqueue(Task::Shutdown);
    }

    /// Waits for the worker thread to exit. Only meaningful after
    /// [`Terminal::close`]; later calls return immediately.
    pub fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!(terminal = %self.name, "terminal worker panicked");
            }
        }
    }

    fn enqueue(&self, task: Task) {
        let closed = {
            let mut pending = self.shared.pending.lock();
            if !pending.closed {
                pending.count += 1;
            }
            pending.closed
        };
        if closed {
            self.reject(task);
            return;
        }
        if let Err(err) = self.tasks.send(task) {
            self.shared.task_done();
            self.reject(err.0);
        }
    }

    /// A task for a worker that is gone. Work that will never run reads as
    /// an error in the last result.
    fn reject(&self, task: Task) {
        if let Task::Shutdown = task {
            tracing::debug!(terminal = %self.name, "terminal already shut down");
            return;
        }
        tracing::error!(terminal = %self.name, ?task, "terminal is shut down, task dropped");
        *self.shared.last_result.lock() = ExecutionResult::failure(SHUT_DOWN);
    }
}

struct Worker {
    name: Arc<str>,
    backend: Box<dyn Backend>,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(mut self, queue: Receiver<Task>) {
        let _exit = WorkerExit(Arc::clone(&self.shared));
        loop {
            self.shared.set_status(TerminalStatus::WaitingForInput);
            // Every sender gone means nobody can close us explicitly.
            let task = queue.recv().unwrap_or(Task::Shutdown);
            match task {
                Task::Shutdown => {
                    self.shared.set_status(TerminalStatus::ShutDown);
                    if let Err(err) = self.backend.close() {
                        tracing::warn!(terminal = %self.name, %err, "closing connection");
                    }
                    tracing::debug!(terminal = %self.name, "terminal shut down");
                    break;
                }
                Task::Execute(query) => {
                    self.shared.set_status(TerminalStatus::Executing);
                    self.execute(&query);
                }
                Task::FetchAndStore(name) => {
                    self.shared.set_status(TerminalStatus::Executing);
                    self.fetch_and_store(name);
                }
            }
            self.shared.task_done();
        }
    }

    fn execute(&mut self, query: &str) {
        *self.shared.last_result.lock() = ExecutionResult::success();
        tracing::info!(terminal = %self.name, query, "execute query");
        let started = Instant::now();
        match self.backend.execute(query) {
            Ok(()) => tracing::info!(
                terminal = %self.name,
                "success after {:.3}s",
                started.elapsed().as_secs_f64()
            ),
            Err(err) => self.capture(query, &err),
        }
    }

    fn fetch_and_store(&mut self, name: String) {
        tracing::info!(terminal = %self.name, result = %name, "fetch result");
        let started = Instant::now();
        match self.backend.fetch_all() {
            Ok(rows) => {
                let rows = Value::List(rows.into_iter().map(Value::List).collect());
                self.shared
                    .results
                    .lock()
                    .insert(name, StoredResult::Ready(rows));
                tracing::info!(
                    terminal = %self.name,
                    "success after {:.3}s",
                    started.elapsed().as_secs_f64()
                );
            }
            Err(err) => self.capture(&name, &err),
        }
    }

    fn capture(&self, what: &str, err: &BackendError) {
        tracing::warn!(terminal = %self.name, task = what, %err, "backend reported a problem");
        *self.shared.last_result.lock() = ExecutionResult::from(err);
    }
}

/// Runs when the worker leaves its loop, including by panic, so nothing
/// stays blocked in `wait_finish` on a queue no one drains.
struct WorkerExit(Arc<Shared>);

impl Drop for WorkerExit {
    fn drop(&mut self) {
        if thread::panicking() {
            *self.0.last_result.lock() = ExecutionResult::failure(WORKER_PANICKED);
        }
        self.0.set_status(TerminalStatus::ShutDown);
        let mut pending = self.0.pending.lock();
        pending.closed = true;
        pending.count = 0;
        self.0.drained.notify_all();
    }
}

//! A scripted in-memory backend for dry runs and tests.
//!
//! Queries get canned responses; everything a backend is asked to do is
//! recorded as an [`Event`] tagged with the connection it happened on.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::backend::{Backend, BackendError, Connector, Row};

/// How the backend answers one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Succeeds without rows.
    Done,
    /// Succeeds and makes `rows` available to the next fetch.
    Rows(Vec<Row>),
    Warning(String),
    Error(String),
    /// Panics inside the worker thread.
    Panic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect { config: String, auto_commit: bool },
    Execute(String),
    Fetch,
    Close,
}

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, Response>,
    delays: HashMap<String, Duration>,
    refusal: Option<String>,
    connections: usize,
    events: Vec<(usize, Event)>,
}

/// Connector handing out [`Response`]-scripted backends. Clones share the
/// script and the event log.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    script: Arc<Mutex<Script>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `query` with `response`. Unscripted queries answer `Done`.
    pub fn respond(&self, query: &str, response: Response) -> &Self {
        self.script
            .lock()
            .responses
            .insert(query.to_string(), response);
        self
    }

    /// Makes `query` take at least `delay` before it answers.
    pub fn delay(&self, query: &str, delay: Duration) -> &Self {
        self.script.lock().delays.insert(query.to_string(), delay);
        self
    }

    /// Every later connection attempt fails with `message`.
    pub fn refuse_connections(&self, message: &str) -> &Self {
        self.script.lock().refusal = Some(message.to_string());
        self
    }

    /// Everything recorded so far, with the id of the connection (starting
    /// at 0, in connect order) it happened on.
    pub fn events(&self) -> Vec<(usize, Event)> {
        self.script.lock().events.clone()
    }

    /// Queries executed on any connection, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|(_, event)| match event {
                Event::Execute(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn closed_connections(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter(|(_, event)| *event == Event::Close)
            .map(|(id, _)| id)
            .collect()
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, config: &str, auto_commit: bool) -> Result<Box<dyn Backend>, BackendError> {
        let mut script = self.script.lock();
        if let Some(message) = &script.refusal {
            return Err(BackendError::Error(message.clone()));
        }
        let id = script.connections;
        script.connections += 1;
        script.events.push((
            id,
            Event::Connect {
                config: config.to_string(),
                auto_commit,
            },
        ));
        Ok(Box::new(MemoryBackend {
            id,
            script: Arc::clone(&self.script),
            pending_rows: Vec::new(),
        }))
    }
}

struct MemoryBackend {
    id: usize,
    script: Arc<Mutex<Script>>,
    pending_rows: Vec<Row>,
}

impl MemoryBackend {
    fn record(&self, event: Event) {
        self.script.lock().events.push((self.id, event));
    }
}

impl Backend for MemoryBackend {
    fn execute(&mut self, query: &str) -> Result<(), BackendError> {
        let (response, delay) = {
            let script = self.script.lock();
            (
                script.responses.get(query).cloned(),
                script.delays.get(query).copied(),
            )
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.record(Event::Execute(query.to_string()));
        self.pending_rows.clear();

        match response.unwrap_or(Response::Done) {
            Response::Done => Ok(()),
            Response::Rows(rows) => {
                self.pending_rows = rows;
                Ok(())
            }
            Response::Warning(message) => Err(BackendError::Warning(message)),
            Response::Error(message) => Err(BackendError::Error(message)),
            Response::Panic(message) => panic!("{}", message),
        }
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>, BackendError> {
        self.record(Event::Fetch);
        Ok(std::mem::take(&mut self.pending_rows))
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.record(Event::Close);
        Ok(())
    }
}

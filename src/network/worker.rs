//! Worker Execution Context
//!
//! One OS thread running a single-threaded event loop. Every connection handed
//! to a worker is served as a local task on that loop and never leaves it.
//!
//! ## Lifecycle
//! ```text
//! Initializing ──(runtime built)──▶ Ready ──(report sent, start, barrier)──▶ Running
//! ```
//! A worker whose start is withdrawn exits from `Ready`. Running ends only
//! when the dispatch closes the handoff channel.

use std::net::TcpStream;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::LocalSet;

use crate::error::Result;
use crate::protocol::Limits;
use crate::router::Router;

use super::Connection;

/// Worker lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum WorkerState {
    Initializing = 0,
    Ready = 1,
    Running = 2,
}

/// Lifecycle state shared between a worker thread and its handle
#[derive(Clone, Default)]
struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn set(&self, id: usize, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
        tracing::debug!("Worker {} {:?}", id, state);
    }

    fn get(&self) -> WorkerState {
        match self.0.load(Ordering::Acquire) {
            0 => WorkerState::Initializing,
            1 => WorkerState::Ready,
            _ => WorkerState::Running,
        }
    }
}

/// Outcome of a worker's initialization, sent to the dispatch before the barrier
pub(crate) type StartupReport = std::result::Result<usize, String>;

/// Everything a worker needs to serve connections
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub router: Arc<Router>,
    pub limits: Limits,
    pub idle_timeout: Option<Duration>,
}

/// Dispatch-side handle on a running worker
pub(crate) struct WorkerHandle {
    id: usize,
    state: StateCell,
    handoff: UnboundedSender<TcpStream>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn worker `id`
    ///
    /// The worker sends exactly one report on `reports`, then takes one
    /// barrier from `start` and waits on it, whether or not its initialization
    /// succeeded. If every `start` sender is dropped first, the worker exits.
    pub fn spawn(
        id: usize,
        context: WorkerContext,
        start: Receiver<Arc<Barrier>>,
        reports: Sender<StartupReport>,
    ) -> Result<Self> {
        let (handoff, inbox) = mpsc::unbounded_channel();
        let state = StateCell::default();

        let thread_state = state.clone();
        let thread = thread::Builder::new()
            .name(format!("pear-worker-{}", id))
            .spawn(move || run(id, context, thread_state, start, reports, inbox))?;

        Ok(Self {
            id,
            state,
            handoff,
            thread,
        })
    }

    /// Hand a freshly accepted connection to this worker
    ///
    /// Gives the stream back if the worker is gone.
    pub fn assign(&self, stream: TcpStream) -> std::result::Result<(), TcpStream> {
        self.handoff.send(stream).map_err(|e| e.0)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Current lifecycle state
    #[cfg(test)]
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Close the handoff channel and wait for the thread to exit
    pub fn join(self) {
        let WorkerHandle {
            id,
            state,
            handoff,
            thread,
        } = self;
        tracing::debug!("Joining worker {} ({:?})", id, state.get());
        drop(handoff);
        if thread.join().is_err() {
            tracing::error!("Worker {} panicked", id);
        }
    }
}

fn run(
    id: usize,
    context: WorkerContext,
    state: StateCell,
    start: Receiver<Arc<Barrier>>,
    reports: Sender<StartupReport>,
    inbox: UnboundedReceiver<TcpStream>,
) {
    state.set(id, WorkerState::Initializing);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();

    let report = match &runtime {
        Ok(_) => {
            state.set(id, WorkerState::Ready);
            Ok(id)
        }
        Err(e) => Err(format!("worker {}: failed to build event loop: {}", id, e)),
    };
    let _ = reports.send(report);
    drop(reports);

    let Ok(barrier) = start.recv() else {
        tracing::debug!("Worker {} start withdrawn, exiting", id);
        return;
    };
    barrier.wait();

    let Ok(runtime) = runtime else {
        return;
    };

    state.set(id, WorkerState::Running);
    event_loop(&runtime, context, inbox);
    tracing::debug!("Worker {} stopped", id);
}

fn event_loop(runtime: &Runtime, context: WorkerContext, mut inbox: UnboundedReceiver<TcpStream>) {
    let local = LocalSet::new();

    local.block_on(runtime, async move {
        while let Some(stream) = inbox.recv().await {
            match Connection::new(
                stream,
                Arc::clone(&context.router),
                context.limits,
                context.idle_timeout,
            ) {
                Ok(connection) => {
                    tokio::task::spawn_local(connection.serve());
                }
                Err(e) => tracing::warn!("Failed to set up connection: {}", e),
            }
        }
    });
}

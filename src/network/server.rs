//! TCP Server
//!
//! Owns the listening socket, accepts connections, and hands each one to a
//! worker.
//!
//! ## Startup Protocol
//! 1. Bind the listener (failure → startup error, nothing spawned)
//! 2. Spawn N workers; each builds its event loop and reports the outcome
//! 3. Once all N are spawned, hand every worker the start barrier (size N + 1);
//!    if a spawn fails, withdraw the start instead and every worker exits
//! 4. Dispatch and all workers meet at the barrier
//! 5. Dispatch checks the reports; any failure aborts startup
//! 6. `run` accepts and assigns connections round-robin

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use crate::config::Config;
use crate::error::{PearError, Result};
use crate::protocol::Limits;
use crate::router::Router;
use crate::storage::Store;

use super::worker::{StartupReport, WorkerContext, WorkerHandle};

/// TCP server for Pear
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    workers: Vec<WorkerHandle>,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running server from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl Server {
    /// Bind the listener and bring every worker to readiness
    ///
    /// Returns once all workers have passed the startup barrier.
    pub fn bind(config: &Config, store: Arc<Store>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            PearError::Startup(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        let context = WorkerContext {
            router: Arc::new(Router::new(store, config.storage_failure_policy)),
            limits: Limits::from(config),
            idle_timeout: config.idle_timeout(),
        };

        let (start_tx, start_rx) = crossbeam::channel::bounded::<Arc<Barrier>>(config.workers);
        let (report_tx, report_rx) = crossbeam::channel::bounded::<StartupReport>(config.workers);

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            match WorkerHandle::spawn(id, context.clone(), start_rx.clone(), report_tx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    tracing::error!("Failed to spawn worker {}: {}", id, e);
                    // Dropping the start sender releases the workers already spawned
                    drop(start_tx);
                    for worker in workers {
                        worker.join();
                    }
                    return Err(PearError::Startup(format!("cannot spawn worker {}: {}", id, e)));
                }
            }
        }
        drop(start_rx);
        drop(report_tx);

        let barrier = Arc::new(Barrier::new(config.workers + 1));
        for _ in 0..config.workers {
            if start_tx.send(Arc::clone(&barrier)).is_err() {
                return Err(PearError::Startup("workers exited before start".to_string()));
            }
        }
        barrier.wait();

        let failures: Vec<String> = report_rx.iter().filter_map(|r| r.err()).collect();
        if !failures.is_empty() {
            for worker in workers {
                worker.join();
            }
            return Err(PearError::Startup(failures.join("; ")));
        }

        tracing::info!(
            "Listening on {} with {} workers",
            local_addr,
            config.workers
        );

        Ok(Self {
            listener,
            local_addr,
            workers,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that can stop `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        let mut wake_addr = self.local_addr;
        if wake_addr.ip().is_unspecified() {
            let loopback = match wake_addr {
                SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
            };
            wake_addr.set_ip(loopback);
        }

        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            wake_addr,
        }
    }

    /// Accept loop (blocking)
    ///
    /// Runs until a [`ShutdownHandle`] fires, then closes every worker's
    /// handoff channel and joins the workers.
    pub fn run(self) -> Result<()> {
        let Server {
            listener,
            workers,
            shutdown,
            ..
        } = self;
        let mut next_worker = 0;

        for stream in listener.incoming() {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            match stream {
                Ok(stream) => assign_round_robin(&workers, &mut next_worker, stream),
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!("Dispatch stopping, joining {} workers", workers.len());
        for worker in workers {
            worker.join();
        }

        Ok(())
    }
}

/// Assign a connection to the next worker in rotation
fn assign_round_robin(workers: &[WorkerHandle], next: &mut usize, stream: TcpStream) {
    let worker = &workers[*next % workers.len()];
    *next = next.wrapping_add(1);

    if worker.assign(stream).is_err() {
        tracing::error!("Worker {} is gone, dropping connection", worker.id());
    }
}

impl ShutdownHandle {
    /// Stop the accept loop
    ///
    /// In-flight connections are dropped when their worker exits.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);

        // Wake the blocking accept
        if let Err(e) = TcpStream::connect(self.wake_addr) {
            tracing::warn!(
                "Failed to wake dispatch at {}, it stops on the next accept: {}",
                self.wake_addr,
                e
            );
        }
    }
}

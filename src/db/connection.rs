use std::{
    path::Path,
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

/// How long a statement waits on a lock held by another process (e.g. an
/// operator tool) before failing with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(1);

/// The database worker thread is gone, so nothing can reach SQLite until the
/// kiosk is restarted. Distinct from a failed statement.
#[derive(Debug, Error)]
#[error("database worker unavailable: {0}")]
pub struct WorkerUnavailable(&'static str);

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

struct Worker {
    jobs: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop after the jobs already sent.
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Database worker panicked before shutdown");
            }
        }
    }
}

/// SQLite handle for the kiosk. The connection is opened and migrated on the
/// caller's thread, then moved to a worker thread that runs every statement in
/// arrival order.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
}

impl Database {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = open_connection(db_path)?;

        let (jobs, queue) = mpsc::channel::<Job>();
        let thread = thread::Builder::new()
            .name("kiosk-db".into())
            .spawn(move || {
                let mut conn = conn;
                for job in queue {
                    job(&mut conn);
                }
                info!("Database worker stopped");
            })
            .context("failed to spawn database worker thread")?;

        info!("Database ready at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                jobs: Some(jobs),
                thread: Some(thread),
            }),
        })
    }

    /// Runs `task` on the worker. Fails with [`WorkerUnavailable`] when the
    /// worker is gone, otherwise with whatever `task` returned.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let jobs = self
            .worker
            .jobs
            .as_ref()
            .ok_or(WorkerUnavailable("worker is shutting down"))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // The caller may have timed out and dropped the receiver.
            let _ = reply_tx.send(task(conn));
        });

        jobs.send(job)
            .map_err(|_| WorkerUnavailable("worker thread has exited"))?;

        reply_rx
            .await
            .map_err(|_| WorkerUnavailable("worker stopped before replying"))?
    }
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create database directory {}", parent.display())
        })?;
    }

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("failed to open SQLite database {}", db_path.display()))?;

    // Sector capacity checks rely on foreign keys; refuse to run without them.
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL journal unavailable, keeping default journal: {err}");
    }
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

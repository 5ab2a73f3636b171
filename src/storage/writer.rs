//! Dedicated writer thread.
//!
//! The SQLite connection and the prepared upsert statement live on one OS
//! thread for the lifetime of the writer. Startup runs, in order:
//! open, table creation, statement preparation, row fetch. The fetched rows
//! are handed back to the caller once everything before them succeeded.
//! Afterwards the thread serves upsert commands from a bounded channel, one
//! at a time, replying on a per-command oneshot.

use futures::future::{self, FutureExt};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;

use super::schema::{apply_pragmas, create_table, load_rows, StoredRow, UPSERT_SQL};
use crate::error::StoreError;
use crate::manager::PendingWrite;
use crate::observability::{Diagnostic, SharedSink};

/// Settings for starting a writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Database file (or `:memory:`)
    pub path: PathBuf,
    /// Capacity of the command channel
    pub channel_size: usize,
    /// SQLite busy timeout in milliseconds
    pub busy_timeout_ms: u64,
}

enum WriteCommand {
    Upsert {
        namespace: String,
        blob: String,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

type Ready = Result<Vec<StoredRow>, StoreError>;

/// Owner of the writer thread.
pub struct Writer {
    handle: WriterHandle,
    thread: JoinHandle<()>,
}

impl Writer {
    /// Spawn the writer thread and wait for it to finish startup.
    ///
    /// Returns the writer together with every row found in the table.
    pub async fn start(config: &WriterConfig, sink: SharedSink) -> Result<(Self, Vec<StoredRow>), StoreError> {
        let (sender, receiver) = mpsc::channel(config.channel_size.max(1));
        let (ready_tx, ready_rx) = oneshot::channel();

        let path = config.path.clone();
        let busy_timeout_ms = config.busy_timeout_ms;
        let thread = thread::Builder::new()
            .name("nsettings-writer".into())
            .spawn(move || run_writer(&path, busy_timeout_ms, &sink, receiver, ready_tx))
            .map_err(StoreError::Spawn)?;

        match ready_rx.await {
            Ok(Ok(rows)) => Ok((
                Self {
                    handle: WriterHandle { sender },
                    thread,
                },
                rows,
            )),
            Ok(Err(err)) => {
                let _ = join(thread).await;
                Err(err)
            }
            // The thread dropped its ready sender without answering.
            Err(_) => {
                let _ = join(thread).await;
                Err(StoreError::WriterPanic)
            }
        }
    }

    /// Get a cloneable handle for submitting writes.
    pub fn handle(&self) -> WriterHandle {
        self.handle.clone()
    }

    /// Drain queued writes, stop the thread, and wait for it to exit.
    pub async fn stop(self) -> Result<(), StoreError> {
        // A closed channel means the thread is already on its way out.
        let _ = self.handle.shutdown().await;
        join(self.thread).await
    }
}

async fn join(thread: JoinHandle<()>) -> Result<(), StoreError> {
    match tokio::task::spawn_blocking(move || thread.join()).await {
        Ok(Ok(())) => Ok(()),
        _ => Err(StoreError::WriterPanic),
    }
}

/// Cloneable handle for submitting commands to the writer thread.
#[derive(Clone)]
pub struct WriterHandle {
    sender: mpsc::Sender<WriteCommand>,
}

impl WriterHandle {
    /// Queue an upsert of `blob` under `namespace`.
    ///
    /// The command is enqueued before this returns whenever the channel has
    /// room; otherwise enqueueing waits until the returned future is polled.
    pub fn submit(&self, namespace: String, blob: String) -> PendingWrite {
        let (reply, response) = oneshot::channel();
        let command = WriteCommand::Upsert {
            namespace,
            blob,
            reply,
        };

        match self.sender.try_send(command) {
            Ok(()) => await_reply(response).boxed(),
            Err(TrySendError::Full(command)) => {
                let sender = self.sender.clone();
                async move {
                    if sender.send(command).await.is_err() {
                        return Err(StoreError::WriterClosed);
                    }
                    await_reply(response).await
                }
                .boxed()
            }
            Err(TrySendError::Closed(_)) => future::err(StoreError::WriterClosed).boxed(),
        }
    }

    /// Ask the writer to stop after finishing the commands queued before it.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(WriteCommand::Shutdown { reply })
            .await
            .map_err(|_| StoreError::WriterClosed)?;
        response.await.map_err(|_| StoreError::WriterClosed)
    }

    /// Whether the writer thread is still accepting commands.
    #[cfg(test)]
    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

async fn await_reply(response: oneshot::Receiver<Result<(), StoreError>>) -> Result<(), StoreError> {
    match response.await {
        Ok(result) => result,
        Err(_) => Err(StoreError::WriterClosed),
    }
}

fn open(path: &Path, busy_timeout_ms: u64) -> Result<Connection, StoreError> {
    let to_open_error = |source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    };
    let conn = Connection::open(path).map_err(to_open_error)?;
    apply_pragmas(&conn, busy_timeout_ms).map_err(to_open_error)?;
    Ok(conn)
}

fn run_writer(
    path: &Path,
    busy_timeout_ms: u64,
    sink: &SharedSink,
    mut receiver: mpsc::Receiver<WriteCommand>,
    ready: oneshot::Sender<Ready>,
) {
    let conn = match open(path, busy_timeout_ms) {
        Ok(conn) => conn,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    sink.emit(Diagnostic::Opened {
        path: path.to_path_buf(),
    });

    if let Err(err) = create_table(&conn) {
        let _ = ready.send(Err(StoreError::Schema(err)));
        return;
    }
    sink.emit(Diagnostic::TableEnsured);

    let mut upsert = match conn.prepare(UPSERT_SQL) {
        Ok(stmt) => stmt,
        Err(err) => {
            let _ = ready.send(Err(StoreError::Prepare(err)));
            return;
        }
    };
    sink.emit(Diagnostic::StatementPrepared);

    let rows = match load_rows(&conn) {
        Ok(rows) => rows,
        Err(err) => {
            let _ = ready.send(Err(StoreError::Load(err)));
            return;
        }
    };
    sink.emit(Diagnostic::RowsLoaded { count: rows.len() });

    if ready.send(Ok(rows)).is_err() {
        // Whoever started us stopped waiting.
        return;
    }

    while let Some(command) = receiver.blocking_recv() {
        match command {
            WriteCommand::Upsert {
                namespace,
                blob,
                reply,
            } => {
                let outcome = upsert.execute(params![namespace, blob]);
                let result = match outcome {
                    Ok(_) => Ok(()),
                    Err(source) => {
                        tracing::warn!(namespace = %namespace, error = %source, "Settings write failed");
                        Err(StoreError::Write { namespace, source })
                    }
                };
                let _ = reply.send(result);
            }
            WriteCommand::Shutdown { reply } => {
                let _ = reply.send(());
                break;
            }
        }
    }

    tracing::debug!(path = %path.display(), "Settings writer stopped");
}

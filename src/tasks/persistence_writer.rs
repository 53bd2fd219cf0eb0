//! Background task that writes snapshots to durable storage

use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{services::SnapshotStore, state::Snapshot};

/// Work queued for the persistence writer
#[derive(Debug)]
pub enum PersistCommand {
    Save(Snapshot),
    Purge,
    /// Acknowledged once every earlier command has been attempted
    Flush(oneshot::Sender<()>),
}

impl PartialEq for PersistCommand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PersistCommand::Save(a), PersistCommand::Save(b)) => a == b,
            (PersistCommand::Purge, PersistCommand::Purge) => true,
            _ => false,
        }
    }
}

/// Fire-and-forget sender used by the engine after every mutation
#[derive(Debug, Clone)]
pub struct PersistenceHandle {
    tx: Option<UnboundedSender<PersistCommand>>,
}

impl PersistenceHandle {
    /// Create a handle together with the receiving end of its queue
    pub fn channel() -> (Self, UnboundedReceiver<PersistCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A handle that drops every request, for purely in-memory engines
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn save(&self, snapshot: Snapshot) {
        self.send(PersistCommand::Save(snapshot));
    }

    pub fn purge(&self) {
        self.send(PersistCommand::Purge);
    }

    /// Wait until the writer has attempted every request sent before this call.
    ///
    /// Returns immediately for a disabled handle or a stopped writer.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(PersistCommand::Flush(ack_tx));
        // A dropped sender means there is nothing left to wait for
        let _ = ack_rx.await;
    }

    fn send(&self, command: PersistCommand) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(command).is_err() {
            warn!("Persistence writer has stopped, dropping request");
        }
    }
}

/// Spawn the writer for `store`.
///
/// The task ends once every handle is dropped and the queue is drained.
pub fn spawn_persistence_writer(store: SnapshotStore) -> (PersistenceHandle, JoinHandle<()>) {
    let (handle, rx) = PersistenceHandle::channel();
    let join = tokio::spawn(persistence_writer_task(store, rx));
    (handle, join)
}

/// Apply queued commands in order, collapsing runs of saves into the newest one
pub async fn persistence_writer_task(
    store: SnapshotStore,
    mut rx: UnboundedReceiver<PersistCommand>,
) {
    info!("Starting persistence writer for {}", store.path().display());

    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        for command in coalesce(batch) {
            match command {
                PersistCommand::Save(snapshot) => {
                    if let Err(e) = store.save(&snapshot).await {
                        error!("Failed to save timers: {}", e);
                    }
                }
                PersistCommand::Purge => {
                    if let Err(e) = store.purge().await {
                        error!("Failed to purge saved timers: {}", e);
                    }
                }
                PersistCommand::Flush(ack) => {
                    // The waiter may have given up
                    let _ = ack.send(());
                }
            }
        }
    }

    debug!("Persistence queue closed, writer exiting");
}

fn coalesce(batch: Vec<PersistCommand>) -> Vec<PersistCommand> {
    let mut out: Vec<PersistCommand> = Vec::with_capacity(batch.len());
    for command in batch {
        let superseded = matches!(
            (out.last(), &command),
            (Some(PersistCommand::Save(_)), PersistCommand::Save(_))
        );
        if superseded {
            out.pop();
        }
        out.push(command);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineState;

    fn snapshot_with(n: usize) -> Snapshot {
        let mut state = EngineState::new();
        for i in 0..n {
            state.add(&format!("T{}", i), 10, "Work").unwrap();
        }
        state.snapshot()
    }

    #[test]
    fn coalesce_keeps_latest_save_between_purges() {
        let batch = vec![
            PersistCommand::Save(snapshot_with(1)),
            PersistCommand::Save(snapshot_with(2)),
            PersistCommand::Purge,
            PersistCommand::Save(snapshot_with(3)),
        ];
        assert_eq!(
            coalesce(batch),
            vec![
                PersistCommand::Save(snapshot_with(2)),
                PersistCommand::Purge,
                PersistCommand::Save(snapshot_with(3)),
            ]
        );
    }

    #[tokio::test]
    async fn writer_flushes_before_exiting() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("timers.json"));
        let (handle, join) = spawn_persistence_writer(store.clone());

        handle.save(snapshot_with(1));
        handle.save(snapshot_with(2));
        drop(handle);
        join.await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot_with(2)));
    }

    #[tokio::test]
    async fn purge_then_save_leaves_new_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("timers.json"));
        store.save(&snapshot_with(3)).await.unwrap();

        let (handle, join) = spawn_persistence_writer(store.clone());
        handle.purge();
        handle.save(Snapshot::default());
        drop(handle);
        join.await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(Snapshot::default()));
    }

    #[tokio::test]
    async fn failed_save_is_retried_by_next_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.json");
        // A non-empty directory in place of the file makes the rename fail
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let store = SnapshotStore::new(&path);
        let (handle, join) = spawn_persistence_writer(store.clone());
        handle.save(snapshot_with(1));
        handle.flush().await;
        assert!(path.is_dir(), "first save must have failed");

        std::fs::remove_dir_all(&path).unwrap();
        handle.save(snapshot_with(2));
        drop(handle);
        join.await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot_with(2)));
    }

    #[tokio::test]
    async fn flush_waits_for_earlier_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("timers.json"));
        let (handle, join) = spawn_persistence_writer(store.clone());

        handle.save(snapshot_with(1));
        handle.flush().await;
        assert_eq!(store.load().await.unwrap(), Some(snapshot_with(1)));

        drop(handle);
        join.await.unwrap();
    }

    #[test]
    fn disabled_handle_ignores_requests() {
        let handle = PersistenceHandle::disabled();
        handle.save(Snapshot::default());
        handle.purge();
        futures::executor::block_on(handle.flush());
    }
}

//! An open board: live store, debounced auto-save and persistence.

use crate::storage::{AutoSaveScheduler, Persistence, SaveStatus, Storage, StorageResult};
use crate::store::BoardStore;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Owns the board of one project while it is being edited.
pub struct BoardSession<S: Storage> {
    persistence: Persistence<S>,
    project_id: String,
    store: BoardStore,
    scheduler: AutoSaveScheduler,
    seen_revision: u64,
}

impl<S: Storage> BoardSession<S> {
    /// Load a project's board (empty if it has never been saved) and hydrate
    /// its nodes.
    pub async fn open(persistence: Persistence<S>, project_id: &str) -> StorageResult<Self> {
        let document = persistence.load_board(project_id).await?.unwrap_or_default();
        let store = BoardStore::with_document(document);
        log::info!(
            "Opened board {} with {} node(s)",
            project_id,
            store.document().len()
        );
        Ok(Self {
            persistence,
            project_id: project_id.to_string(),
            seen_revision: store.revision(),
            store,
            scheduler: AutoSaveScheduler::default(),
        })
    }

    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.scheduler.set_delay(delay);
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BoardStore {
        &mut self.store
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn status(&self) -> &SaveStatus {
        self.scheduler.status()
    }

    pub fn is_dirty(&self) -> bool {
        self.scheduler.is_dirty() || self.store.revision() != self.seen_revision
    }

    /// Apply queued callback commands and feed new revisions to the
    /// scheduler.
    fn record_changes(&mut self, now: Instant) {
        self.store.apply_pending();
        if self.store.revision() != self.seen_revision {
            self.seen_revision = self.store.revision();
            self.scheduler.note_change(now);
        }
    }

    async fn write(&mut self) -> StorageResult<()> {
        match self
            .persistence
            .save_board(&self.project_id, self.store.document())
            .await
        {
            Ok(()) => {
                log::debug!("Saved board {}", self.project_id);
                self.scheduler.on_saved();
                Ok(())
            }
            Err(e) => {
                self.scheduler.on_failed(&e);
                Err(e)
            }
        }
    }

    /// Advance the session clock. Returns true if the board was written.
    pub async fn tick(&mut self, now: Instant) -> StorageResult<bool> {
        self.record_changes(now);
        if self.scheduler.take_due(now) {
            self.write().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Write any unsaved change now. Returns true if the board was written.
    pub async fn flush(&mut self) -> StorageResult<bool> {
        self.record_changes(Instant::now());
        if !self.scheduler.is_dirty() {
            return Ok(false);
        }
        self.write().await?;
        Ok(true)
    }

    /// Empty the board and remove its stored copy.
    pub async fn clear(&mut self) -> StorageResult<()> {
        self.record_changes(Instant::now());
        self.store.clear();
        self.persistence.remove_board(&self.project_id).await?;
        self.seen_revision = self.store.revision();
        self.scheduler.on_saved();
        log::info!("Cleared board {}", self.project_id);
        Ok(())
    }

    /// Flush and release the session.
    pub async fn close(mut self) -> StorageResult<()> {
        self.flush().await?;
        Ok(())
    }
}

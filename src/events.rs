use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Notifications passed between components after server state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// An upload finished. `folder` is the server-confirmed folder name.
    UploadComplete { folder: String, file_count: usize },
    /// The folder/picture cache was replaced from a fresh listing.
    LibraryRefreshed { folders: usize, pictures: usize },
    FolderDeleted { folder: String, files_deleted: u64 },
}

/// Pub/sub bus handed to each component at construction.
/// Cloning yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Having none is fine.
    pub fn emit(&self, event: AppEvent) {
        tracing::debug!("event: {:?}", event);
        let _ = self.tx.send(event);
    }
}

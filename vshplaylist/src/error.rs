//! Types d'erreurs pour vshplaylist

use uuid::Uuid;

/// Erreurs du dépôt de playlists
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(Uuid),

    #[error("Playlist item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Folder registry error: {0}")]
    Folders(#[from] vshfolders::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour vshplaylist
pub type Result<T> = std::result::Result<T, Error>;

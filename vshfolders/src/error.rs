//! Types d'erreurs pour vshfolders

/// Erreurs du registre de jetons de dossiers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("File not accessible: {0}")]
    FileNotAccessible(String),

    #[error("File has no parent folder: {0}")]
    NoParentFolder(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour vshfolders
pub type Result<T> = std::result::Result<T, Error>;

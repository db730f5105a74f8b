//! Extension de vshconfig pour le registre de dossiers

use std::path::PathBuf;

/// Trait d'extension pour vshconfig::Config
pub trait FoldersConfigExt {
    /// Retourne le répertoire où vit la table des jetons de dossiers
    fn folder_table_dir(&self) -> PathBuf;
}

impl FoldersConfigExt for vshconfig::Config {
    fn folder_table_dir(&self) -> PathBuf {
        // La table vit à côté du document de playlists
        let playlists_dir = self
            .get_managed_dir(&["playlists", "directory"], "playlists")
            .expect("Failed to get or create playlists directory");

        PathBuf::from(playlists_dir)
    }
}

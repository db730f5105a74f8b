//! Extension de vshconfig pour le dépôt de playlists

use std::path::PathBuf;

/// Trait d'extension pour vshconfig::Config
pub trait PlaylistConfigExt {
    /// Retourne le répertoire du document de playlists
    fn playlist_store_dir(&self) -> PathBuf;
}

impl PlaylistConfigExt for vshconfig::Config {
    fn playlist_store_dir(&self) -> PathBuf {
        // Utilise get_managed_dir pour créer le répertoire playlists s'il n'existe pas
        let playlists_dir = self
            .get_managed_dir(&["playlists", "directory"], "playlists")
            .expect("Failed to get or create playlists directory");

        PathBuf::from(playlists_dir)
    }
}

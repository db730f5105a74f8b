//! Exemple de bout en bout du cœur VideoShelf
//!
//! Cet exemple démontre :
//! - Le câblage configuration → registre de dossiers → cache de miniatures → dépôt
//! - La création d'une playlist et l'ajout de fichiers
//! - La résolution des items avec l'état manquant
//!
//! Pour exécuter :
//! ```bash
//! cargo run -p vshplaylist --example basic_usage -- /chemin/vers/video1.mp4 /chemin/vers/video2.mp4
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use vshfolders::{FolderRegistry, FoldersConfigExt};
use vshplaylist::{PlaylistConfigExt, PlaylistStore, Resolution};
use vshthumbs::ThumbsConfigExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = vshconfig::get_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            config
                .get_log_min_level()
                .unwrap_or_else(|_| "info".to_string()),
        )
        .init();

    // Câblage : un seul dépôt, injecté partout
    let folders = Arc::new(FolderRegistry::new(config.folder_table_dir())?);
    let thumbs = config.create_thumbnail_cache()?;
    let store = PlaylistStore::new(config.playlist_store_dir(), folders, thumbs)?;

    println!("=== VideoShelf : dépôt de playlists ===\n");

    // Créer une playlist et y ajouter les fichiers passés en argument
    let files: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if !files.is_empty() {
        let playlist = store.create("Demo").await?;
        let added = store.add_items(playlist.id, &files).await?;
        println!("Playlist '{}' créée avec {} items", playlist.name, added.len());
    }

    // Relire l'état persisté et résoudre chaque item
    for playlist in store.get_all().await? {
        println!(
            "\n{} ({} items, couverture: {})",
            playlist.name,
            playlist.item_count(),
            playlist.cover_image_key.as_deref().unwrap_or("aucune")
        );

        for mut item in playlist.items {
            match store.try_resolve(&mut item).await {
                Resolution::Found(path) => {
                    println!("  [{}] {} -> {}", item.sort_index, item.display_name, path.display())
                }
                Resolution::Missing => {
                    println!("  [{}] {} -> MANQUANT", item.sort_index, item.display_name)
                }
            }
        }
    }

    Ok(())
}

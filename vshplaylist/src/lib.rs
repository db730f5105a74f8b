//! # vshplaylist - Dépôt persistant de playlists vidéo
//!
//! Cette crate est le cœur de VideoShelf : la représentation faisant
//! autorité, en mémoire et sur disque, de toutes les playlists et de leurs
//! items. Elle fournit :
//! - Création, renommage, suppression de playlists
//! - Ajout, retrait, réordonnancement et re-lien d'items
//! - Persistance atomique (document JSON entier, remplacement par renommage)
//! - Récupération sur corruption avec mise en quarantaine du fichier fautif
//! - Composition du résolveur d'identité (vshfolders) et du cache de
//!   miniatures (vshthumbs) : chaque item ajouté est d'abord résolu en
//!   référence durable, puis sa miniature est mise en cache
//!
//! # Architecture
//!
//! - **PlaylistStore** : dépôt unique, construit au démarrage et injecté
//!   dans les appelants ; toutes les opérations sont sérialisées par un
//!   verrou couvrant chargement → mutation → persistance
//! - **PersistenceManager** : remplacement atomique du document JSON
//! - **Playlist / PlaylistItem** : modèles persistés, identités stables
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use vshfolders::FolderRegistry;
//! use vshplaylist::PlaylistStore;
//! use vshthumbs::{ImageRenderer, ThumbnailCache};
//!
//! # #[tokio::main]
//! # async fn main() -> vshplaylist::Result<()> {
//! let folders = Arc::new(FolderRegistry::new("./data")?);
//! let thumbs = Arc::new(ThumbnailCache::new("./thumbnails", Arc::new(ImageRenderer))?);
//! let store = PlaylistStore::new("./data", folders, thumbs)?;
//!
//! // Créer une playlist et y ajouter des fichiers
//! let playlist = store.create("Favorites").await?;
//! store
//!     .add_items(playlist.id, &[PathBuf::from("/videos/holidays.mp4")])
//!     .await?;
//!
//! // Relire et résoudre
//! for playlist in store.get_all().await? {
//!     println!("{} ({} items)", playlist.name, playlist.item_count());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod model;
mod persistence;
mod store;

#[cfg(feature = "vshconfig")]
mod config_ext;

// Réexports publics
pub use error::{Error, Result};
pub use model::{Playlist, PlaylistCollection, PlaylistItem};
pub use persistence::PersistenceManager;
pub use store::PlaylistStore;

// Réexports de commodité pour les appelants du cœur
pub use vshfolders::{FileHints, FileReference, Resolution};

#[cfg(feature = "vshconfig")]
pub use config_ext::PlaylistConfigExt;

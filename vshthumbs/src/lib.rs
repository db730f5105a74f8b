//! # vshthumbs - Cache de miniatures adressé par identité logique
//!
//! Cette crate fournit un cache sur disque d'aperçus pour les fichiers
//! vidéo :
//! - Clés stables dérivées de l'identité logique (jeton de dossier + nom)
//! - Génération idempotente : même item → même clé → même fichier
//! - Couvertures personnalisées sous clés aléatoires distinctes
//! - Nettoyage des orphelins borné par un ensemble de clés référencées et
//!   une fenêtre de rétention
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use std::sync::Arc;
//! use vshthumbs::{ImageRenderer, ThumbnailCache};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let cache = ThumbnailCache::new("./thumbnails", Arc::new(ImageRenderer))?;
//!
//! // Générer (ou retrouver) la miniature d'un item
//! if let Some(key) = cache
//!     .get_or_create_key("/videos/holidays.mp4".as_ref(), Some("PlaylistFolder_abc"))
//!     .await
//! {
//!     let image = cache.load_thumbnail(&key).await;
//!     println!("Thumbnail {} loaded: {}", key, image.is_some());
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod render;

#[cfg(feature = "vshconfig")]
mod config_ext;

// Réexports publics
pub use cache::ThumbnailCache;
pub use render::{downscale, ImageRenderer, ThumbnailRenderer, DEFAULT_EDGE_PX};

#[cfg(feature = "vshconfig")]
pub use config_ext::{ThumbsConfigExt, DEFAULT_RETENTION_DAYS};

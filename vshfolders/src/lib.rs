//! # vshfolders - Jetons de capacité et résolution d'identité des fichiers
//!
//! Cette crate fait le pont entre « un fichier que l'utilisateur vient de
//! choisir » et « une référence que l'on peut rouvrir la semaine prochaine » :
//! - Jetons de capacité opaques (`PlaylistFolder_{id}`) vers les dossiers
//! - Un seul jeton par dossier distinct, réutilisé entre les fichiers
//! - Résolution avec chaîne de repli documentée et état terminal `Missing`
//! - Persistance atomique de la table des jetons (JSON)
//!
//! # Exemple d'utilisation
//!
//! ```no_run
//! use vshfolders::{FolderRegistry, Resolution};
//!
//! # #[tokio::main]
//! # async fn main() -> vshfolders::Result<()> {
//! let registry = FolderRegistry::new("./data")?;
//!
//! // Capturer une référence durable au moment de l'ajout
//! let (reference, hints) = registry.capture("/videos/holidays.mp4".as_ref()).await?;
//!
//! // La rouvrir plus tard, même après un redémarrage
//! match registry.try_resolve(&reference, &hints).await {
//!     Resolution::Found(path) => println!("Playing: {:?}", path),
//!     Resolution::Missing => println!("File is missing, ask the user to re-link"),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod reference;
mod registry;

#[cfg(feature = "vshconfig")]
mod config_ext;

// Réexports publics
pub use error::{Error, Result};
pub use reference::{FileHints, FileReference, Resolution};
pub use registry::FolderRegistry;

#[cfg(feature = "vshconfig")]
pub use config_ext::FoldersConfigExt;

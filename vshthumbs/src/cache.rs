//! Cache de miniatures adressé par identité logique
//!
//! Les clés sont dérivées de l'identité logique du fichier (jeton de dossier
//! + nom de fichier), pas de son contenu : deux demandes pour le même item
//! retombent sur le même fichier `thumb_{clé}.jpg`, ce qui rend la
//! génération concurrente bénigne sans verrou (même clé → mêmes octets).

use crate::render::{ThumbnailRenderer, DEFAULT_EDGE_PX};
use anyhow::{bail, Context, Result};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Préfixe des fichiers du cache
const FILE_PREFIX: &str = "thumb_";

/// Extension des fichiers du cache
const FILE_EXT: &str = "jpg";

/// Préfixe des clés d'images personnalisées (sans identité logique stable)
const CUSTOM_KEY_PREFIX: &str = "custom_";

/// Cache sur disque d'aperçus `thumb_{clé}.jpg`
///
/// Deux familles de clés cohabitent :
/// - clés dérivées (16 hex) : hachage SHA-256 de l'identité logique,
///   régénérables à la demande depuis le fichier source ;
/// - clés personnalisées (`custom_{id}`) : couvertures fournies par
///   l'utilisateur, copiées telles quelles et non régénérables.
pub struct ThumbnailCache {
    dir: PathBuf,
    edge_px: u32,
    renderer: Arc<dyn ThumbnailRenderer>,
}

impl ThumbnailCache {
    /// Crée un cache dans le répertoire donné avec la taille d'arête par défaut
    pub fn new(dir: impl Into<PathBuf>, renderer: Arc<dyn ThumbnailRenderer>) -> Result<Self> {
        Self::with_edge(dir, DEFAULT_EDGE_PX, renderer)
    }

    /// Crée un cache avec une taille d'arête cible explicite
    pub fn with_edge(
        dir: impl Into<PathBuf>,
        edge_px: u32,
        renderer: Arc<dyn ThumbnailRenderer>,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create thumbnail directory {}", dir.display()))?;

        Ok(Self {
            dir,
            edge_px,
            renderer,
        })
    }

    /// Retourne la clé de miniature pour un fichier, en la générant au besoin
    ///
    /// La clé est stable : hachage de `{jeton}|{nom de fichier}` (repli sur
    /// le chemin brut sans jeton), donc idempotente pour un même item. Si le
    /// fichier `thumb_{clé}.jpg` existe déjà, aucun travail n'est effectué.
    /// Sinon le rendu est demandé au renderer ; tout échec dégrade en `None`,
    /// jamais en erreur.
    pub async fn get_or_create_key(&self, file: &Path, folder_token: Option<&str>) -> Option<String> {
        let key = self.key_for(file, folder_token);
        let path = self.thumbnail_path(&key);

        if path.exists() {
            tracing::debug!(key = %key, "Thumbnail cache hit");
            return Some(key);
        }

        match self.generate(file, &path).await {
            Ok(()) => {
                tracing::debug!(key = %key, file = %file.display(), "Generated thumbnail");
                Some(key)
            }
            Err(err) => {
                tracing::debug!(file = %file.display(), "Thumbnail generation failed: {}", err);
                None
            }
        }
    }

    /// Charge une miniature depuis le cache
    ///
    /// `None` sur toute erreur d'E/S ou de décodage.
    pub async fn load_thumbnail(&self, key: &str) -> Option<DynamicImage> {
        let path = self.thumbnail_path(key);
        let bytes = tokio::fs::read(&path).await.ok()?;

        tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .ok()?
            .ok()
    }

    /// Enregistre une image de couverture fournie par l'utilisateur
    ///
    /// L'entrée n'a pas d'identité logique stable : la clé est aléatoire,
    /// sous un préfixe distinctif, et les octets sont copiés tels quels.
    pub async fn save_custom_image(&self, file: &Path) -> Result<String> {
        let key = format!("{}{}", CUSTOM_KEY_PREFIX, Uuid::new_v4().simple());
        let target = self.thumbnail_path(&key);

        tokio::fs::copy(file, &target)
            .await
            .with_context(|| format!("Failed to copy custom image {}", file.display()))?;

        Ok(key)
    }

    /// Supprime une miniature par clé (silencieux si déjà absente)
    pub async fn delete_thumbnail(&self, key: &str) -> Result<()> {
        let path = self.thumbnail_path(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Balaie le cache et supprime les miniatures orphelines
    ///
    /// Une entrée est supprimée si sa clé est absente de `referenced_keys`
    /// ET si sa date de modification dépasse la fenêtre de rétention. Les
    /// clés `custom_` sont ignorées par le balayage : elles ne sont pas
    /// régénérables depuis un fichier source, un ensemble de clés périmé ne
    /// doit donc pas pouvoir détruire une couverture utilisateur.
    ///
    /// # Returns
    ///
    /// Le nombre d'entrées supprimées
    pub async fn cleanup_orphaned(
        &self,
        referenced_keys: &HashSet<String>,
        max_age_days: u32,
    ) -> Result<usize> {
        let retention = Duration::from_secs(u64::from(max_age_days) * 86_400);
        let Some(cutoff) = SystemTime::now().checked_sub(retention) else {
            return Ok(0);
        };

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(key) = extract_key(name) else {
                continue;
            };

            if key.starts_with(CUSTOM_KEY_PREFIX) {
                continue;
            }
            if referenced_keys.contains(key) {
                continue;
            }

            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            if modified < cutoff {
                if let Err(err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(file = %path.display(), "Failed to remove orphaned thumbnail: {}", err);
                } else {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            tracing::info!("Thumbnail cleanup: removed {} orphaned entries", removed);
        }

        Ok(removed)
    }

    /// Calcule la clé stable d'un fichier
    ///
    /// Identité logique : `{jeton}|{nom de fichier}`, en minuscules, hachée
    /// en SHA-256 et tronquée à 16 caractères hexadécimaux pour un nom de
    /// fichier compact. Sans jeton, repli sur le chemin brut.
    pub fn key_for(&self, file: &Path, folder_token: Option<&str>) -> String {
        let identity = match (folder_token, file.file_name()) {
            (Some(token), Some(name)) if !token.is_empty() => {
                format!("{}|{}", token, name.to_string_lossy())
            }
            _ => file.to_string_lossy().to_string(),
        };

        let mut hasher = Sha256::new();
        hasher.update(identity.to_lowercase().as_bytes());
        let digest = hasher.finalize();

        hex::encode(&digest[..8]) // 8 octets = 16 caractères hex
    }

    /// Construit le chemin du fichier de cache pour une clé
    ///
    /// Format: `thumb_{clé}.jpg`
    pub fn thumbnail_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}.{}", FILE_PREFIX, key, FILE_EXT))
    }

    /// Retourne le répertoire du cache
    pub fn cache_dir(&self) -> &Path {
        &self.dir
    }

    /// Retourne la taille d'arête cible des miniatures générées
    pub fn edge_px(&self) -> u32 {
        self.edge_px
    }

    async fn generate(&self, file: &Path, target: &Path) -> Result<()> {
        let img = self.renderer.render(file, self.edge_px).await?;

        if img.width() == 0 || img.height() == 0 {
            bail!("Renderer returned an empty image");
        }

        let bytes = encode_jpeg(&img)?;

        // Écriture avec remplacement : une régénération concurrente de la
        // même clé produit les mêmes octets
        tokio::fs::write(target, &bytes)
            .await
            .with_context(|| format!("Failed to write thumbnail {}", target.display()))?;

        Ok(())
    }
}

/// Extrait la clé d'un nom de fichier `thumb_{clé}.jpg`
fn extract_key(file_name: &str) -> Option<&str> {
    file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(".jpg")
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut bytes);
    rgb.write_to(&mut cursor, image::ImageFormat::Jpeg)?;
    Ok(bytes)
}

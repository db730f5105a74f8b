//! Persistance atomique du document de playlists
//!
//! Le document entier est réécrit à chaque mutation : écriture dans
//! `playlists.json.tmp`, suppression de l'ancien `playlists.json`, puis
//! renommage du temporaire vers le nom canonique. Le renommage étant atomique
//! sur le système de fichiers sous-jacent, le nom canonique désigne à tout
//! instant soit l'ancien document complet, soit le nouveau ; un crash entre
//! la suppression et le renommage laisse au pire un fichier absent, traité
//! comme un premier démarrage.

use crate::model::PlaylistCollection;
use crate::{Error, Result};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Nom canonique du document
const COLLECTION_FILE: &str = "playlists.json";

/// Gestionnaire de persistance du document de playlists
pub struct PersistenceManager {
    dir: PathBuf,
}

impl PersistenceManager {
    /// Initialise le gestionnaire de persistance
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::PersistenceError(format!("Failed to create data directory: {}", e))
        })?;

        Ok(Self { dir })
    }

    /// Charge le document, avec récupération sur corruption
    ///
    /// Fichier absent : collection vide (premier démarrage, pas une erreur).
    /// JSON malformé : le fichier fautif est renommé en
    /// `playlists.bad.{timestamp}.json` pour analyse, et une collection vide
    /// est retournée. La corruption ne fait jamais planter le chargement,
    /// mais les octets fautifs ne sont jamais détruits silencieusement.
    pub async fn load(&self) -> Result<PlaylistCollection> {
        let path = self.document_path();

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("No playlist document yet, starting with an empty collection");
                return Ok(PlaylistCollection::default());
            }
            Err(err) => {
                return Err(Error::PersistenceError(format!(
                    "Failed to read playlist document: {}",
                    err
                )))
            }
        };

        match serde_json::from_str(&json) {
            Ok(collection) => Ok(collection),
            Err(err) => {
                // Document corrompu : quarantaine puis redémarrage à vide
                let quarantine = self.dir.join(format!(
                    "playlists.bad.{}.json",
                    Utc::now().timestamp_nanos_opt().unwrap_or_default()
                ));
                tracing::warn!(
                    quarantine = %quarantine.display(),
                    "Corrupted playlist document, quarantining: {}",
                    err
                );
                if let Err(err) = tokio::fs::rename(&path, &quarantine).await {
                    tracing::warn!("Failed to quarantine corrupted playlist document: {}", err);
                }
                Ok(PlaylistCollection::default())
            }
        }
    }

    /// Écrit le document entier par remplacement atomique
    pub async fn save(&self, collection: &PlaylistCollection) -> Result<()> {
        let json = serde_json::to_string_pretty(collection).map_err(|e| {
            Error::PersistenceError(format!("Failed to serialize playlist document: {}", e))
        })?;

        let tmp = self.dir.join(format!("{}.tmp", COLLECTION_FILE));
        let target = self.document_path();

        tokio::fs::write(&tmp, json).await.map_err(|e| {
            Error::PersistenceError(format!("Failed to write playlist document: {}", e))
        })?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(Error::PersistenceError(format!(
                    "Failed to replace playlist document: {}",
                    err
                )))
            }
        }

        tokio::fs::rename(&tmp, &target).await.map_err(|e| {
            Error::PersistenceError(format!("Failed to commit playlist document: {}", e))
        })?;

        Ok(())
    }

    /// Chemin du document canonique
    pub fn document_path(&self) -> PathBuf {
        self.dir.join(COLLECTION_FILE)
    }

    /// Répertoire de persistance
    pub fn data_dir(&self) -> &Path {
        &self.dir
    }
}

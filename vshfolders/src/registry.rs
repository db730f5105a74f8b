//! FolderRegistry : table de jetons de capacité vers les dossiers

use crate::reference::{FileHints, FileReference, Resolution};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Préfixe réservé aux jetons de dossiers de playlists
const TOKEN_PREFIX: &str = "PlaylistFolder_";

/// Nom du fichier de persistance de la table
const TOKENS_FILE: &str = "folder_tokens.json";

/// Registre des jetons de capacité dossier → chemin absolu
///
/// Chaque jeton accorde un accès durable et révocable à un dossier sans que
/// son chemin brut ne serve de source de vérité aux items. Un seul jeton est
/// émis par dossier distinct (comparaison de chemins insensible à la casse),
/// ce qui borne la taille de la table à un jeton par dossier jamais utilisé.
///
/// La table est persistée dans `folder_tokens.json` avec la même discipline
/// de remplacement atomique que le document de playlists, et rechargée
/// paresseusement au premier accès.
pub struct FolderRegistry {
    dir: PathBuf,
    state: Mutex<Option<HashMap<String, PathBuf>>>,
}

impl FolderRegistry {
    /// Crée un registre persisté dans le répertoire donné
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::PersistenceError(format!("Failed to create registry directory: {}", e))
        })?;

        Ok(Self {
            dir,
            state: Mutex::new(None),
        })
    }

    /// Retourne un jeton pour ce dossier, en réutilisant un jeton existant
    ///
    /// Parcourt la table à la recherche d'un jeton pointant déjà vers un
    /// dossier égal (comparaison insensible à la casse) et le réutilise.
    /// Sinon, émet un nouveau jeton `PlaylistFolder_{id}` et persiste la
    /// table.
    pub async fn get_or_create_token(&self, folder: &Path) -> Result<String> {
        if !folder.is_dir() {
            return Err(Error::NotADirectory(folder.display().to_string()));
        }

        let canonical = tokio::fs::canonicalize(folder)
            .await
            .map_err(|e| Error::NotADirectory(format!("{}: {}", folder.display(), e)))?;

        let mut state = self.state.lock().await;
        let table = self.ensure_loaded(&mut state).await?;

        // Réutiliser un jeton existant pour ce dossier
        let needle = lowercase_path(&canonical);
        for (token, path) in table.iter() {
            if !token.starts_with(TOKEN_PREFIX) {
                continue;
            }
            if lowercase_path(path) == needle {
                return Ok(token.clone());
            }
        }

        // Émettre un nouveau jeton
        let token = format!("{}{}", TOKEN_PREFIX, Uuid::new_v4().simple());
        table.insert(token.clone(), canonical);
        self.save(table).await?;

        tracing::debug!(token = %token, folder = %folder.display(), "Registered new folder token");
        Ok(token)
    }

    /// Résout un jeton vers son dossier, si le dossier est encore atteignable
    ///
    /// Retourne `None` pour un jeton inconnu, révoqué, ou dont le dossier
    /// n'existe plus sur disque.
    pub async fn resolve_token(&self, token: &str) -> Option<PathBuf> {
        let mut state = self.state.lock().await;
        let table = self.ensure_loaded(&mut state).await.ok()?;

        let folder = table.get(token)?.clone();
        if folder.is_dir() {
            Some(folder)
        } else {
            None
        }
    }

    /// Révoque un jeton (silencieux si le jeton est inconnu)
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let table = self.ensure_loaded(&mut state).await?;

        if table.remove(token).is_some() {
            self.save(table).await?;
            tracing::debug!(token = %token, "Revoked folder token");
        }

        Ok(())
    }

    /// Capture une référence durable et ses indices pour un fichier
    ///
    /// Résout le dossier parent, réutilise ou émet son jeton, et fige les
    /// indices de repli (chemin absolu, taille, date d'écriture) à cet
    /// instant précis.
    pub async fn capture(&self, file: &Path) -> Result<(FileReference, FileHints)> {
        let canonical = tokio::fs::canonicalize(file)
            .await
            .map_err(|e| Error::FileNotAccessible(format!("{}: {}", file.display(), e)))?;

        let parent = canonical
            .parent()
            .ok_or_else(|| Error::NoParentFolder(canonical.display().to_string()))?;
        let file_name = canonical
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::NoParentFolder(canonical.display().to_string()))?;

        let token = self.get_or_create_token(parent).await?;

        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|e| Error::FileNotAccessible(format!("{}: {}", canonical.display(), e)))?;

        let hints = FileHints {
            last_known_path: Some(canonical.to_string_lossy().to_string()),
            size_bytes: Some(metadata.len()),
            last_write_utc: metadata.modified().ok().map(DateTime::<Utc>::from),
        };

        Ok((
            FileReference {
                folder_token: token,
                file_name,
            },
            hints,
        ))
    }

    /// Tente de rouvrir un fichier à partir de sa référence
    ///
    /// Chaîne de repli : (1) jeton → dossier → fichier ; (2) dernier chemin
    /// absolu connu ; (3) `Missing`. Aucune erreur ne sort de cet appel.
    pub async fn try_resolve(&self, reference: &FileReference, hints: &FileHints) -> Resolution {
        // 1) Jeton → dossier → fichier
        if let Some(folder) = self.resolve_token(&reference.folder_token).await {
            let candidate = folder.join(&reference.file_name);
            if candidate.is_file() {
                return Resolution::Found(candidate);
            }
        }

        // 2) Repli sur le chemin absolu mémorisé
        if let Some(path) = hints.last_known_path.as_deref() {
            if !path.is_empty() {
                let candidate = PathBuf::from(path);
                if candidate.is_file() {
                    return Resolution::Found(candidate);
                }
            }
        }

        Resolution::Missing
    }

    /// Retourne le répertoire de persistance du registre
    pub fn registry_dir(&self) -> &Path {
        &self.dir
    }

    async fn ensure_loaded<'a>(
        &self,
        state: &'a mut Option<HashMap<String, PathBuf>>,
    ) -> Result<&'a mut HashMap<String, PathBuf>> {
        if state.is_none() {
            *state = Some(self.load().await?);
        }
        Ok(state.as_mut().expect("registry table loaded above"))
    }

    async fn load(&self) -> Result<HashMap<String, PathBuf>> {
        let path = self.dir.join(TOKENS_FILE);

        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(err) => {
                return Err(Error::PersistenceError(format!(
                    "Failed to read token table: {}",
                    err
                )))
            }
        };

        match serde_json::from_str(&json) {
            Ok(table) => Ok(table),
            Err(err) => {
                // Table corrompue : quarantaine puis redémarrage à vide
                let quarantine = self.dir.join(format!(
                    "folder_tokens.bad.{}.json",
                    Utc::now().timestamp_nanos_opt().unwrap_or_default()
                ));
                tracing::warn!(
                    quarantine = %quarantine.display(),
                    "Corrupted folder token table, quarantining: {}",
                    err
                );
                if let Err(err) = tokio::fs::rename(&path, &quarantine).await {
                    tracing::warn!("Failed to quarantine corrupted token table: {}", err);
                }
                Ok(HashMap::new())
            }
        }
    }

    async fn save(&self, table: &HashMap<String, PathBuf>) -> Result<()> {
        let json = serde_json::to_string_pretty(table).map_err(|e| {
            Error::PersistenceError(format!("Failed to serialize token table: {}", e))
        })?;

        let tmp = self.dir.join(format!("{}.tmp", TOKENS_FILE));
        let target = self.dir.join(TOKENS_FILE);

        tokio::fs::write(&tmp, json).await.map_err(|e| {
            Error::PersistenceError(format!("Failed to write token table: {}", e))
        })?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(Error::PersistenceError(format!(
                    "Failed to replace token table: {}",
                    err
                )))
            }
        }

        tokio::fs::rename(&tmp, &target).await.map_err(|e| {
            Error::PersistenceError(format!("Failed to commit token table: {}", e))
        })?;

        Ok(())
    }
}

fn lowercase_path(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

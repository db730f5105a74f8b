//! PlaylistStore : dépôt faisant autorité pour toutes les playlists
//!
//! Le graphe en mémoire est chargé une fois depuis le disque (ou créé vide)
//! puis muté sur place ; chaque mutation est suivie d'une réécriture
//! atomique du document. Toutes les opérations sont sérialisées par un
//! unique verrou couvrant la séquence chargement → mutation → persistance :
//! on échange du débit contre de la simplicité, ce qui convient à un
//! processus local sans écrivain concurrent.

use crate::model::{Playlist, PlaylistCollection, PlaylistItem};
use crate::persistence::PersistenceManager;
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use vshfolders::{FileReference, FolderRegistry, Resolution};
use vshthumbs::ThumbnailCache;

/// Dépôt de playlists, construit une fois au démarrage et injecté partout
///
/// Le dépôt possède exclusivement le graphe en mémoire : les appelants
/// reçoivent des clones et ne conservent jamais d'alias vers l'état
/// canonique, qui peut être entièrement remplacé par [`invalidate`].
///
/// [`invalidate`]: PlaylistStore::invalidate
pub struct PlaylistStore {
    persistence: PersistenceManager,
    folders: Arc<FolderRegistry>,
    thumbs: Arc<ThumbnailCache>,
    state: Mutex<Option<PlaylistCollection>>,
}

impl PlaylistStore {
    /// Crée un dépôt persisté dans le répertoire donné
    pub fn new(
        data_dir: impl Into<PathBuf>,
        folders: Arc<FolderRegistry>,
        thumbs: Arc<ThumbnailCache>,
    ) -> Result<Self> {
        Ok(Self {
            persistence: PersistenceManager::new(data_dir)?,
            folders,
            thumbs,
            state: Mutex::new(None),
        })
    }

    /// Retourne toutes les playlists, items triés par position
    pub async fn get_all(&self) -> Result<Vec<Playlist>> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let mut playlists = collection.playlists.clone();
        for playlist in &mut playlists {
            playlist.items.sort_by_key(|i| i.sort_index);
        }

        Ok(playlists)
    }

    /// Crée une playlist vide avec un identifiant frais
    pub async fn create(&self, name: &str) -> Result<Playlist> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let playlist = Playlist::new(name);
        collection.playlists.push(playlist.clone());
        self.persistence.save(collection).await?;

        tracing::debug!(playlist = %playlist.id, name = %playlist.name, "Created playlist");
        Ok(playlist)
    }

    /// Renomme une playlist (silencieux si l'identifiant est inconnu)
    pub async fn rename(&self, playlist_id: Uuid, new_name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let Some(playlist) = collection.find_mut(playlist_id) else {
            return Ok(());
        };

        playlist.name = new_name.to_string();
        playlist.touch();
        self.persistence.save(collection).await?;

        Ok(())
    }

    /// Supprime une playlist (silencieux si l'identifiant est inconnu)
    ///
    /// L'appelant ne peut pas distinguer utilement « déjà supprimée » de
    /// « n'a jamais existé » : aucune erreur n'est signalée.
    pub async fn delete(&self, playlist_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let before = collection.playlists.len();
        collection.playlists.retain(|p| p.id != playlist_id);

        if collection.playlists.len() == before {
            return Ok(());
        }

        self.persistence.save(collection).await?;
        tracing::debug!(playlist = %playlist_id, "Deleted playlist");
        Ok(())
    }

    /// Change la couverture d'une playlist (silencieux si inconnue)
    pub async fn update_cover_image(
        &self,
        playlist_id: Uuid,
        cover_image_key: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let Some(playlist) = collection.find_mut(playlist_id) else {
            return Ok(());
        };

        playlist.cover_image_key = cover_image_key;
        playlist.touch();
        self.persistence.save(collection).await?;

        Ok(())
    }

    /// Ajoute des fichiers à une playlist, dans l'ordre fourni
    ///
    /// Chaque fichier est d'abord résolu en référence durable, puis sa
    /// miniature est générée (ou retrouvée). Les nouveaux items reçoivent des
    /// positions strictement après les items existants, sans entrelacement.
    /// Si la playlist n'a pas encore de couverture, elle est prise sur le
    /// premier item disposant d'une miniature.
    ///
    /// # Errors
    ///
    /// `Error::PlaylistNotFound` si la playlist n'existe pas : laisser
    /// tomber silencieusement un ajout explicite perdrait des données
    /// utilisateur, contrairement aux suppressions idempotentes.
    pub async fn add_items(&self, playlist_id: Uuid, files: &[PathBuf]) -> Result<Vec<PlaylistItem>> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let playlist = collection
            .find_mut(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?;

        let base_index = playlist.next_sort_index();
        let mut added = Vec::new();

        for (offset, file) in files.iter().enumerate() {
            // Référence durable d'abord, miniature ensuite
            let (reference, hints) = self.folders.capture(file).await?;
            let thumbnail_key = self
                .thumbs
                .get_or_create_key(file, Some(&reference.folder_token))
                .await;

            let item = PlaylistItem {
                id: Uuid::new_v4(),
                playlist_id,
                sort_index: base_index + offset as u32,
                display_name: display_name_for(&reference),
                duration_text: None,
                reference,
                hints,
                thumbnail_key,
                is_missing: false,
            };

            playlist.items.push(item.clone());
            added.push(item);
        }

        // Couverture par défaut : la première miniature disponible
        if playlist.cover_image_key.is_none() {
            playlist.cover_image_key = playlist.items.iter().find_map(|i| i.thumbnail_key.clone());
        }

        playlist.touch();
        self.persistence.save(collection).await?;

        tracing::debug!(playlist = %playlist_id, count = added.len(), "Added items");
        Ok(added)
    }

    /// Retire un item d'une playlist (silencieux si playlist ou item inconnu)
    pub async fn remove_item(&self, playlist_id: Uuid, item_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let Some(playlist) = collection.find_mut(playlist_id) else {
            return Ok(());
        };

        let before = playlist.items.len();
        playlist.items.retain(|i| i.id != item_id);

        if playlist.items.len() == before {
            return Ok(());
        }

        playlist.touch();
        self.persistence.save(collection).await?;

        Ok(())
    }

    /// Réordonne les items selon la séquence d'identifiants fournie
    ///
    /// Chaque item mentionné reçoit sa position dans la séquence comme
    /// index. Les items absents de la séquence gardent leur ancien index :
    /// une séquence partielle est acceptée sans erreur mais produit un ordre
    /// incohérent, fournir l'ordre complet est un contrat de l'appelant.
    pub async fn reorder(&self, playlist_id: Uuid, ordered_item_ids: &[Uuid]) -> Result<()> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let playlist = collection
            .find_mut(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?;

        for (position, item_id) in ordered_item_ids.iter().enumerate() {
            if let Some(item) = playlist.find_item_mut(*item_id) {
                item.sort_index = position as u32;
            }
        }

        playlist.sort_items();
        playlist.touch();
        self.persistence.save(collection).await?;

        Ok(())
    }

    /// Reporte les champs re-liables d'un item mis à jour sur l'item stocké
    ///
    /// Utilisé après un re-lien effectué hors du dépôt : seuls la référence,
    /// les indices, le nom affiché, la durée et la clé de miniature sont
    /// copiés, jamais `id`, `playlist_id` ni `sort_index`. Silencieux si la
    /// playlist ou l'item est introuvable.
    pub async fn update_item(&self, playlist_id: Uuid, updated_item: &PlaylistItem) -> Result<()> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let Some(playlist) = collection.find_mut(playlist_id) else {
            return Ok(());
        };
        let Some(item) = playlist.find_item_mut(updated_item.id) else {
            return Ok(());
        };

        item.reference = updated_item.reference.clone();
        item.hints = updated_item.hints.clone();
        item.display_name = updated_item.display_name.clone();
        item.duration_text = updated_item.duration_text.clone();
        item.thumbnail_key = updated_item.thumbnail_key.clone();

        playlist.touch();
        self.persistence.save(collection).await?;

        Ok(())
    }

    /// Re-lie un item sur un nouveau fichier, en préservant sa position
    ///
    /// Re-capture la référence et les indices sur le nouveau fichier,
    /// rafraîchit le nom affiché et la miniature, efface l'état manquant.
    /// `id`, `playlist_id` et `sort_index` ne changent jamais : c'est tout
    /// l'intérêt de séparer l'identité logique de la référence physique.
    pub async fn relink_item(
        &self,
        playlist_id: Uuid,
        item_id: Uuid,
        new_file: &Path,
    ) -> Result<PlaylistItem> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let playlist = collection
            .find_mut(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?;

        if playlist.find_item(item_id).is_none() {
            return Err(Error::ItemNotFound(item_id));
        }

        let (reference, hints) = self.folders.capture(new_file).await?;
        let thumbnail_key = self
            .thumbs
            .get_or_create_key(new_file, Some(&reference.folder_token))
            .await;

        let item = playlist
            .find_item_mut(item_id)
            .ok_or(Error::ItemNotFound(item_id))?;

        item.display_name = display_name_for(&reference);
        item.reference = reference;
        item.hints = hints;
        item.thumbnail_key = thumbnail_key;
        item.is_missing = false;

        let relinked = item.clone();
        playlist.touch();
        self.persistence.save(collection).await?;

        tracing::debug!(item = %item_id, "Re-linked item");
        Ok(relinked)
    }

    /// Tente de rouvrir le fichier d'un item et recalcule son état manquant
    ///
    /// Délègue la chaîne de repli au registre de dossiers ; aucune erreur ne
    /// sort de cet appel. Pas de verrou : l'état partagé n'est pas touché.
    pub async fn try_resolve(&self, item: &mut PlaylistItem) -> Resolution {
        let resolution = self.folders.try_resolve(&item.reference, &item.hints).await;
        item.is_missing = resolution.is_missing();
        resolution
    }

    /// Invalide le graphe en mémoire pour forcer un rechargement
    ///
    /// Utile quand le document sur disque a été modifié hors du dépôt.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    /// Ensemble des clés de miniatures actuellement référencées
    ///
    /// Couvre les clés d'items et les couvertures de playlists. C'est
    /// l'ensemble à fournir au nettoyage du cache de miniatures : un
    /// ensemble périmé fait purger des entrées encore utiles.
    pub async fn referenced_thumbnail_keys(&self) -> Result<HashSet<String>> {
        let mut state = self.state.lock().await;
        let collection = self.ensure_loaded(&mut state).await?;

        let mut keys = HashSet::new();
        for playlist in &collection.playlists {
            if let Some(key) = &playlist.cover_image_key {
                keys.insert(key.clone());
            }
            for item in &playlist.items {
                if let Some(key) = &item.thumbnail_key {
                    keys.insert(key.clone());
                }
            }
        }

        Ok(keys)
    }

    /// Accès au registre de jetons de dossiers partagé
    pub fn folders(&self) -> &Arc<FolderRegistry> {
        &self.folders
    }

    /// Accès au cache de miniatures partagé
    pub fn thumbnails(&self) -> &Arc<ThumbnailCache> {
        &self.thumbs
    }

    async fn ensure_loaded<'a>(
        &self,
        state: &'a mut Option<PlaylistCollection>,
    ) -> Result<&'a mut PlaylistCollection> {
        if state.is_none() {
            *state = Some(self.persistence.load().await?);
        }
        Ok(state.as_mut().expect("collection loaded above"))
    }
}

/// Nom affiché dérivé du nom de fichier, sans extension
fn display_name_for(reference: &FileReference) -> String {
    Path::new(&reference.file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| reference.file_name.clone())
}

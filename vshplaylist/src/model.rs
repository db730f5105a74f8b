//! Modèles persistés : collection, playlist, item

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vshfolders::{FileHints, FileReference};

/// Racine persistée unique : la liste ordonnée des playlists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistCollection {
    pub playlists: Vec<Playlist>,
}

impl PlaylistCollection {
    /// Recherche une playlist par identifiant
    pub fn find(&self, id: Uuid) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: Uuid) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == id)
    }
}

/// Une playlist nommée et datée
///
/// `id` ne change jamais après création. `updated_utc` est avancé à chaque
/// mutation de la playlist ou de ses items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,

    /// Clé de couverture ; par défaut la miniature du premier item qui en a une
    pub cover_image_key: Option<String>,

    pub items: Vec<PlaylistItem>,
}

impl Playlist {
    pub(crate) fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_utc: now,
            updated_utc: now,
            cover_image_key: None,
            items: Vec::new(),
        }
    }

    /// Nombre d'items
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Recherche un item par identifiant
    pub fn find_item(&self, item_id: Uuid) -> Option<&PlaylistItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub(crate) fn find_item_mut(&mut self, item_id: Uuid) -> Option<&mut PlaylistItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Prochain index d'insertion : toujours après les items existants
    pub(crate) fn next_sort_index(&self) -> u32 {
        self.items
            .iter()
            .map(|i| i.sort_index)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    pub(crate) fn sort_items(&mut self) {
        self.items.sort_by_key(|i| i.sort_index);
    }

    pub(crate) fn touch(&mut self) {
        self.updated_utc = Utc::now();
    }
}

/// Un item de playlist : identité stable, référence de fichier re-liable
///
/// `id`, `playlist_id` et `sort_index` survivent à un re-lien : la position
/// dans la playlist est indépendante du fichier physique sous-jacent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: Uuid,
    pub playlist_id: Uuid,

    /// Position d'affichage, unique dans la playlist
    pub sort_index: u32,

    /// Nom cosmétique, dérivé du nom de fichier à l'ajout
    pub display_name: String,

    /// Durée affichable, si connue
    pub duration_text: Option<String>,

    /// Référence durable (jeton de dossier + nom de fichier)
    pub reference: FileReference,

    /// Indices de repli capturés à l'ajout ou au re-lien
    pub hints: FileHints,

    /// Clé de miniature dans le cache, si la génération a abouti
    pub thumbnail_key: Option<String>,

    /// État d'exécution, recalculé à chaque résolution ; jamais persisté
    #[serde(skip)]
    pub is_missing: bool,
}

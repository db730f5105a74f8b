//! Référence logique vers un fichier et indices de repli

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Référence durable vers un fichier : jeton de dossier + nom de fichier
///
/// Le chemin absolu n'est jamais la source de vérité. Le jeton désigne un
/// dossier enregistré dans le [`FolderRegistry`](crate::FolderRegistry) et
/// reste valide tant que le dossier est atteignable, même si le fichier est
/// déplacé à l'intérieur puis re-lié.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Jeton de capacité du dossier parent
    pub folder_token: String,

    /// Nom du fichier dans ce dossier
    pub file_name: String,
}

/// Indices capturés au moment de l'ajout ou du re-lien
///
/// Purement consultatifs : ils servent de chaîne de repli quand le jeton ne
/// résout plus, jamais de source d'identité.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHints {
    /// Dernier chemin absolu connu
    pub last_known_path: Option<String>,

    /// Taille du fichier en octets au moment de la capture
    pub size_bytes: Option<u64>,

    /// Date de dernière écriture au moment de la capture
    pub last_write_utc: Option<DateTime<Utc>>,
}

/// Résultat d'une tentative de résolution
///
/// Toutes les défaillances (jeton révoqué, dossier déplacé, fichier supprimé)
/// se replient sur `Missing` : aucune erreur ne traverse la résolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Le fichier a été retrouvé à ce chemin
    Found(PathBuf),
    /// Aucune stratégie n'a permis de rouvrir le fichier
    Missing,
}

impl Resolution {
    /// Vrai si aucune stratégie n'a abouti
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolution::Missing)
    }

    /// Chemin résolu, s'il existe
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Resolution::Found(path) => Some(path),
            Resolution::Missing => None,
        }
    }
}

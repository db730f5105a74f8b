//! Rendu des miniatures à partir des fichiers sources

use anyhow::Result;
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage};
use std::path::Path;

/// Taille d'arête par défaut des miniatures générées
pub const DEFAULT_EDGE_PX: u32 = 256;

/// Point d'extension pour la génération d'aperçus
///
/// Le cache demande un rendu à taille cible et dégrade en « pas de
/// miniature » sur toute erreur. L'implémentation par défaut décode le
/// fichier source avec la crate `image` ; une implémentation branchée sur un
/// décodeur vidéo peut être injectée à la place sans toucher au cache.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    /// Produit un aperçu dont la plus grande arête tient dans `edge_px`
    async fn render(&self, source: &Path, edge_px: u32) -> Result<DynamicImage>;
}

/// Rendu par décodage direct du fichier source
///
/// Couvre les sources décodables par la crate `image`. Les formats vidéo ne
/// sont pas pris en charge ici : le décodage échoue et le cache dégrade.
pub struct ImageRenderer;

#[async_trait]
impl ThumbnailRenderer for ImageRenderer {
    async fn render(&self, source: &Path, edge_px: u32) -> Result<DynamicImage> {
        let path = source.to_path_buf();

        // Charger l'image de manière synchrone (image::open n'est pas async)
        let img = tokio::task::spawn_blocking(move || image::open(path)).await??;

        Ok(downscale(&img, edge_px))
    }
}

/// Réduit une image pour que sa plus grande arête tienne dans `edge_px`
///
/// Les images déjà plus petites que la cible sont retournées telles quelles.
pub fn downscale(img: &DynamicImage, edge_px: u32) -> DynamicImage {
    if img.width() <= edge_px && img.height() <= edge_px {
        return img.clone();
    }

    img.resize(edge_px, edge_px, FilterType::Lanczos3)
}

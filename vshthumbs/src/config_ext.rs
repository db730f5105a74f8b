//! Extension de vshconfig pour le cache de miniatures

use crate::cache::ThumbnailCache;
use crate::render::{ImageRenderer, DEFAULT_EDGE_PX};
use anyhow::Result;
use serde_yaml::Value;
use std::sync::Arc;
use vshconfig::Config;

/// Rétention par défaut des miniatures orphelines, en jours
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Trait d'extension pour vshconfig::Config
pub trait ThumbsConfigExt {
    /// Récupère le répertoire du cache de miniatures
    fn get_thumbnail_cache_dir(&self) -> Result<String>;

    /// Récupère la taille d'arête cible des miniatures
    fn get_thumbnail_edge_px(&self) -> u32;

    /// Récupère la fenêtre de rétention du nettoyage, en jours
    fn get_thumbnail_retention_days(&self) -> u32;

    /// Crée une instance de cache configurée avec le renderer par défaut
    fn create_thumbnail_cache(&self) -> Result<Arc<ThumbnailCache>>;
}

impl ThumbsConfigExt for Config {
    fn get_thumbnail_cache_dir(&self) -> Result<String> {
        self.get_managed_dir(&["thumbnails", "directory"], "thumbnails")
    }

    fn get_thumbnail_edge_px(&self) -> u32 {
        match self.get_value(&["thumbnails", "edge_px"]) {
            Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or_default() as u32,
            _ => DEFAULT_EDGE_PX,
        }
    }

    fn get_thumbnail_retention_days(&self) -> u32 {
        match self.get_value(&["thumbnails", "retention_days"]) {
            Ok(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or_default() as u32,
            _ => DEFAULT_RETENTION_DAYS,
        }
    }

    fn create_thumbnail_cache(&self) -> Result<Arc<ThumbnailCache>> {
        let dir = self.get_thumbnail_cache_dir()?;
        let edge_px = self.get_thumbnail_edge_px();
        Ok(Arc::new(ThumbnailCache::with_edge(
            dir,
            edge_px,
            Arc::new(ImageRenderer),
        )?))
    }
}

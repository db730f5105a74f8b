use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, Rgb};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use vshfolders::FolderRegistry;
use vshplaylist::{Error, PlaylistStore, Resolution};
use vshthumbs::{ThumbnailCache, ThumbnailRenderer};

/// Renderer de test : aperçu constant, jamais d'échec
struct StubRenderer;

#[async_trait]
impl ThumbnailRenderer for StubRenderer {
    async fn render(&self, _source: &Path, _edge_px: u32) -> anyhow::Result<DynamicImage> {
        Ok(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            2,
            2,
            Rgb([8, 16, 32]),
        )))
    }
}

fn create_test_store(temp_dir: &TempDir) -> PlaylistStore {
    let data_dir = temp_dir.path().join("data");
    let folders = Arc::new(FolderRegistry::new(&data_dir).unwrap());
    let thumbs = Arc::new(
        ThumbnailCache::new(temp_dir.path().join("thumbs"), Arc::new(StubRenderer)).unwrap(),
    );
    PlaylistStore::new(&data_dir, folders, thumbs).unwrap()
}

fn make_video(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"fake mp4 payload").unwrap();
    path
}

#[tokio::test]
async fn test_create_and_get_all() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);

    let playlist = store.create("Favorites").await.unwrap();
    assert_eq!(playlist.name, "Favorites");
    assert_eq!(playlist.created_utc, playlist.updated_utc);

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, playlist.id);
    assert!(all[0].items.is_empty());
}

#[tokio::test]
async fn test_add_items_assigns_order_and_cover() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let file_a = make_video(&media, "alpha.mp4");
    let file_b = make_video(&media, "beta.mp4");

    let playlist = store.create("Favorites").await.unwrap();
    let added = store
        .add_items(playlist.id, &[file_a, file_b])
        .await
        .unwrap();

    // Positions dans l'ordre d'insertion, noms sans extension
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].sort_index, 0);
    assert_eq!(added[1].sort_index, 1);
    assert_eq!(added[0].display_name, "alpha");
    assert_eq!(added[1].display_name, "beta");

    // Un seul jeton pour le dossier commun
    assert_eq!(
        added[0].reference.folder_token,
        added[1].reference.folder_token
    );

    // Couverture par défaut : la miniature du premier item
    let all = store.get_all().await.unwrap();
    assert!(added[0].thumbnail_key.is_some());
    assert_eq!(all[0].cover_image_key, added[0].thumbnail_key);
}

#[tokio::test]
async fn test_add_items_appends_after_existing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let playlist = store.create("Favorites").await.unwrap();
    store
        .add_items(playlist.id, &[make_video(&media, "first.mp4")])
        .await
        .unwrap();
    let second = store
        .add_items(playlist.id, &[make_video(&media, "second.mp4")])
        .await
        .unwrap();

    // Jamais d'entrelacement : les nouveaux items suivent les existants
    assert_eq!(second[0].sort_index, 1);
}

#[tokio::test]
async fn test_add_items_to_unknown_playlist_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");
    let file = make_video(&media, "alpha.mp4");

    let ghost = uuid::Uuid::new_v4();
    let result = store.add_items(ghost, &[file]).await;

    assert!(matches!(result, Err(Error::PlaylistNotFound(id)) if id == ghost));
}

#[tokio::test]
async fn test_rename_and_silent_not_found() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);

    let playlist = store.create("Old name").await.unwrap();
    store.rename(playlist.id, "New name").await.unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all[0].name, "New name");
    assert!(all[0].updated_utc >= playlist.updated_utc);

    // Renommer une playlist absente est un no-op silencieux
    store.rename(uuid::Uuid::new_v4(), "Ghost").await.unwrap();
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);

    let playlist = store.create("Favorites").await.unwrap();
    store.delete(playlist.id).await.unwrap();
    assert!(store.get_all().await.unwrap().is_empty());

    // « Déjà supprimée » et « n'a jamais existé » sont indistinguables
    store.delete(playlist.id).await.unwrap();
    store.delete(uuid::Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn test_remove_item_silent_not_found() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let playlist = store.create("Favorites").await.unwrap();
    let added = store
        .add_items(playlist.id, &[make_video(&media, "alpha.mp4")])
        .await
        .unwrap();

    store.remove_item(playlist.id, added[0].id).await.unwrap();
    assert!(store.get_all().await.unwrap()[0].items.is_empty());

    store.remove_item(playlist.id, added[0].id).await.unwrap();
    store
        .remove_item(uuid::Uuid::new_v4(), added[0].id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reorder_full_sequence() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let playlist = store.create("Favorites").await.unwrap();
    let added = store
        .add_items(
            playlist.id,
            &[make_video(&media, "alpha.mp4"), make_video(&media, "beta.mp4")],
        )
        .await
        .unwrap();

    store
        .reorder(playlist.id, &[added[1].id, added[0].id])
        .await
        .unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all[0].items[0].id, added[1].id);
    assert_eq!(all[0].items[0].sort_index, 0);
    assert_eq!(all[0].items[1].id, added[0].id);
    assert_eq!(all[0].items[1].sort_index, 1);
}

#[tokio::test]
async fn test_reorder_partial_sequence_keeps_old_indices() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let playlist = store.create("Favorites").await.unwrap();
    let added = store
        .add_items(
            playlist.id,
            &[
                make_video(&media, "alpha.mp4"),
                make_video(&media, "beta.mp4"),
                make_video(&media, "gamma.mp4"),
            ],
        )
        .await
        .unwrap();

    // Séquence incomplète : acceptée, les absents gardent leur index
    store.reorder(playlist.id, &[added[1].id]).await.unwrap();

    let all = store.get_all().await.unwrap();
    let find = |id| all[0].items.iter().find(|i| i.id == id).unwrap().sort_index;
    assert_eq!(find(added[1].id), 0);
    assert_eq!(find(added[2].id), 2);
}

#[tokio::test]
async fn test_reorder_unknown_playlist_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);

    let result = store.reorder(uuid::Uuid::new_v4(), &[]).await;
    assert!(matches!(result, Err(Error::PlaylistNotFound(_))));
}

#[tokio::test]
async fn test_update_cover_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);

    let playlist = store.create("Favorites").await.unwrap();
    store
        .update_cover_image(playlist.id, Some("custom_abc".to_string()))
        .await
        .unwrap();
    assert_eq!(
        store.get_all().await.unwrap()[0].cover_image_key.as_deref(),
        Some("custom_abc")
    );

    store.update_cover_image(playlist.id, None).await.unwrap();
    assert!(store.get_all().await.unwrap()[0].cover_image_key.is_none());

    // Playlist absente : no-op silencieux
    store
        .update_cover_image(uuid::Uuid::new_v4(), Some("custom_x".to_string()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_item_preserves_identity() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let playlist = store.create("Favorites").await.unwrap();
    let added = store
        .add_items(playlist.id, &[make_video(&media, "alpha.mp4")])
        .await
        .unwrap();

    let mut updated = added[0].clone();
    updated.display_name = "Renamed by hand".to_string();
    updated.duration_text = Some("1:23:45".to_string());
    updated.sort_index = 99; // ne doit PAS être repris

    store.update_item(playlist.id, &updated).await.unwrap();

    let all = store.get_all().await.unwrap();
    let stored = &all[0].items[0];
    assert_eq!(stored.display_name, "Renamed by hand");
    assert_eq!(stored.duration_text.as_deref(), Some("1:23:45"));
    assert_eq!(stored.sort_index, 0);
    assert_eq!(stored.id, added[0].id);
}

#[tokio::test]
async fn test_roundtrip_through_reload() {
    let temp_dir = tempfile::tempdir().unwrap();
    let media = temp_dir.path().join("media");

    let (playlist_id, item_ids) = {
        let store = create_test_store(&temp_dir);
        let playlist = store.create("Favorites").await.unwrap();
        let added = store
            .add_items(
                playlist.id,
                &[make_video(&media, "alpha.mp4"), make_video(&media, "beta.mp4")],
            )
            .await
            .unwrap();
        store
            .reorder(playlist.id, &[added[1].id, added[0].id])
            .await
            .unwrap();
        store.rename(playlist.id, "Keepers").await.unwrap();
        (playlist.id, vec![added[0].id, added[1].id])
    };

    // Une instance fraîche relit exactement la même collection observable
    let store = create_test_store(&temp_dir);
    let all = store.get_all().await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, playlist_id);
    assert_eq!(all[0].name, "Keepers");
    assert_eq!(all[0].items.len(), 2);
    assert_eq!(all[0].items[0].id, item_ids[1]);
    assert_eq!(all[0].items[1].id, item_ids[0]);
    assert_eq!(all[0].items[0].reference.file_name, "beta.mp4");
    assert!(all[0].items[0].hints.last_known_path.is_some());
    assert!(all[0].items[0].hints.size_bytes.is_some());
}

#[tokio::test]
async fn test_resolution_fallback_and_missing_then_relink() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let file = make_video(&media, "alpha.mp4");
    let playlist = store.create("Favorites").await.unwrap();
    let added = store.add_items(playlist.id, &[file.clone()]).await.unwrap();
    let mut item = added[0].clone();

    // Résolution nominale via le jeton
    assert!(!store.try_resolve(&mut item).await.is_missing());
    assert!(!item.is_missing);

    // Jeton révoqué mais fichier présent : le repli par chemin suffit
    store
        .folders()
        .revoke_token(&item.reference.folder_token)
        .await
        .unwrap();
    assert!(!store.try_resolve(&mut item).await.is_missing());
    assert!(!item.is_missing);

    // Fichier supprimé : état terminal manquant
    std::fs::remove_file(&file).unwrap();
    assert_eq!(store.try_resolve(&mut item).await, Resolution::Missing);
    assert!(item.is_missing);

    // Re-lien vers un nouveau fichier : même identité, même position
    let replacement = make_video(&temp_dir.path().join("backup"), "alpha-restored.mp4");
    let relinked = store
        .relink_item(playlist.id, item.id, &replacement)
        .await
        .unwrap();

    assert_eq!(relinked.id, item.id);
    assert_eq!(relinked.sort_index, item.sort_index);
    assert_eq!(relinked.display_name, "alpha-restored");
    assert!(!relinked.is_missing);

    let mut relinked = relinked;
    match store.try_resolve(&mut relinked).await {
        Resolution::Found(path) => {
            assert_eq!(path, std::fs::canonicalize(&replacement).unwrap())
        }
        Resolution::Missing => panic!("re-linked item should resolve"),
    }
}

#[tokio::test]
async fn test_relink_unknown_item_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");
    let file = make_video(&media, "alpha.mp4");

    let playlist = store.create("Favorites").await.unwrap();
    let result = store
        .relink_item(playlist.id, uuid::Uuid::new_v4(), &file)
        .await;

    assert!(matches!(result, Err(Error::ItemNotFound(_))));
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store_a = create_test_store(&temp_dir);
    let store_b = create_test_store(&temp_dir);

    store_a.create("First").await.unwrap();
    assert_eq!(store_b.get_all().await.unwrap().len(), 1);

    // store_b garde son graphe en mémoire tant qu'on ne l'invalide pas
    store_a.create("Second").await.unwrap();
    assert_eq!(store_b.get_all().await.unwrap().len(), 1);

    store_b.invalidate().await;
    assert_eq!(store_b.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_referenced_thumbnail_keys() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = create_test_store(&temp_dir);
    let media = temp_dir.path().join("media");

    let playlist = store.create("Favorites").await.unwrap();
    let added = store
        .add_items(playlist.id, &[make_video(&media, "alpha.mp4")])
        .await
        .unwrap();
    store
        .update_cover_image(playlist.id, Some("custom_cover".to_string()))
        .await
        .unwrap();

    let keys = store.referenced_thumbnail_keys().await.unwrap();
    assert!(keys.contains(added[0].thumbnail_key.as_deref().unwrap()));
    assert!(keys.contains("custom_cover"));
}

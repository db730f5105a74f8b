use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vshfolders::{FolderRegistry, Resolution};

fn create_test_registry() -> (TempDir, FolderRegistry) {
    let temp_dir = tempfile::tempdir().unwrap();
    let registry = FolderRegistry::new(temp_dir.path().join("data")).unwrap();
    (temp_dir, registry)
}

fn make_file(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"video bytes").unwrap();
    path
}

#[tokio::test]
async fn test_token_reuse_within_folder() {
    let (temp_dir, registry) = create_test_registry();
    let media = temp_dir.path().join("media");

    let file_a = make_file(&media, "a.mp4");
    let file_b = make_file(&media, "b.mp4");

    let (ref_a, _) = registry.capture(&file_a).await.unwrap();
    let (ref_b, _) = registry.capture(&file_b).await.unwrap();

    // Deux fichiers du même dossier partagent un seul jeton
    assert_eq!(ref_a.folder_token, ref_b.folder_token);
    assert!(ref_a.folder_token.starts_with("PlaylistFolder_"));
    assert_eq!(ref_a.file_name, "a.mp4");
    assert_eq!(ref_b.file_name, "b.mp4");
}

#[tokio::test]
async fn test_distinct_folders_distinct_tokens() {
    let (temp_dir, registry) = create_test_registry();

    let file_a = make_file(&temp_dir.path().join("films"), "a.mp4");
    let file_b = make_file(&temp_dir.path().join("series"), "b.mp4");

    let (ref_a, _) = registry.capture(&file_a).await.unwrap();
    let (ref_b, _) = registry.capture(&file_b).await.unwrap();

    assert_ne!(ref_a.folder_token, ref_b.folder_token);
}

#[tokio::test]
async fn test_token_reuse_across_path_spellings() {
    let (temp_dir, registry) = create_test_registry();
    let media = temp_dir.path().join("media");
    make_file(&media, "a.mp4");

    let token1 = registry.get_or_create_token(&media).await.unwrap();

    // Même dossier désigné par un chemin non normalisé
    let detour = temp_dir.path().join("media").join("..").join("media");
    let token2 = registry.get_or_create_token(&detour).await.unwrap();

    assert_eq!(token1, token2);
}

#[tokio::test]
async fn test_token_for_missing_folder_is_an_error() {
    let (temp_dir, registry) = create_test_registry();
    let ghost = temp_dir.path().join("nowhere");

    assert!(registry.get_or_create_token(&ghost).await.is_err());
}

#[tokio::test]
async fn test_capture_records_hints() {
    let (temp_dir, registry) = create_test_registry();
    let file = make_file(&temp_dir.path().join("media"), "a.mp4");

    let (_, hints) = registry.capture(&file).await.unwrap();

    let canonical = std::fs::canonicalize(&file).unwrap();
    assert_eq!(
        hints.last_known_path.as_deref(),
        Some(canonical.to_string_lossy().as_ref())
    );
    assert_eq!(hints.size_bytes, Some(11)); // "video bytes"
    assert!(hints.last_write_utc.is_some());
}

#[tokio::test]
async fn test_resolution_via_token() {
    let (temp_dir, registry) = create_test_registry();
    let file = make_file(&temp_dir.path().join("media"), "a.mp4");

    let (reference, hints) = registry.capture(&file).await.unwrap();
    let resolution = registry.try_resolve(&reference, &hints).await;

    let canonical = std::fs::canonicalize(&file).unwrap();
    assert_eq!(resolution, Resolution::Found(canonical));
    assert!(!resolution.is_missing());
}

#[tokio::test]
async fn test_resolution_falls_back_to_hint_path() {
    let (temp_dir, registry) = create_test_registry();
    let file = make_file(&temp_dir.path().join("media"), "a.mp4");

    let (reference, hints) = registry.capture(&file).await.unwrap();

    // Jeton révoqué, mais le fichier existe toujours au chemin mémorisé
    registry.revoke_token(&reference.folder_token).await.unwrap();

    let resolution = registry.try_resolve(&reference, &hints).await;
    assert!(!resolution.is_missing());
    assert_eq!(
        resolution.path().unwrap(),
        &std::fs::canonicalize(&file).unwrap()
    );
}

#[tokio::test]
async fn test_missing_when_every_strategy_fails() {
    let (temp_dir, registry) = create_test_registry();
    let file = make_file(&temp_dir.path().join("media"), "a.mp4");

    let (reference, hints) = registry.capture(&file).await.unwrap();

    registry.revoke_token(&reference.folder_token).await.unwrap();
    std::fs::remove_file(&file).unwrap();

    let resolution = registry.try_resolve(&reference, &hints).await;
    assert_eq!(resolution, Resolution::Missing);
}

#[tokio::test]
async fn test_missing_when_file_leaves_folder() {
    let (temp_dir, registry) = create_test_registry();
    let media = temp_dir.path().join("media");
    let file = make_file(&media, "a.mp4");

    let (reference, hints) = registry.capture(&file).await.unwrap();

    // Le jeton reste valide mais le fichier n'est plus dans le dossier
    std::fs::rename(&file, media.join("renamed.mp4")).unwrap();

    let resolution = registry.try_resolve(&reference, &hints).await;
    assert_eq!(resolution, Resolution::Missing);
}

#[tokio::test]
async fn test_registry_persistence_roundtrip() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path().join("data");
    let media = temp_dir.path().join("media");
    let file = make_file(&media, "a.mp4");

    let token = {
        let registry = FolderRegistry::new(&data_dir).unwrap();
        let (reference, _) = registry.capture(&file).await.unwrap();
        reference.folder_token
    };

    // Une nouvelle instance relit la table depuis le disque
    let registry = FolderRegistry::new(&data_dir).unwrap();
    let folder = registry.resolve_token(&token).await.unwrap();
    assert_eq!(folder, std::fs::canonicalize(&media).unwrap());

    // Et réutilise le jeton existant plutôt que d'en émettre un nouveau
    let again = registry.get_or_create_token(&media).await.unwrap();
    assert_eq!(again, token);
}

#[tokio::test]
async fn test_corrupt_table_is_quarantined() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("folder_tokens.json"), b"{ not json").unwrap();

    let media = temp_dir.path().join("media");
    make_file(&media, "a.mp4");

    let registry = FolderRegistry::new(&data_dir).unwrap();
    let token = registry.get_or_create_token(&media).await.unwrap();
    assert!(token.starts_with("PlaylistFolder_"));

    // Le fichier fautif a été conservé sous un nom de quarantaine
    let quarantined = std::fs::read_dir(&data_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with("folder_tokens.bad.") && name.ends_with(".json")
        });
    assert!(quarantined);
}

#[tokio::test]
async fn test_revoke_unknown_token_is_silent() {
    let (_temp_dir, registry) = create_test_registry();
    registry.revoke_token("PlaylistFolder_unknown").await.unwrap();
}

#[tokio::test]
async fn test_resolve_unknown_token_is_none() {
    let (_temp_dir, registry) = create_test_registry();
    assert!(registry.resolve_token("PlaylistFolder_unknown").await.is_none());
}

use std::fs;

use topmarks_core::geometry::GeoPoint;
use topmarks_core::model::{Folder, FolderTree, Layer};
use topmarks_io::{FileStore, FolderRepository, KeyValueStore, STORAGE_KEY};

fn sample_tree() -> FolderTree {
    FolderTree::with_default()
        .add_folder(Folder::with_id("f1", "Dive Sites"))
        .add_layer(
            "f1",
            Layer::with_id(
                "l1",
                "Bay",
                vec![
                    GeoPoint::new("Reef Marker", -38.10205, 144.8076),
                    GeoPoint::new("Pier Head", -38.15, 144.366_65),
                ],
            ),
        )
}

#[test]
fn file_store_round_trips_tree() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut repo = FolderRepository::new(FileStore::new(dir.path().join("data")));
    let tree = sample_tree();
    repo.save(&tree).expect("save tree");

    let stored = dir.path().join("data").join(format!("{STORAGE_KEY}.json"));
    assert!(stored.exists());
    assert!(!stored.with_extension("json.tmp").exists());

    let reopened = FolderRepository::new(FileStore::new(dir.path().join("data")));
    let outcome = reopened.load();
    assert!(!outcome.was_corrupted);
    assert_eq!(outcome.folders, tree);
}

#[test]
fn corrupted_file_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join(format!("{STORAGE_KEY}.json")), "{not json").unwrap();

    let outcome = FolderRepository::new(FileStore::new(dir.path())).load();
    assert!(outcome.was_corrupted);
    assert_eq!(outcome.folders, FolderTree::with_default());
}

#[test]
fn old_shaped_folders_without_layers_still_load() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let blob = serde_json::json!([{ "id": "legacy", "name": "Legacy" }]).to_string();
    let mut store = FileStore::new(dir.path());
    store.set(STORAGE_KEY, &blob).unwrap();

    let outcome = FolderRepository::new(store).load();
    assert!(!outcome.was_corrupted);
    assert_eq!(outcome.folders.folder_ids().collect::<Vec<_>>(), vec!["legacy"]);
    assert!(outcome.folders.folders()[0].layers.is_empty());
}

#[test]
fn missing_directory_reads_as_absent() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = FileStore::new(dir.path().join("nope"));
    assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
}

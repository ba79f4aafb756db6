use camino::Utf8PathBuf;

use offline_dict::store::{FileStore, KeyValueStore, MemoryStore};

#[test]
fn file_store_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("nested").join("data")).unwrap();
    let store = FileStore::new(root.clone());

    assert_eq!(store.get("searchHistory").unwrap(), None);

    store.set("searchHistory", "[]").unwrap();
    store.set("searchHistory", r#"[{"word":"bank"}]"#).unwrap();
    assert_eq!(
        store.get("searchHistory").unwrap().as_deref(),
        Some(r#"[{"word":"bank"}]"#)
    );
    assert!(root.join("searchHistory.json").as_std_path().exists());

    store.remove("searchHistory").unwrap();
    store.remove("searchHistory").unwrap();
    assert_eq!(store.get("searchHistory").unwrap(), None);
}

#[test]
fn file_store_leaves_no_temp_files() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let store = FileStore::new(root);

    for i in 0..5 {
        store.set("searchHistory", &i.to_string()).unwrap();
    }

    let names: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["searchHistory.json".to_string()]);
}

#[test]
fn memory_store_round_trip() {
    let store = MemoryStore::new();
    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}

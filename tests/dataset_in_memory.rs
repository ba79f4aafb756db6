mod support;

use offline_dict::dataset::DatasetStore;
use offline_dict::domain::NormalizedWord;

use support::sample_dataset;

// Kept in its own test binary: it points TMPDIR somewhere unusable for the
// whole process.
#[test]
fn open_never_touches_the_temp_dir() {
    let bytes = sample_dataset();
    unsafe {
        std::env::set_var("TMPDIR", "/nonexistent/offline-dict-tmp");
    }

    let store = DatasetStore::open(&bytes).unwrap();
    let word: NormalizedWord = "bank".parse().unwrap();
    assert_eq!(store.query(&word).unwrap().len(), 1);
    assert_eq!(store.size(), bytes.len());
    store.close().unwrap();
}

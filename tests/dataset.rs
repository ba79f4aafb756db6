mod support;

use assert_matches::assert_matches;
use rusqlite::Connection;

use offline_dict::dataset::DatasetStore;
use offline_dict::domain::NormalizedWord;
use offline_dict::error::DictError;

use support::{build_dataset, sample_dataset};

fn word(value: &str) -> NormalizedWord {
    value.parse().unwrap()
}

#[test]
fn bank_round_trip() {
    let bytes = build_dataset(&[("bank", "n", "a financial institution")]);
    let store = DatasetStore::open(&bytes).unwrap();

    let rows = store.query(&word("Bank")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].word, "bank");
    assert_eq!(rows[0].part_of_speech, "n");
    assert_eq!(rows[0].gloss, "a financial institution");
}

#[test]
fn senses_come_back_in_storage_order() {
    let store = DatasetStore::open(&sample_dataset()).unwrap();

    let rows = store.query(&word("run")).unwrap();
    let glosses: Vec<_> = rows.iter().map(|row| row.gloss.as_str()).collect();
    assert_eq!(
        glosses,
        vec!["move fast by using one's feet", "a score in baseball"]
    );
}

#[test]
fn stored_capitalisation_still_matches() {
    let store = DatasetStore::open(&sample_dataset()).unwrap();

    let rows = store.query(&word("cat")).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].word, "cat");
    assert_eq!(rows[1].word, "Cat");
}

#[test]
fn non_ascii_words_fold_like_the_query() {
    let store = DatasetStore::open(&sample_dataset()).unwrap();

    for input in ["élan", "Élan", "ÉLAN"] {
        let rows = store.query(&word(input)).unwrap();
        assert_eq!(rows.len(), 1, "input {input}");
        assert_eq!(rows[0].word, "Élan");
    }
}

#[test]
fn missing_word_is_empty_not_error() {
    let store = DatasetStore::open(&sample_dataset()).unwrap();
    let rows = store.query(&word("zyzzyva")).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn query_text_is_bound_not_spliced() {
    let store = DatasetStore::open(&sample_dataset()).unwrap();
    let rows = store.query(&word("x' OR '1'='1")).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn repeated_queries_reuse_one_handle() {
    let store = DatasetStore::open(&sample_dataset()).unwrap();
    for _ in 0..100 {
        assert_eq!(store.query(&word("bank")).unwrap().len(), 1);
    }
    assert_eq!(store.row_count().unwrap(), 6);
    store.close().unwrap();
}

#[test]
fn garbage_bytes_are_corrupt() {
    let bytes = vec![0xABu8; 4096];
    let err = DatasetStore::open(&bytes).err().unwrap();
    assert_matches!(err, DictError::DatasetCorrupt(_));
    assert!(err.is_load_failure());
}

#[test]
fn empty_buffer_is_corrupt() {
    let err = DatasetStore::open(&[]).err().unwrap();
    assert_matches!(err, DictError::DatasetCorrupt(_));
}

#[test]
fn database_without_words_table_is_corrupt() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("other.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE lemmas (lemma TEXT);").unwrap();
    }
    let bytes = std::fs::read(&path).unwrap();

    let err = DatasetStore::open(&bytes).err().unwrap();
    assert_matches!(err, DictError::DatasetCorrupt(_));
}

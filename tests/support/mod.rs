#![allow(dead_code)]

use rusqlite::{Connection, params};

/// Runs `setup` against a fresh on-disk database and returns the file's bytes.
pub fn build_image(setup: impl FnOnce(&Connection)) -> Vec<u8> {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("wordnet.db");
    {
        let conn = Connection::open(&path).unwrap();
        setup(&conn);
    }
    std::fs::read(&path).unwrap()
}

/// Builds an SQLite image with the same `words` schema the dictionary ships
/// with and returns its raw bytes.
pub fn build_dataset(rows: &[(&str, &str, &str)]) -> Vec<u8> {
    build_image(|conn| {
        conn.execute_batch(
            "CREATE TABLE words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL,
                pos TEXT NOT NULL,
                definition TEXT NOT NULL,
                UNIQUE(word, pos, definition)
            );",
        )
        .unwrap();
        for (word, pos, definition) in rows {
            conn.execute(
                "INSERT OR IGNORE INTO words (word, pos, definition) VALUES (?1, ?2, ?3)",
                params![word, pos, definition],
            )
            .unwrap();
        }
    })
}

pub fn sample_dataset() -> Vec<u8> {
    build_dataset(&[
        ("bank", "n", "a financial institution"),
        ("run", "v", "move fast by using one's feet"),
        ("cat", "n", "feline mammal usually having thick soft fur"),
        ("run", "n", "a score in baseball"),
        ("Cat", "n", "a whip with nine knotted cords"),
        ("Élan", "n", "distinctive and stylish elegance"),
    ])
}

use std::ptr::{self, NonNull};

use rusqlite::functions::FunctionFlags;
use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName, ffi, named_params};

use crate::domain::{DefinitionRow, NormalizedWord, fold_case};
use crate::error::DictError;

const LOOKUP_SQL: &str = "SELECT word, pos, definition FROM words \
                          WHERE fold_case(word) = :word ORDER BY rowid";
const COUNT_SQL: &str = "SELECT count(*) FROM words";

/// In-memory dictionary database built from a downloaded SQLite image.
/// Read-only for its whole lifetime; dropped (or `close`d) with the session.
pub struct DatasetStore {
    conn: Connection,
    size: usize,
}

impl DatasetStore {
    pub fn open(bytes: &[u8]) -> Result<Self, DictError> {
        let mut conn =
            Connection::open_in_memory().map_err(|err| DictError::DatasetCorrupt(err.to_string()))?;
        load_image(&mut conn, bytes)?;
        register_fold_case(&conn).map_err(|err| DictError::DatasetCorrupt(err.to_string()))?;

        // Probe the lookup statement so a foreign schema fails here and not on first search.
        conn.prepare(LOOKUP_SQL)
            .map_err(|err| DictError::DatasetCorrupt(err.to_string()))?;

        tracing::info!(bytes = bytes.len(), "dataset opened");
        Ok(Self {
            conn,
            size: bytes.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row_count(&self) -> Result<u64, DictError> {
        let count: i64 = self
            .conn
            .query_row(COUNT_SQL, [], |row| row.get(0))
            .map_err(|err| DictError::QueryFailed(err.to_string()))?;
        Ok(count.max(0) as u64)
    }

    /// Exact, case-insensitive match on `word`, in storage order.
    pub fn query(&self, word: &NormalizedWord) -> Result<Vec<DefinitionRow>, DictError> {
        let mut stmt = self
            .conn
            .prepare(LOOKUP_SQL)
            .map_err(|err| DictError::QueryFailed(err.to_string()))?;
        let rows = stmt
            .query_map(named_params! { ":word": word.as_str() }, |row| {
                Ok(DefinitionRow {
                    word: row.get(0)?,
                    part_of_speech: row.get(1)?,
                    gloss: row.get(2)?,
                })
            })
            .map_err(|err| DictError::QueryFailed(err.to_string()))?;
        let rows = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| DictError::QueryFailed(err.to_string()))?;
        tracing::debug!(word = %word, hits = rows.len(), "lookup");
        Ok(rows)
    }

    pub fn close(self) -> Result<(), DictError> {
        self.conn
            .close()
            .map_err(|(_, err)| DictError::QueryFailed(err.to_string()))
    }
}

/// Hands SQLite its own copy of the image and attaches it read-only as
/// `main`. Nothing touches the filesystem.
fn load_image(conn: &mut Connection, bytes: &[u8]) -> Result<(), DictError> {
    if bytes.is_empty() {
        return Err(DictError::DatasetCorrupt("empty dataset image".to_string()));
    }
    let image = sqlite_copy(bytes)?;
    conn.deserialize(DatabaseName::Main, image, true)
        .map_err(|err| DictError::DatasetCorrupt(err.to_string()))
}

fn sqlite_copy(bytes: &[u8]) -> Result<OwnedData, DictError> {
    // SAFETY: the buffer comes from sqlite3_malloc64, is at least `bytes.len()`
    // long, and ownership passes to OwnedData, which frees it with sqlite3_free.
    unsafe {
        let raw = ffi::sqlite3_malloc64(bytes.len() as ffi::sqlite3_uint64).cast::<u8>();
        let raw = NonNull::new(raw).ok_or_else(|| {
            DictError::DatasetCorrupt(format!("cannot allocate {} bytes", bytes.len()))
        })?;
        ptr::copy_nonoverlapping(bytes.as_ptr(), raw.as_ptr(), bytes.len());
        Ok(OwnedData::from_raw_nonnull(raw, bytes.len()))
    }
}

fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|value| fold_case(&value)))
        },
    )
}

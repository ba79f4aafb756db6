use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DictError;

/// One dictionary sense as stored in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRow {
    pub word: String,
    #[serde(rename = "pos")]
    pub part_of_speech: String,
    pub gloss: String,
}

/// Trimmed, lower-cased query text. Used both as the lookup key and as the
/// history dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedWord(String);

impl NormalizedWord {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NormalizedWord {
    type Err = DictError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = fold_case(value.trim());
        if normalized.is_empty() {
            return Err(DictError::BlankQuery);
        }
        Ok(Self(normalized))
    }
}

/// Case folding shared by the query key and the SQL `fold_case` function.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// One past search. `timestamp` round-trips as RFC 3339 with millisecond
/// precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub word: String,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(word: NormalizedWord, timestamp: DateTime<Utc>) -> Self {
        Self {
            word: word.into_string(),
            timestamp,
        }
    }
}

/// Progress of a dataset download. `bytes_total == 0` means the server did
/// not advertise a length.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TransferState {
    pub bytes_loaded: u64,
    pub bytes_total: u64,
    pub percent: f64,
}

impl TransferState {
    pub fn new(bytes_total: Option<u64>) -> Self {
        Self {
            bytes_loaded: 0,
            bytes_total: bytes_total.unwrap_or(0),
            percent: 0.0,
        }
    }

    pub fn total_known(&self) -> bool {
        self.bytes_total > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub rows: Vec<DefinitionRow>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

mod timestamp_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

pub fn iso_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

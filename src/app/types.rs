// src/app/types.rs
use serde_json::Value;

use super::data::{coerce_text, FieldMap, PLOT, POSTER_URL};

/// Opaque handle to a record held by a `Catalog`. Survives index shifts;
/// dead once the record is deleted or replaced by a load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHandle(pub(crate) u64);

/// Identifies one background metadata lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(pub(crate) u64);

/// Partial update produced by a metadata lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    pub poster_url: Option<String>,
    pub plot: Option<String>,
}

impl MetadataPatch {
    pub fn from_mapping(data: &FieldMap) -> Self {
        Self {
            poster_url: data.get(POSTER_URL).map(coerce_text),
            plot: data.get(PLOT).map(coerce_text),
        }
    }

    pub fn to_mapping(&self) -> FieldMap {
        let mut map = FieldMap::new();
        if let Some(url) = &self.poster_url {
            map.insert(POSTER_URL.into(), Value::from(url.clone()));
        }
        if let Some(plot) = &self.plot {
            map.insert(PLOT.into(), Value::from(plot.clone()));
        }
        map
    }
}

// ---- fetch results ----
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    Fetched(MetadataPatch),
    Unavailable(Unavailable),
}

impl FetchOutcome {
    pub fn patch(&self) -> Option<&MetadataPatch> {
        match self {
            Self::Fetched(p) => Some(p),
            Self::Unavailable(_) => None,
        }
    }
}

/// Why a lookup produced nothing. None of these are errors for the caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Unavailable {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("empty title")]
    EmptyTitle,
    #[error("provider answered HTTP {0}")]
    HttpStatus(u16),
    #[error("request timed out")]
    Timeout,
    #[error("network failure: {0}")]
    Network(String),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("worker stopped before reporting")]
    WorkerLost,
}

// ---- cross-thread messages ----
#[derive(Debug)]
pub enum FetchMsg {
    Done {
        id: FetchId,
        handle: RecordHandle,
        outcome: FetchOutcome,
    },
    /// Always sent last by a fetch worker, even if it panicked.
    Finished { id: FetchId },
}

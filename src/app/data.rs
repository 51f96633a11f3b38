use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loose key-value input as produced by forms and JSON files.
pub type FieldMap = serde_json::Map<String, Value>;

pub const TITLE: &str = "title";
pub const CREATOR: &str = "creator";
pub const YEAR: &str = "year";
pub const RATING: &str = "rating";
pub const POSTER_URL: &str = "poster_url";
pub const PLOT: &str = "plot";

/// One catalog entry (a film or a book).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub title: String,
    pub creator: String,
    pub year: i32,
    pub rating: f64,
    pub poster_url: String,
    pub plot: String,
}

impl Record {
    /// Build a record from a partial mapping. Absent or unusable values take
    /// the field default, so this never fails.
    pub fn from_mapping(data: &FieldMap) -> Self {
        Self {
            title: data.get(TITLE).map(coerce_text).unwrap_or_default(),
            creator: data.get(CREATOR).map(coerce_text).unwrap_or_default(),
            year: data.get(YEAR).and_then(coerce_year).unwrap_or(0),
            rating: data.get(RATING).and_then(coerce_rating).unwrap_or(0.0),
            poster_url: data.get(POSTER_URL).map(coerce_text).unwrap_or_default(),
            plot: data.get(PLOT).map(coerce_text).unwrap_or_default(),
        }
    }

    pub fn to_mapping(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(TITLE.into(), Value::from(self.title.clone()));
        map.insert(CREATOR.into(), Value::from(self.creator.clone()));
        map.insert(YEAR.into(), Value::from(self.year));
        map.insert(RATING.into(), Value::from(self.rating));
        map.insert(POSTER_URL.into(), Value::from(self.poster_url.clone()));
        map.insert(PLOT.into(), Value::from(self.plot.clone()));
        map
    }

    /// The four columns shown in the library table.
    pub fn table_cells(&self) -> [String; 4] {
        [
            self.title.clone(),
            self.creator.clone(),
            self.year.to_string(),
            format_rating(self.rating),
        ]
    }
}

/// `8.5` -> "8.5", `7.0` -> "7.0" (whole ratings keep their decimal).
pub fn format_rating(rating: f64) -> String {
    format!("{rating:?}")
}

pub(crate) fn coerce_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn coerce_year(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

pub(crate) fn coerce_rating(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

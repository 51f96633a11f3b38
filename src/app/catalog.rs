// src/app/catalog.rs
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::data::{
    coerce_rating, coerce_text, coerce_year, FieldMap, Record, CREATOR, PLOT, POSTER_URL, RATING,
    TITLE, YEAR,
};
use super::repository::JsonRepository;
use super::types::{MetadataPatch, RecordHandle};
use crate::error::{LibraryError, Result};

/// Receives every change to the catalog's list, in order, as it happens.
/// Implementors are projections; the catalog stays the source of truth.
pub trait CatalogView {
    fn on_inserted(&mut self, index: usize, record: &Record);
    fn on_updated(&mut self, index: usize, record: &Record);
    fn on_removed(&mut self, index: usize);
    fn on_cleared(&mut self);
}

/// A view that ignores everything (headless use).
impl CatalogView for () {
    fn on_inserted(&mut self, _index: usize, _record: &Record) {}
    fn on_updated(&mut self, _index: usize, _record: &Record) {}
    fn on_removed(&mut self, _index: usize) {}
    fn on_cleared(&mut self) {}
}

/// Owns the ordered record list and keeps the bound view in lockstep with it.
pub struct Catalog<V: CatalogView> {
    records: Vec<Record>,
    // parallel to `records`
    handles: Vec<RecordHandle>,
    next_handle: u64,
    view: V,
    repo: JsonRepository,
}

impl<V: CatalogView> Catalog<V> {
    pub fn new(view: V, repo: JsonRepository) -> Self {
        Self {
            records: Vec::new(),
            handles: Vec::new(),
            next_handle: 1,
            view,
            repo,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn repository(&self) -> &JsonRepository {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut JsonRepository {
        &mut self.repo
    }

    fn mint_handle(&mut self) -> RecordHandle {
        let h = RecordHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    // ---- mutations ----

    pub fn add(&mut self, data: &FieldMap) -> RecordHandle {
        let record = Record::from_mapping(data);
        let handle = self.mint_handle();
        let index = self.records.len();
        self.records.push(record);
        self.handles.push(handle);
        self.view.on_inserted(index, &self.records[index]);
        debug!("added record #{index} ({:?})", self.records[index].title);
        handle
    }

    /// Partial update of the record at `index`. Returns false (and changes
    /// nothing) when `index` is out of bounds.
    pub fn edit(&mut self, index: usize, data: &FieldMap) -> bool {
        let Some(record) = self.records.get_mut(index) else {
            debug!("edit ignored: index {index} out of range");
            return false;
        };

        if let Some(v) = data.get(TITLE) {
            record.title = coerce_text(v);
        }
        if let Some(v) = data.get(CREATOR) {
            record.creator = coerce_text(v);
        }
        if let Some(v) = data.get(YEAR) {
            match coerce_year(v) {
                Some(year) => record.year = year,
                None => warn!("edit #{index}: ignoring non-numeric year {v}"),
            }
        }
        if let Some(v) = data.get(RATING) {
            match coerce_rating(v) {
                Some(rating) => record.rating = rating,
                None => warn!("edit #{index}: ignoring non-numeric rating {v}"),
            }
        }
        if let Some(v) = data.get(POSTER_URL) {
            record.poster_url = coerce_text(v);
        }
        if let Some(v) = data.get(PLOT) {
            record.plot = coerce_text(v);
        }

        self.view.on_updated(index, &self.records[index]);
        true
    }

    /// Remove the record at `index`; later records shift down by one.
    /// Returns false when `index` is out of bounds.
    pub fn delete(&mut self, index: usize) -> bool {
        if index >= self.records.len() {
            debug!("delete ignored: index {index} out of range");
            return false;
        }
        let removed = self.records.remove(index);
        self.handles.remove(index);
        self.view.on_removed(index);
        debug!("deleted record #{index} ({:?})", removed.title);
        true
    }

    pub fn get(&self, index: usize) -> Result<&Record> {
        self.records.get(index).ok_or(LibraryError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub fn handle_at(&self, index: usize) -> Option<RecordHandle> {
        self.handles.get(index).copied()
    }

    pub fn index_of(&self, handle: RecordHandle) -> Option<usize> {
        self.handles.iter().position(|h| *h == handle)
    }

    pub fn by_handle(&self, handle: RecordHandle) -> Option<&Record> {
        self.index_of(handle).map(|i| &self.records[i])
    }

    /// Overwrite poster/plot on the record behind `handle`. The table does not
    /// show these fields, so the view is not notified. Returns false when the
    /// record no longer exists.
    pub fn apply_metadata_patch(&mut self, handle: RecordHandle, patch: &MetadataPatch) -> bool {
        let Some(index) = self.index_of(handle) else {
            debug!("metadata patch dropped: record {handle:?} is gone");
            return false;
        };
        let record = &mut self.records[index];
        if let Some(url) = &patch.poster_url {
            record.poster_url = url.clone();
        }
        if let Some(plot) = &patch.plot {
            record.plot = plot.clone();
        }
        true
    }

    // ---- persistence ----

    pub fn save_library(&self, path: Option<&Path>) -> Result<PathBuf> {
        self.repo.save(&self.records, path)
    }

    /// Replace the whole list with the file's contents. On error the catalog
    /// and view are left untouched; on success the view is rebuilt.
    pub fn load_library(&mut self, path: Option<&Path>) -> Result<usize> {
        let loaded = self.repo.load(path)?;

        self.records.clear();
        self.handles.clear();
        self.view.on_cleared();

        for record in loaded {
            let handle = self.mint_handle();
            let index = self.records.len();
            self.records.push(record);
            self.handles.push(handle);
            self.view.on_inserted(index, &self.records[index]);
        }
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::table::TableModel;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn map(v: Value) -> FieldMap {
        v.as_object().cloned().unwrap()
    }

    fn catalog() -> Catalog<TableModel> {
        Catalog::new(TableModel::default(), JsonRepository::default())
    }

    fn assert_in_sync(c: &Catalog<TableModel>) {
        assert_eq!(c.len(), c.view().row_count());
        for (i, r) in c.records().iter().enumerate() {
            assert_eq!(c.view().row(i), Some(&r.table_cells()));
        }
    }

    #[test]
    fn add_edit_delete_scenario() {
        let mut c = catalog();
        let h = c.add(&map(json!({"title": "Test", "creator": "John", "year": 2021, "rating": 8.5})));
        assert_eq!(c.len(), 1);
        assert_eq!(c.by_handle(h).unwrap().title, "Test");
        assert_eq!(
            c.view().row(0).unwrap(),
            &["Test", "John", "2021", "8.5"].map(String::from)
        );

        assert!(c.edit(0, &map(json!({"title": "Test2"}))));
        assert_eq!(c.get(0).unwrap().title, "Test2");
        assert_eq!(c.get(0).unwrap().creator, "John");
        assert_eq!(c.view().row(0).unwrap()[0], "Test2");

        assert!(c.delete(0));
        assert_eq!(c.len(), 0);
        assert_eq!(c.view().row_count(), 0);
    }

    #[test]
    fn each_add_grows_list_and_view_by_one() {
        let mut c = catalog();
        for n in 1..=5 {
            c.add(&map(json!({"title": format!("T{n}")})));
            assert_eq!(c.len(), n);
            assert_in_sync(&c);
        }
    }

    #[test]
    fn delete_preserves_order_of_the_rest() {
        let mut c = catalog();
        for t in ["A", "B", "C", "D"] {
            c.add(&map(json!({"title": t})));
        }
        let b = c.handle_at(1).unwrap();
        assert!(c.delete(1));
        let titles: Vec<_> = c.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["A", "C", "D"]);
        assert_eq!(c.by_handle(b), None);
        assert_in_sync(&c);
    }

    #[test]
    fn edit_touches_only_given_fields() {
        let mut c = catalog();
        c.add(&map(json!({"title": "Dune", "creator": "Herbert", "year": 1965, "rating": 9.0, "plot": "Spice."})));
        let before = c.get(0).unwrap().clone();

        assert!(c.edit(0, &map(json!({"rating": "9.5", "year": 1966}))));
        let after = c.get(0).unwrap();
        assert_eq!(after.rating, 9.5);
        assert_eq!(after.year, 1966);
        assert_eq!(after.title, before.title);
        assert_eq!(after.creator, before.creator);
        assert_eq!(after.plot, before.plot);

        assert!(c.edit(0, &map(json!({"year": "unknown"}))));
        assert_eq!(c.get(0).unwrap().year, 1966);
        assert_in_sync(&c);
    }

    #[test]
    fn out_of_range_indices() {
        let mut c = catalog();
        c.add(&map(json!({"title": "Only"})));
        let snapshot = c.records().to_vec();

        assert!(!c.edit(1, &map(json!({"title": "X"}))));
        assert!(!c.delete(7));
        assert!(matches!(
            c.get(1),
            Err(LibraryError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert_eq!(c.records(), snapshot.as_slice());
        assert_in_sync(&c);
    }

    #[test]
    fn metadata_patch_updates_record_without_view_change() {
        let mut c = catalog();
        let h = c.add(&map(json!({"title": "Alien", "year": 1979})));
        c.add(&map(json!({"title": "Aliens"})));
        c.delete(1);

        let patch = MetadataPatch {
            poster_url: Some("https://img/alien.jpg".into()),
            plot: None,
        };
        assert!(c.apply_metadata_patch(h, &patch));
        let r = c.by_handle(h).unwrap();
        assert_eq!(r.poster_url, "https://img/alien.jpg");
        assert_eq!(r.plot, "");
        assert_eq!(r.year, 1979);

        c.delete(0);
        assert!(!c.apply_metadata_patch(h, &patch));
    }

    #[test]
    fn save_and_reload_into_fresh_catalog() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("library.json");

        let mut c = catalog();
        c.add(&map(json!({"title": "A", "creator": "X", "year": 2000, "rating": 7})));
        c.add(&map(json!({"title": "B", "creator": "Y", "year": 2001, "rating": 8})));
        c.save_library(Some(&file)).unwrap();

        let raw: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);

        let mut fresh = catalog();
        assert_eq!(fresh.load_library(Some(&file)).unwrap(), 2);
        assert_eq!(fresh.view().row_count(), 2);
        assert_eq!(fresh.get(1).unwrap().title, "B");
        assert_eq!(fresh.records(), c.records());
    }

    #[test]
    fn load_replaces_existing_records() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("library.json");

        let mut c = catalog();
        c.add(&map(json!({"title": "A"})));
        c.add(&map(json!({"title": "B"})));
        let stale = c.handle_at(0).unwrap();
        c.save_library(Some(&file)).unwrap();

        assert_eq!(c.load_library(Some(&file)).unwrap(), 2);
        assert_eq!(c.len(), 2);
        assert_in_sync(&c);
        assert_eq!(c.by_handle(stale), None);
    }

    #[test]
    fn failed_load_leaves_catalog_untouched() {
        let dir = tempdir().unwrap();
        let mut c = catalog();
        c.add(&map(json!({"title": "Keep"})));

        let missing = dir.path().join("missing.json");
        assert!(c.load_library(Some(&missing)).is_err());
        assert!(matches!(c.load_library(None), Err(LibraryError::InvalidArgument(_))));
        assert_eq!(c.len(), 1);
        assert_in_sync(&c);
    }
}

use super::catalog::CatalogView;
use super::data::Record;

pub const COLUMNS: [&str; 4] = ["Title", "Director / Author", "Year", "Rating"];

pub type Row = [String; 4];

/// Text rows backing the library table, one per catalog record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableModel {
    rows: Vec<Row>,
}

impl TableModel {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

impl CatalogView for TableModel {
    fn on_inserted(&mut self, index: usize, record: &Record) {
        self.rows.insert(index.min(self.rows.len()), record.table_cells());
    }

    fn on_updated(&mut self, index: usize, record: &Record) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = record.table_cells();
        }
    }

    fn on_removed(&mut self, index: usize) {
        if index < self.rows.len() {
            self.rows.remove(index);
        }
    }

    fn on_cleared(&mut self) {
        self.rows.clear();
    }
}

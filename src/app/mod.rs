// src/app/mod.rs: catalog core + egui shell that drives it

// ---- Standard lib imports ----
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// ---- Crates ----
use eframe::egui as eg;
use serde_json::Value;
use tracing::{info, warn};

// ---- Local modules ----
pub mod catalog;
pub mod data;
pub mod fetcher;
pub mod lifecycle;
pub mod prefs;
pub mod repository;
pub mod session;
pub mod table;
pub mod types;
pub mod ui;

pub use catalog::{Catalog, CatalogView};
pub use data::{FieldMap, Record};
pub use fetcher::MetadataFetcher;
pub use lifecycle::{LifecycleCoordinator, Shell};
pub use prefs::Settings;
pub use repository::JsonRepository;
pub use session::{FetchReport, LibrarySession};
pub use table::TableModel;
pub use types::{FetchOutcome, MetadataPatch, RecordHandle, Unavailable};

use crate::config::AppConfig;

// ---- Tunables ----
const FETCH_POLL_MS: u64 = 250;

/// Text fields of the add/edit form.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordForm {
    pub title: String,
    pub creator: String,
    pub year: String,
    pub rating: String,
    /// `None` = adding a new entry. A handle, so deletes above it don't retarget the edit.
    pub editing: Option<RecordHandle>,
}

impl RecordForm {
    fn from_record(handle: RecordHandle, r: &Record) -> Self {
        Self {
            title: r.title.clone(),
            creator: r.creator.clone(),
            year: r.year.to_string(),
            rating: data::format_rating(r.rating),
            editing: Some(handle),
        }
    }

    /// Validate and convert to a field map, or say what is wrong.
    fn to_fields(&self) -> Result<FieldMap, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required.".into());
        }
        let year = self
            .year
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("Year must be a whole number, got {:?}.", self.year))?;
        let rating = self
            .rating
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite())
            .ok_or_else(|| format!("Rating must be a number, got {:?}.", self.rating))?;

        let mut map = FieldMap::new();
        map.insert(data::TITLE.into(), Value::from(title));
        map.insert(data::CREATOR.into(), Value::from(self.creator.trim()));
        map.insert(data::YEAR.into(), Value::from(year));
        map.insert(data::RATING.into(), Value::from(rating));
        Ok(map)
    }
}

/// Bridges the lifecycle coordinator to the egui viewport.
struct EguiShell<'a> {
    ctx: &'a eg::Context,
    visible: bool,
}

impl Shell for EguiShell<'_> {
    fn any_window_visible(&self) -> bool {
        self.visible
    }

    fn quit(&mut self) {
        self.ctx.send_viewport_cmd(eg::ViewportCommand::Close);
    }
}

pub struct MediaLibApp {
    session: LibrarySession<TableModel>,
    settings: Settings,

    // ui state
    form: RecordForm,
    path_input: String,
    selected: BTreeSet<usize>,
    cursor: Option<usize>,
    status: String,
    window_visible: bool,
}

impl MediaLibApp {
    pub fn new(cc: &eframe::CreationContext<'_>, cfg: AppConfig) -> Self {
        let settings = Settings::load(&cfg.settings_path);
        let default_path = cfg.library_path.clone().or_else(|| settings.last_path());

        let fetcher = match MetadataFetcher::new(&cfg) {
            Ok(f) => Some(Arc::new(f)),
            Err(err) => {
                warn!("metadata lookups disabled: {err}");
                None
            }
        };

        let catalog = Catalog::new(TableModel::default(), JsonRepository::new(default_path.clone()));
        let mut session = LibrarySession::new(catalog, fetcher);

        let ctx = cc.egui_ctx.clone();
        session.set_waker(Arc::new(move || ctx.request_repaint()));

        Self::with_session(session, settings, default_path)
    }

    fn with_session(
        session: LibrarySession<TableModel>,
        settings: Settings,
        default_path: Option<PathBuf>,
    ) -> Self {
        Self {
            session,
            settings,
            form: RecordForm::default(),
            path_input: default_path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            selected: BTreeSet::new(),
            cursor: None,
            status: "Ready".into(),
            window_visible: true,
        }
    }

    pub(crate) fn set_status<S: Into<String>>(&mut self, s: S) {
        self.status = s.into();
    }

    fn stamp() -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    fn path_from_input(&self) -> Option<PathBuf> {
        let trimmed = self.path_input.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    fn clear_selection(&mut self) {
        self.selected.clear();
        self.cursor = None;
    }

    // ---- actions ----

    pub(crate) fn start_add(&mut self) {
        self.form = RecordForm::default();
    }

    pub(crate) fn start_edit(&mut self) {
        let Some(index) = self.cursor else {
            self.set_status("Select an entry to edit.");
            return;
        };
        let catalog = self.session.catalog();
        match (catalog.handle_at(index), catalog.get(index)) {
            (Some(handle), Ok(record)) => self.form = RecordForm::from_record(handle, record),
            (_, Err(err)) => self.set_status(err.to_string()),
            (None, Ok(_)) => self.set_status("That entry no longer exists."),
        }
    }

    pub(crate) fn submit_form(&mut self) {
        let fields = match self.form.to_fields() {
            Ok(f) => f,
            Err(msg) => {
                self.set_status(msg);
                return;
            }
        };
        match self.form.editing {
            Some(handle) => {
                let index = self.session.catalog().index_of(handle);
                match index {
                    Some(i) if self.session.catalog_mut().edit(i, &fields) => {
                        self.set_status(format!("Updated entry #{}.", i + 1));
                    }
                    _ => self.set_status("That entry no longer exists."),
                }
            }
            None => {
                self.session.add(&fields);
                let n = self.session.catalog().len();
                self.cursor = Some(n - 1);
                self.selected = BTreeSet::from([n - 1]);
                self.set_status(format!("Added {:?}; looking up metadata…", self.form.title.trim()));
            }
        }
        self.form = RecordForm::default();
    }

    pub(crate) fn delete_selected(&mut self) {
        if self.selected.is_empty() {
            self.set_status("Select entries to delete.");
            return;
        }
        let indices: Vec<usize> = self.selected.iter().copied().collect();
        let removed = self.session.delete_rows(&indices);
        let edited_gone = self
            .form
            .editing
            .is_some_and(|h| self.session.catalog().index_of(h).is_none());
        if edited_gone {
            self.form = RecordForm::default();
        }
        self.clear_selection();
        self.set_status(format!("Deleted {removed} entr{}.", if removed == 1 { "y" } else { "ies" }));
    }

    pub(crate) fn save_library(&mut self) {
        let path = self.path_from_input();
        match self.session.catalog().save_library(path.as_deref()) {
            Ok(written) => {
                self.remember_path(written.clone());
                self.set_status(format!(
                    "Saved {} entries to {} at {}.",
                    self.session.catalog().len(),
                    written.display(),
                    Self::stamp()
                ));
            }
            Err(err) => {
                warn!("save failed: {err}");
                self.set_status(format!("Save failed: {err}"));
            }
        }
    }

    pub(crate) fn load_library(&mut self) {
        let Some(path) = self.path_from_input() else {
            self.set_status("Enter a library file path to load.");
            return;
        };
        match self.session.catalog_mut().load_library(Some(&path)) {
            Ok(count) => {
                self.clear_selection();
                self.form = RecordForm::default();
                self.remember_path(path.clone());
                self.set_status(format!("Loaded {count} entries from {}.", path.display()));
            }
            Err(err) => {
                warn!("load failed: {err}");
                self.set_status(format!("Load failed: {err}"));
            }
        }
    }

    fn remember_path(&mut self, path: PathBuf) {
        self.path_input = path.display().to_string();
        self.settings.set_last_path(&path);
        self.settings.save_if_dirty();
        self.session
            .catalog_mut()
            .repository_mut()
            .set_default_path(Some(path));
    }

    /// Row number of the entry the form is editing, if it still exists.
    pub(crate) fn editing_index(&self) -> Option<usize> {
        self.form
            .editing
            .and_then(|h| self.session.catalog().index_of(h))
    }

    pub(crate) fn select_row(&mut self, index: usize, toggle: bool) {
        if toggle {
            if !self.selected.remove(&index) {
                self.selected.insert(index);
            }
        } else {
            self.selected = BTreeSet::from([index]);
        }
        self.cursor = Some(index);
    }

    // ---- background plumbing ----

    fn poll_fetches(&mut self, ctx: &eg::Context) {
        let mut shell = EguiShell {
            ctx,
            visible: self.window_visible,
        };
        for report in self.session.poll_fetches(&mut shell) {
            let title = self
                .session
                .catalog()
                .by_handle(report.handle)
                .map(|r| r.title.clone());
            match (&report.outcome, title) {
                (FetchOutcome::Fetched(_), Some(t)) if report.applied => {
                    self.set_status(format!("Fetched poster and plot for {t:?}."));
                }
                (FetchOutcome::Unavailable(why), Some(t)) => {
                    self.set_status(format!("No metadata for {t:?} ({why})."));
                }
                _ => {}
            }
        }
        if !self.session.lifecycle().is_idle() {
            ctx.request_repaint_after(Duration::from_millis(FETCH_POLL_MS));
        }
    }

    /// A close with lookups still running is held back: the window counts as
    /// closed for the coordinator, shows a closing notice, and is closed for
    /// real once the last lookup reports.
    fn handle_close_request(&mut self, ctx: &eg::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if self.session.lifecycle().quit_issued() {
            return;
        }

        self.window_visible = false;
        let mut shell = EguiShell {
            ctx,
            visible: false,
        };
        if self.session.window_closed(&mut shell) {
            return;
        }

        info!(
            "window closed with {} metadata lookups in flight; exiting when they finish",
            self.session.lifecycle().in_flight()
        );
        ctx.send_viewport_cmd(eg::ViewportCommand::CancelClose);
    }
}

// ========== App impl ==========
impl eframe::App for MediaLibApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        self.poll_fetches(ctx);
        self.handle_close_request(ctx);

        if !self.window_visible {
            self.ui_render_closing(ctx);
            return;
        }

        self.ui_render_topbar(ctx);
        self.ui_render_statusbar(ctx);
        self.ui_render_form_panel(ctx);
        self.ui_render_table(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save_if_dirty();
    }
}

// src/app/ui/grid.rs
use eframe::egui as eg;
use egui_extras::{Column, TableBuilder};

use crate::app::table::COLUMNS;

const ROW_H: f32 = 20.0;

impl crate::app::MediaLibApp {
    pub(crate) fn ui_render_table(&mut self, ctx: &eg::Context) {
        let mut clicked: Option<(usize, bool)> = None;
        let mut open_edit = false;

        eg::CentralPanel::default().show(ctx, |ui| {
            let rows = self.session.catalog().view().rows();
            if rows.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    ui.label("The library is empty. Add an entry or load a library file.");
                });
                return;
            }

            let toggle = ui.input(|i| i.modifiers.command);
            let selected = &self.selected;

            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(eg::Layout::left_to_right(eg::Align::Center))
                .column(Column::initial(240.0).at_least(80.0))
                .column(Column::initial(180.0).at_least(60.0))
                .column(Column::initial(60.0))
                .column(Column::remainder())
                .header(ROW_H + 2.0, |mut header| {
                    for name in COLUMNS {
                        header.col(|ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_H, rows.len(), |mut row| {
                        let idx = row.index();
                        let cells = &rows[idx];
                        let is_sel = selected.contains(&idx);
                        row.col(|ui| {
                            let resp = ui.selectable_label(is_sel, &cells[0]);
                            if resp.clicked() {
                                clicked = Some((idx, toggle));
                            }
                            if resp.double_clicked() {
                                clicked = Some((idx, false));
                                open_edit = true;
                            }
                        });
                        for cell in &cells[1..] {
                            row.col(|ui| {
                                ui.label(cell);
                            });
                        }
                    });
                });
        });

        if let Some((idx, toggle)) = clicked {
            self.select_row(idx, toggle);
        }
        if open_edit {
            self.start_edit();
        }
    }
}

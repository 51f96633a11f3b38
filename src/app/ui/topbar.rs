// src/app/ui/topbar.rs
use eframe::egui as eg;

impl crate::app::MediaLibApp {
    // ---------- TOP BAR ----------
    pub(crate) fn ui_render_topbar(&mut self, ctx: &eg::Context) {
        eg::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button("Add").on_hover_text("Add a new entry").clicked() {
                    self.start_add();
                }
                if ui
                    .add_enabled(self.cursor.is_some(), eg::Button::new("Edit"))
                    .clicked()
                {
                    self.start_edit();
                }
                if ui
                    .add_enabled(!self.selected.is_empty(), eg::Button::new("Delete"))
                    .on_hover_text("Delete the selected entries (Ctrl-click selects several)")
                    .clicked()
                {
                    self.delete_selected();
                }

                ui.separator();

                ui.label("Library:");
                ui.add(
                    eg::TextEdit::singleline(&mut self.path_input)
                        .hint_text("path/to/library.json")
                        .desired_width(260.0),
                );
                if ui.button("Save").clicked() {
                    self.save_library();
                }
                if ui.button("Load").clicked() {
                    self.load_library();
                }
            });
            ui.add_space(4.0);
        });
    }
}

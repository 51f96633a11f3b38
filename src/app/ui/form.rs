// src/app/ui/form.rs
use eframe::egui as eg;

impl crate::app::MediaLibApp {
    pub(crate) fn ui_render_form_panel(&mut self, ctx: &eg::Context) {
        eg::SidePanel::right("form_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(240.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.heading(match self.editing_index() {
                    Some(i) => format!("Edit entry #{}", i + 1),
                    None => "Add entry".to_string(),
                });
                ui.separator();

                eg::Grid::new("record_form")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Title:");
                        ui.text_edit_singleline(&mut self.form.title);
                        ui.end_row();
                        ui.label("Director / Author:");
                        ui.text_edit_singleline(&mut self.form.creator);
                        ui.end_row();
                        ui.label("Year:");
                        ui.text_edit_singleline(&mut self.form.year);
                        ui.end_row();
                        ui.label("Rating:");
                        ui.text_edit_singleline(&mut self.form.rating);
                        ui.end_row();
                    });

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let label = if self.form.editing.is_some() { "Update" } else { "Add" };
                    if ui.button(label).clicked() {
                        self.submit_form();
                    }
                    if self.form.editing.is_some() && ui.button("Cancel").clicked() {
                        self.start_add();
                    }
                });

                ui.add_space(10.0);
                ui.separator();
                self.ui_render_details(ui);
            });
    }

    // Poster and plot come from the metadata lookup; the table has no columns for them.
    fn ui_render_details(&self, ui: &mut eg::Ui) {
        ui.label(eg::RichText::new("Details").strong());
        let Some(record) = self.cursor.and_then(|i| self.session.catalog().get(i).ok()) else {
            ui.label(eg::RichText::new("Select an entry to see its details.").weak());
            return;
        };

        ui.label(format!("{} ({})", record.title, record.year));
        ui.add_space(4.0);
        if record.poster_url.is_empty() {
            ui.label(eg::RichText::new("No poster").weak());
        } else {
            ui.hyperlink_to("Poster", &record.poster_url);
        }
        ui.add_space(4.0);
        if record.plot.is_empty() {
            ui.label(eg::RichText::new("No plot summary").weak());
        } else {
            ui.label(&record.plot);
        }
    }
}

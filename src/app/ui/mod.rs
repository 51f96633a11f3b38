// src/app/ui/mod.rs
pub mod form;
pub mod grid;
pub mod topbar;

use eframe::egui as eg;

impl crate::app::MediaLibApp {
    pub(crate) fn ui_render_statusbar(&self, ctx: &eg::Context) {
        eg::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                let in_flight = self.session.lifecycle().in_flight();
                if in_flight > 0 {
                    ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                        ui.add(eg::Spinner::new().size(12.0));
                        ui.label(format!("{in_flight} lookup(s) running"));
                    });
                }
            });
        });
    }

    // Shown after the user closed the window while lookups were still running.
    pub(crate) fn ui_render_closing(&self, ctx: &eg::Context) {
        eg::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading("Closing…");
                ui.add(eg::Spinner::new().size(18.0));
                ui.label(format!(
                    "Waiting for {} metadata lookup(s) to finish.",
                    self.session.lifecycle().in_flight()
                ));
            });
        });
    }
}

// src/main.rs
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eframe::egui as eg;
use medialib::app::MediaLibApp;
use medialib::config::load_config;

const APP_TITLE: &str = "Media Library Manager";

fn pick_renderer() -> eframe::Renderer {
    match env::var("MEDIALIB_RENDERER").as_deref() {
        Ok("glow") => eframe::Renderer::Glow,
        Ok("wgpu") => eframe::Renderer::Wgpu,
        _ => {
            // Default: Windows = WGPU (DX12), Others = Glow (GL)
            #[cfg(target_os = "windows")]
            { eframe::Renderer::Wgpu }
            #[cfg(not(target_os = "windows"))]
            { eframe::Renderer::Glow }
        }
    }
}

fn main() -> eframe::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cfg = load_config();
    info!("settings file: {}", cfg.settings_path.display());

    let options = eframe::NativeOptions {
        renderer: pick_renderer(),
        multisampling: 0,
        viewport: eg::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    match eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(MediaLibApp::new(cc, cfg)))),
    ) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("eframe failed to start: {e:?}");
            error!("Hint: try MEDIALIB_RENDERER=wgpu or MEDIALIB_RENDERER=glow.");
            Err(e)
        }
    }
}

mod app;
mod config;
mod export;
mod input;
mod net_worker;
mod render;
mod ui;

use eframe::egui;
use tracing::info;

use crate::app::OrthoViewApp;
use crate::config::ViewerConfig;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting OrthoView");

    let config = ViewerConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("OrthoView")
            .with_inner_size([config.window_width, config.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        "OrthoView",
        options,
        Box::new(move |cc| Ok(Box::new(OrthoViewApp::new(&cc.egui_ctx, config)))),
    )
}

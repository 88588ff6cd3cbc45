mod app;
mod camera;
mod config;
mod image;
mod image_ref;
mod storage;
mod wiring;

use app::{PicChangerApp, Route};
use config::AppConfig;
use image_ref::ImageRef;
use std::path::Path;
use wiring::AppComponent;

fn init_logger(default_level: &str) {
    use std::io::Write;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");
            writeln!(
                buf,
                "[{ts} {style}{}{style:#} {}:{}] {}",
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

/// First CLI argument as a route string, a `file://` URI or a plain path.
fn initial_route() -> Option<Route> {
    let arg = std::env::args_os().nth(1)?;
    match arg.to_str() {
        Some(text) => Route::parse(text).or_else(|| {
            ImageRef::parse(text).map(|image| Route::Editor { image })
        }),
        None => Some(Route::Editor {
            image: ImageRef::from_path(Path::new(&arg)),
        }),
    }
}

fn main() -> eframe::Result<()> {
    let cfg = AppConfig::load();
    init_logger(&cfg.log_level);
    let initial_route = initial_route();
    let component = AppComponent::create(cfg);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 820.0])
            .with_min_inner_size([360.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "PicChanger",
        native_options,
        Box::new(move |_cc| {
            Ok(Box::new(PicChangerApp::new_with_initial_route(
                component,
                initial_route,
            )))
        }),
    )
}

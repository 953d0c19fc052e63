mod app;
mod player;
mod predict;
mod stream;

use app::InspectorApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "SkyScope Inspector",
        options,
        Box::new(|cc| Box::new(InspectorApp::new(cc))),
    )
}

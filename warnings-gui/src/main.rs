mod app;

use eframe::egui;

use crate::app::WarningsGui;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("مولد الإنذارات"),
        ..Default::default()
    };

    eframe::run_native(
        "warnings-gui",
        options,
        Box::new(|cc| Ok(Box::new(WarningsGui::new(cc)))),
    )
}

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::egui;

use tailornote::app::TailorNoteApp;
use tailornote::logger;

fn main() -> Result<(), eframe::Error> {
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("TailorNote"),
        ..Default::default()
    };

    eframe::run_native(
        "TailorNote",
        options,
        Box::new(|cc| Box::new(TailorNoteApp::new(cc))),
    )
}

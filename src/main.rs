#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

fn main() -> eframe::Result<()> {
    // RUST_LOG sends logs to the terminal, otherwise they go to the in-app log window.
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_env(env_logger::Env::default()).init();
    } else if let Err(e) = egui_logger::builder().init() {
        eprintln!("failed to install the log window: {e}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("mcircuit"),
        ..Default::default()
    };

    eframe::run_native(
        "mcircuit",
        options,
        Box::new(|cc| Ok(Box::new(mcircuit::EditorApp::new(cc)))),
    )
}

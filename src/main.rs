#![windows_subsystem = "windows"]

use std::process::ExitCode;

use gradientfe::app::GradientFEApp;
use gradientfe::{cli, logger};

fn main() -> ExitCode {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        return cli::run(args);
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("GradientFE"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "GradientFE",
        options,
        Box::new(|cc| Box::new(GradientFEApp::new(cc))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("GradientFE failed to start: {}", e);
            ExitCode::FAILURE
        }
    }
}

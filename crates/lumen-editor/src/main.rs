mod controls;
mod editor;
mod scene;

use std::process::ExitCode;

use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{Runtime, RuntimeConfig};

use editor::Editor;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Lumen Editor".to_string(),
        width: 1800,
        height: 1000,
    };

    match Runtime::run(config, GpuInit::default(), Editor::new()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("editor terminated: {err:#}");
            ExitCode::FAILURE
        }
    }
}

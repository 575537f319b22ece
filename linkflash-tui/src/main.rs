//! linkflash - configure and flash ESP-01S radio link firmware
//!
//! Terminal front end: edits the link settings in the firmware's
//! `user_config.h`, then builds and flashes the firmware with the project's
//! own make targets.
//!
//! Settings come from an optional `linkflash.toml` in the working directory.

mod app;
mod error;
mod logging;
#[cfg(test)]
mod testing;
mod ui;

use std::sync::Arc;

use linkflash_host::{ConfigStore, FileStore, Orchestrator, ProcessRunner, Settings};
use log::info;

use crate::app::App;
use crate::error::AppError;

fn main() {
    if let Err(e) = run() {
        eprintln!("linkflash: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::discover(&cwd)?;
    logging::init(&settings)?;
    info!("project root {}", settings.project_root.display());

    let store = FileStore::new(settings.config_file());
    let doc = store.load()?;
    info!("loaded {}", store.path().display());

    let runner = ProcessRunner::new(settings.commands.clone(), &settings.project_root);
    let orchestrator = Orchestrator::new(Arc::new(store), Arc::new(runner), settings.tail_lines);
    let app = App::new(doc, orchestrator, settings.patterns());

    ui::run_tui(app)
}

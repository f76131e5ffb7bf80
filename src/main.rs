mod listener;
mod logging;
mod settings;

use listener::ConsoleListener;
use settings::Settings;
use std::process::ExitCode;
use std::sync::Arc;
use trackview_lib::TrackLoader;

fn main() -> ExitCode {
    let settings = Settings::from_cli();
    logging::setup_logging();

    if let Some(dir) = &settings.export_dir {
        if let Err(err) = std::fs::create_dir_all(dir) {
            tracing::error!("Could not create {}: {}", dir.display(), err);
            return ExitCode::FAILURE;
        }
    }

    let loader = match TrackLoader::new(settings.loader_config()) {
        Ok(loader) => loader,
        Err(err) => {
            tracing::error!("Could not start the loader: {}", err);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("Loading with {} worker(s)", loader.workers());

    let listener = Arc::new(ConsoleListener::new(&settings));
    match loader.load(&settings.directory, listener.clone()) {
        Ok(scan) => scan.wait(),
        Err(err) => {
            tracing::error!("Could not start the scan: {}", err);
            return ExitCode::FAILURE;
        }
    }

    if listener.failed() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

mod args;
mod demo;
mod error;
mod logging;
mod paths;
mod source;

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use log::info;
use log::warn;

use crate::args::CliArgs;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(args: CliArgs) -> Result<(), CliError> {
    let (log_path, log_dir) = match &args.log_file {
        Some(path) => (path.clone(), None),
        None => {
            let dir = paths::log_dir().ok_or(CliError::NoLogDir)?;
            (paths::session_log(&dir, Local::now()), Some(dir))
        }
    };
    logging::init(&log_path, args.verbose)?;
    info!("vgrid starting, logging to {}", log_path.display());

    if let Some(dir) = &log_dir {
        match paths::prune_sessions(dir, usize::from(args.keep_logs)) {
            Ok(0) => {}
            Ok(removed) => info!("Removed {} old session logs", removed),
            Err(err) => warn!("Could not prune session logs in {}: {}", dir.display(), err),
        }
    }

    let config = args.grid_config()?;
    info!(
        "Grid config: row height {}, viewport {}, buffer {}, debounce {:?}",
        config.row_height, config.viewport_height, config.buffer_rows, config.debounce_interval
    );

    demo::run(&args, config).await
}

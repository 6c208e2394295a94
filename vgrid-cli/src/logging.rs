//! Logger setup

use std::fs;
use std::fs::File;
use std::path::Path;

use simplelog::ColorChoice;
use simplelog::CombinedLogger;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

use crate::error::CliError;

/// Logs everything down to debug into `path`. With `verbose`, info and
/// above are mirrored to stderr.
pub fn init(path: &Path, verbose: bool) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CliError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| CliError::io(path, e))?;

    let result = if verbose {
        CombinedLogger::init(vec![
            TermLogger::new(
                LevelFilter::Info,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ),
            WriteLogger::new(LevelFilter::Debug, Config::default(), file),
        ])
    } else {
        WriteLogger::init(LevelFilter::Debug, Config::default(), file)
    };
    result.map_err(|e| CliError::Logger(e.to_string()))
}
